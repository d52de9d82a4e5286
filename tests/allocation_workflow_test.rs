mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use serde_json::{json, Value};

async fn seed_resource_type(app: &TestApp, name: &str) -> String {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/resource-types",
            Some(json!({ "name": name })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_str()
        .expect("resource type id")
        .to_string()
}

async fn seed_resource(app: &TestApp, type_id: &str, name: &str, total: i64) -> String {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/resources",
            Some(json!({
                "name": name,
                "resource_type_id": type_id,
                "total_resource_count": total,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_str()
        .expect("resource id")
        .to_string()
}

async fn seed_employee(app: &TestApp, name: &str, email: &str) -> String {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/employees",
            Some(json!({
                "name": name,
                "email": email,
                "employee_code": "EMP042",
                "phone": "555-1234",
                "birthday": "1991-06-02",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_str()
        .expect("employee id")
        .to_string()
}

async fn fetch_resource(app: &TestApp, id: &str) -> Value {
    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/resources/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

#[tokio::test]
async fn allocate_and_return_round_trip() {
    let app = TestApp::new().await;

    let type_id = seed_resource_type(&app, "Laptop").await;
    let resource_id = seed_resource(&app, &type_id, "ThinkPad T14", 1).await;
    let employee_id = seed_employee(&app, "Riley Park", "riley@example.com").await;

    // Allocate the only unit.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/allocations",
            Some(json!({
                "resourceId": resource_id,
                "employeeId": employee_id,
                "notes": "primary workstation",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let allocation = body_json(response).await["data"].clone();
    let allocation_id = allocation["id"].as_str().expect("allocation id").to_string();
    assert_eq!(allocation["status"], "Allocated");
    assert_eq!(allocation["employeeName"], "Riley Park");
    assert_eq!(allocation["resourceName"], "ThinkPad T14");

    let resource = fetch_resource(&app, &resource_id).await;
    assert_eq!(resource["available_resource_count"], 0);
    assert_eq!(resource["status"], "Allocated");

    // A second allocation must fail and leave the count untouched.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/allocations",
            Some(json!({
                "resourceId": resource_id,
                "employeeId": employee_id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let resource = fetch_resource(&app, &resource_id).await;
    assert_eq!(resource["available_resource_count"], 0);

    // Return the unit.
    let response = app
        .request_authenticated(
            Method::PATCH,
            &format!("/api/v1/allocations/{}", allocation_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let closed = body_json(response).await["data"].clone();
    assert_eq!(closed["status"], "Returned");
    assert!(closed["return_date"].is_string());

    let resource = fetch_resource(&app, &resource_id).await;
    assert_eq!(resource["available_resource_count"], 1);
    assert_eq!(resource["total_resource_count"], 1);
    assert_eq!(resource["status"], "Available");

    // Returning twice is a conflict and must not increment again.
    let response = app
        .request_authenticated(
            Method::PATCH,
            &format!("/api/v1/allocations/{}", allocation_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let resource = fetch_resource(&app, &resource_id).await;
    assert_eq!(resource["available_resource_count"], 1);
}

#[tokio::test]
async fn lost_close_out_writes_off_the_unit() {
    let app = TestApp::new().await;

    let type_id = seed_resource_type(&app, "Monitor").await;
    let resource_id = seed_resource(&app, &type_id, "Dell U2720Q", 2).await;
    let employee_id = seed_employee(&app, "Casey Nguyen", "casey@example.com").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/allocations",
            Some(json!({
                "resourceId": resource_id,
                "employeeId": employee_id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let allocation_id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("allocation id")
        .to_string();

    let response = app
        .request_authenticated(
            Method::PATCH,
            &format!("/api/v1/allocations/{}", allocation_id),
            Some(json!({ "status": "Lost" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The lost unit shrinks the tracked count instead of replenishing.
    let resource = fetch_resource(&app, &resource_id).await;
    assert_eq!(resource["total_resource_count"], 1);
    assert_eq!(resource["available_resource_count"], 1);
}

#[tokio::test]
async fn allocation_rejects_unknown_references() {
    let app = TestApp::new().await;

    let type_id = seed_resource_type(&app, "Dock").await;
    let resource_id = seed_resource(&app, &type_id, "WD19", 1).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/allocations",
            Some(json!({
                "resourceId": resource_id,
                "employeeId": uuid::Uuid::new_v4(),
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn close_out_rejects_non_terminal_status() {
    let app = TestApp::new().await;

    let type_id = seed_resource_type(&app, "Phone").await;
    let resource_id = seed_resource(&app, &type_id, "Pixel 8", 1).await;
    let employee_id = seed_employee(&app, "Sam Ortiz", "sam.ortiz@example.com").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/allocations",
            Some(json!({
                "resourceId": resource_id,
                "employeeId": employee_id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let allocation_id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("allocation id")
        .to_string();

    let response = app
        .request_authenticated(
            Method::PATCH,
            &format!("/api/v1/allocations/{}", allocation_id),
            Some(json!({ "status": "Allocated" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_and_recent_reflect_activity() {
    let app = TestApp::new().await;

    let type_id = seed_resource_type(&app, "Laptop").await;
    let resource_id = seed_resource(&app, &type_id, "MacBook Air", 3).await;
    let employee_id = seed_employee(&app, "Devon Reid", "devon@example.com").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/allocations",
            Some(json!({
                "resourceId": resource_id,
                "employeeId": employee_id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request_authenticated(Method::GET, "/api/v1/dashboard", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await["data"].clone();
    // Seeded admin + created employee.
    assert_eq!(summary["total_employees"], 2);
    assert_eq!(summary["total_resources"], 1);
    assert_eq!(summary["total_units"], 3);
    assert_eq!(summary["available_units"], 2);
    assert_eq!(summary["allocated_units"], 1);
    assert_eq!(summary["open_allocations"], 1);

    let response = app
        .request_authenticated(Method::GET, "/api/v1/allocations/recent?limit=5", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let recent = body_json(response).await["data"].clone();
    assert_eq!(recent.as_array().map(Vec::len), Some(1));
    assert_eq!(recent[0]["employeeName"], "Devon Reid");

    let response = app
        .request_authenticated(Method::GET, "/api/v1/allocations/log", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let log = body_json(response).await["data"].clone();
    assert_eq!(log["total"], 1);
    assert_eq!(log["items"][0]["resourceName"], "MacBook Air");
}
