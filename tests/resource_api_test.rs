mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use serde_json::json;

async fn seed_type(app: &TestApp, name: &str) -> String {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/resource-types",
            Some(json!({ "name": name, "description": "test category" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_str()
        .expect("id")
        .to_string()
}

#[tokio::test]
async fn resource_crud_and_duplicate_serial() {
    let app = TestApp::new().await;
    let type_id = seed_type(&app, "Laptop").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/resources",
            Some(json!({
                "name": "ThinkPad X1",
                "resource_type_id": type_id,
                "serial_number": "SN-001",
                "brand": "Lenovo",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await["data"].clone();
    let id = created["id"].as_str().expect("id").to_string();
    // Defaults to a single available unit.
    assert_eq!(created["total_resource_count"], 1);
    assert_eq!(created["available_resource_count"], 1);
    assert_eq!(created["status"], "Available");

    // Duplicate serial number is rejected.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/resources",
            Some(json!({
                "name": "Another Laptop",
                "resource_type_id": type_id,
                "serial_number": "SN-001",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Partial update merges and ignores blank fields.
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/resources/{}", id),
            Some(json!({ "brand": "", "model_name": "X1 Carbon Gen 11" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["brand"], "Lenovo");
    assert_eq!(updated["model_name"], "X1 Carbon Gen 11");

    // Unknown status is a validation error.
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/resources/{}", id),
            Some(json!({ "status": "Broken" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Growing the unit count grows availability with it.
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/resources/{}", id),
            Some(json!({ "total_resource_count": 4 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["total_resource_count"], 4);
    assert_eq!(updated["available_resource_count"], 4);

    // Delete, then reads return 404.
    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/resources/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/resources/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resource_list_supports_search_and_type_filter() {
    let app = TestApp::new().await;
    let laptops = seed_type(&app, "Laptop").await;
    let monitors = seed_type(&app, "Monitor").await;

    for (name, type_id, serial) in [
        ("ThinkPad T14", &laptops, "L-1"),
        ("MacBook Pro", &laptops, "L-2"),
        ("Dell U2720Q", &monitors, "M-1"),
    ] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/resources",
                Some(json!({
                    "name": name,
                    "resource_type_id": type_id,
                    "serial_number": serial,
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request_authenticated(Method::GET, "/api/v1/resources?search=ThinkPad", None)
        .await;
    let page = body_json(response).await["data"].clone();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["name"], "ThinkPad T14");

    // Search matches regardless of case.
    let response = app
        .request_authenticated(Method::GET, "/api/v1/resources?search=thinkpad", None)
        .await;
    let page = body_json(response).await["data"].clone();
    assert_eq!(page["total"], 1);

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/resources?resource_type_id={}", laptops),
            None,
        )
        .await;
    let page = body_json(response).await["data"].clone();
    assert_eq!(page["total"], 2);

    // Sorting by name is alphabetical; unknown columns are rejected.
    let response = app
        .request_authenticated(Method::GET, "/api/v1/resources?sort_by=name", None)
        .await;
    let page = body_json(response).await["data"].clone();
    assert_eq!(page["items"][0]["name"], "Dell U2720Q");

    let response = app
        .request_authenticated(Method::GET, "/api/v1/resources?sort_by=id;drop", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn resource_type_delete_is_guarded_by_references() {
    let app = TestApp::new().await;
    let type_id = seed_type(&app, "Tablet").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/resources",
            Some(json!({
                "name": "iPad Air",
                "resource_type_id": type_id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let resource_id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("id")
        .to_string();

    // Delete fails while a resource references the type.
    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/resource-types/{}", type_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Remove the resource, then the type can go.
    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/resources/{}", resource_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/resource-types/{}", type_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn allocated_resource_cannot_be_deleted() {
    let app = TestApp::new().await;
    let type_id = seed_type(&app, "Laptop").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/resources",
            Some(json!({
                "name": "XPS 13",
                "resource_type_id": type_id,
            })),
        )
        .await;
    let resource_id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("id")
        .to_string();

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/employees",
            Some(json!({
                "name": "Avery Kim",
                "email": "avery@example.com",
                "employee_code": "EMP100",
                "phone": "555-0199",
                "birthday": "1992-08-20",
            })),
        )
        .await;
    let employee_id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("id")
        .to_string();

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/allocations",
            Some(json!({ "resourceId": resource_id, "employeeId": employee_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/resources/{}", resource_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
