use crate::{
    entities::employee,
    services::employees::{CreateEmployeeRequest, EmployeeFilter, UpdateEmployeeRequest},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct EmployeeListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size (max 100)
    pub limit: Option<u64>,
    /// Matches name, email and employee code
    pub search: Option<String>,
    pub department: Option<String>,
}

pub async fn create_employee(
    State(state): State<AppState>,
    Json(payload): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<employee::Model>>), crate::errors::ServiceError> {
    let model = state.services.employees.create_employee(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(model))))
}

pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<employee::Model> {
    let model = state.services.employees.get_employee(id).await?;
    Ok(Json(ApiResponse::success(model)))
}

pub async fn list_employees(
    State(state): State<AppState>,
    Query(query): Query<EmployeeListQuery>,
) -> ApiResult<PaginatedResponse<employee::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let filter = EmployeeFilter {
        search: query.search,
        department: query.department,
    };

    let (items, total) = state
        .services
        .employees
        .list_employees(filter, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEmployeeRequest>,
) -> ApiResult<employee::Model> {
    let model = state
        .services
        .employees
        .update_employee(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(model)))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.employees.delete_employee(id).await?;
    Ok(Json(ApiResponse::success(json!({
        "employee_id": id,
        "status": "deleted"
    }))))
}
