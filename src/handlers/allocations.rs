use crate::{
    auth::AuthUser,
    entities::allocation,
    services::allocations::{
        AllocationDetail, AllocationFilter, CloseAllocationRequest, CreateAllocationRequest,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct AllocationListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size (max 100)
    pub limit: Option<u64>,
    pub resource_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct RecentQuery {
    /// Number of entries to return (default 5)
    pub limit: Option<u64>,
}

/// Assign one unit of a resource to an employee.
#[utoipa::path(
    post,
    path = "/api/v1/allocations",
    request_body = CreateAllocationRequest,
    responses(
        (status = 201, description = "Allocation created"),
        (status = 404, description = "Resource or employee not found"),
        (status = 409, description = "No available units")
    ),
    security(("bearer_auth" = [])),
    tag = "allocations"
)]
pub async fn create_allocation(
    State(state): State<AppState>,
    Json(payload): Json<CreateAllocationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AllocationDetail>>), crate::errors::ServiceError> {
    let detail = state.services.allocations.create_allocation(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(detail))))
}

/// Close out an allocation as Returned, Lost or Damage.
#[utoipa::path(
    patch,
    path = "/api/v1/allocations/{id}",
    request_body = CloseAllocationRequest,
    responses(
        (status = 200, description = "Allocation closed"),
        (status = 404, description = "Allocation not found"),
        (status = 409, description = "Allocation already closed")
    ),
    security(("bearer_auth" = [])),
    tag = "allocations"
)]
pub async fn close_allocation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CloseAllocationRequest>,
) -> ApiResult<allocation::Model> {
    let model = state
        .services
        .allocations
        .close_allocation(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(model)))
}

pub async fn get_allocation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<AllocationDetail> {
    let detail = state.services.allocations.get_allocation(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

pub async fn list_allocations(
    State(state): State<AppState>,
    Query(query): Query<AllocationListQuery>,
) -> ApiResult<PaginatedResponse<AllocationDetail>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let filter = AllocationFilter {
        resource_id: query.resource_id,
        employee_id: query.employee_id,
        status: query.status,
    };

    let (items, total) = state
        .services
        .allocations
        .list_allocations(filter, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Newest allocations for the dashboard panel.
#[utoipa::path(
    get,
    path = "/api/v1/allocations/recent",
    params(("limit" = Option<u64>, Query, description = "Number of entries, default 5")),
    responses((status = 200, description = "Recent allocations")),
    security(("bearer_auth" = [])),
    tag = "allocations"
)]
pub async fn recent_allocations(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Vec<AllocationDetail>> {
    let limit = query.limit.unwrap_or(5).clamp(1, 50);
    let items = state.services.allocations.recent_allocations(limit).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Full allocation history, newest first.
pub async fn allocation_log(
    State(state): State<AppState>,
    Query(query): Query<AllocationListQuery>,
) -> ApiResult<PaginatedResponse<AllocationDetail>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (items, total) = state
        .services
        .allocations
        .list_allocations(AllocationFilter::default(), page, limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Allocation history of the authenticated employee.
pub async fn my_allocations(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<AllocationListQuery>,
) -> ApiResult<PaginatedResponse<AllocationDetail>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let filter = AllocationFilter {
        employee_id: Some(auth_user.user_id),
        status: query.status,
        ..Default::default()
    };

    let (items, total) = state
        .services
        .allocations
        .list_allocations(filter, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}
