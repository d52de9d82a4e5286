use crate::{
    entities::resource_type,
    services::resource_types::{CreateResourceTypeRequest, UpdateResourceTypeRequest},
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
pub struct ResourceTypeListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size (max 100)
    pub limit: Option<u64>,
}

pub async fn create_resource_type(
    State(state): State<AppState>,
    Json(payload): Json<CreateResourceTypeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<resource_type::Model>>), crate::errors::ServiceError> {
    let model = state
        .services
        .resource_types
        .create_resource_type(payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(model))))
}

pub async fn list_resource_types(
    State(state): State<AppState>,
    Query(query): Query<ResourceTypeListQuery>,
) -> ApiResult<PaginatedResponse<resource_type::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(50).clamp(1, 100);

    let (items, total) = state
        .services
        .resource_types
        .list_resource_types(page, limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

pub async fn update_resource_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateResourceTypeRequest>,
) -> ApiResult<resource_type::Model> {
    let model = state
        .services
        .resource_types
        .update_resource_type(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(model)))
}

/// Fails with a conflict while resources still reference the type.
pub async fn delete_resource_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state
        .services
        .resource_types
        .delete_resource_type(id)
        .await?;
    Ok(Json(ApiResponse::success(json!({
        "resource_type_id": id,
        "status": "deleted"
    }))))
}
