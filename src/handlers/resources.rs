use crate::{
    entities::resource,
    services::resources::{CreateResourceRequest, ResourceFilter, UpdateResourceRequest},
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
pub struct ResourceListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size (max 100)
    pub limit: Option<u64>,
    /// Matches name, brand, model, serial number and asset tag
    pub search: Option<String>,
    pub status: Option<String>,
    pub resource_type_id: Option<Uuid>,
    /// Sort column: `name`, `status` or `created_at` (default)
    pub sort_by: Option<String>,
}

pub async fn create_resource(
    State(state): State<AppState>,
    Json(payload): Json<CreateResourceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<resource::Model>>), crate::errors::ServiceError> {
    let model = state.services.resources.create_resource(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(model))))
}

pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<resource::Model> {
    let model = state.services.resources.get_resource(id).await?;
    Ok(Json(ApiResponse::success(model)))
}

pub async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ResourceListQuery>,
) -> ApiResult<PaginatedResponse<resource::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let filter = ResourceFilter {
        search: query.search,
        status: query.status,
        resource_type_id: query.resource_type_id,
        sort_by: query.sort_by,
    };

    let (items, total) = state
        .services
        .resources
        .list_resources(filter, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

pub async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateResourceRequest>,
) -> ApiResult<resource::Model> {
    let model = state
        .services
        .resources
        .update_resource(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(model)))
}

pub async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.resources.delete_resource(id).await?;
    Ok(Json(ApiResponse::success(json!({
        "resource_id": id,
        "status": "deleted"
    }))))
}
