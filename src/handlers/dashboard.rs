use crate::{
    services::dashboard::DashboardSummary, ApiResponse, ApiResult, AppState,
};
use axum::{extract::State, response::Json};

/// Aggregate counts for the admin dashboard.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses((status = 200, description = "Dashboard summary", body = DashboardSummary)),
    security(("bearer_auth" = [])),
    tag = "dashboard"
)]
pub async fn dashboard_summary(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    let summary = state.services.dashboard.summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}
