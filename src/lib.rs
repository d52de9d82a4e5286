//! AssetDesk API Library
//!
//! This crate provides the core functionality for the AssetDesk
//! hardware-asset tracking API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::AuthRouterExt;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// API v1 routes. Admin-only routes are role-gated; the `/my` namespace only
// requires a valid token.
pub fn api_v1_routes() -> Router<AppState> {
    let allocations_admin = Router::new()
        .route(
            "/allocations",
            get(handlers::allocations::list_allocations)
                .post(handlers::allocations::create_allocation),
        )
        .route("/allocations/recent", get(handlers::allocations::recent_allocations))
        .route("/allocations/log", get(handlers::allocations::allocation_log))
        .route(
            "/allocations/:id",
            get(handlers::allocations::get_allocation)
                .patch(handlers::allocations::close_allocation),
        )
        .with_role("admin");

    let my_allocations = Router::new()
        .route("/my/allocations", get(handlers::allocations::my_allocations))
        .with_auth();

    let resources = Router::new()
        .route(
            "/resources",
            get(handlers::resources::list_resources).post(handlers::resources::create_resource),
        )
        .route(
            "/resources/:id",
            get(handlers::resources::get_resource)
                .put(handlers::resources::update_resource)
                .delete(handlers::resources::delete_resource),
        )
        .with_role("admin");

    let employees = Router::new()
        .route(
            "/employees",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route(
            "/employees/:id",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::delete_employee),
        )
        .with_role("admin");

    let resource_types = Router::new()
        .route(
            "/resource-types",
            get(handlers::resource_types::list_resource_types)
                .post(handlers::resource_types::create_resource_type),
        )
        .route(
            "/resource-types/:id",
            axum::routing::put(handlers::resource_types::update_resource_type)
                .delete(handlers::resource_types::delete_resource_type),
        )
        .with_role("admin");

    let dashboard = Router::new()
        .route("/dashboard", get(handlers::dashboard::dashboard_summary))
        .with_role("admin");

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(allocations_admin)
        .merge(my_allocations)
        .merge(resources)
        .merge(employees)
        .merge(resource_types)
        .merge(dashboard)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "assetdesk-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn success_response_includes_metadata() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, Some("ok"));

        let meta = response.meta.expect("metadata expected");
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn error_response_carries_message() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("oops"));
    }

    #[test]
    fn pagination_math_rounds_up() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 7, 1, 3);
        assert_eq!(page.total_pages, 3);

        let empty = PaginatedResponse::<i32>::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }
}
