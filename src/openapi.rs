use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AssetDesk API",
        version = "0.1.0",
        description = r#"
# AssetDesk Hardware Asset Tracking API

Backend for registering hardware resources, managing employees, and running
the allocate / return workflow.

## Authentication

Obtain a token from `POST /auth/login` and pass it as a bearer token:

```
Authorization: Bearer <your-jwt-token>
```

Admin routes require the `admin` role; `/api/v1/my/*` routes only require a
valid token.

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20, max 100)
query parameters and return a paginated envelope.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "allocations", description = "Allocate / return workflow"),
        (name = "dashboard", description = "Aggregate counts")
    ),
    paths(
        crate::auth::login_handler,
        crate::auth::me_handler,
        crate::handlers::allocations::create_allocation,
        crate::handlers::allocations::close_allocation,
        crate::handlers::allocations::recent_allocations,
        crate::handlers::dashboard::dashboard_summary,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,

            crate::auth::LoginRequest,
            crate::auth::LoginResponse,
            crate::auth::UserInfo,

            crate::services::allocations::CreateAllocationRequest,
            crate::services::allocations::CloseAllocationRequest,
            crate::services::allocations::AllocationDetail,
            crate::services::resources::CreateResourceRequest,
            crate::services::resources::UpdateResourceRequest,
            crate::services::employees::CreateEmployeeRequest,
            crate::services::employees::UpdateEmployeeRequest,
            crate::services::resource_types::CreateResourceTypeRequest,
            crate::services::resource_types::UpdateResourceTypeRequest,
            crate::services::dashboard::DashboardSummary,

            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDocV1;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("AssetDesk API"));
        assert!(json.contains("/api/v1/allocations"));
        assert!(json.contains("bearer_auth"));
    }
}
