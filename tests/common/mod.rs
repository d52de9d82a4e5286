use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    Extension, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use assetdesk_api::{
    auth::{hash_password, AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::employee,
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

/// Helper harness for spinning up an application backed by a throwaway
/// SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub admin: employee::Model,
    token: String,
    auth_service: Arc<AuthService>,
    db_file: std::path::PathBuf,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_file = std::env::temp_dir().join(format!("assetdesk_test_{}.db", Uuid::new_v4()));
        let _ = std::fs::remove_file(&db_file);

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_cfg = AuthConfig {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_audience: cfg.auth_audience.clone(),
            jwt_issuer: cfg.auth_issuer.clone(),
            token_expiration: 3600,
        };
        let auth_service = Arc::new(AuthService::new(auth_cfg, db_arc.clone()));

        let services = AppServices::new(db_arc.clone(), event_sender.clone());
        let state = AppState {
            db: db_arc.clone(),
            config: cfg,
            event_sender,
            services,
        };

        // Seed an admin with a stored password so login and role-gated
        // routes can be exercised.
        let admin = employee::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Test Admin".to_string()),
            email: Set(ADMIN_EMAIL.to_string()),
            password_hash: Set(Some(
                hash_password(ADMIN_PASSWORD).expect("hash admin password"),
            )),
            role: Set("admin".to_string()),
            position: Set(None),
            department: Set(None),
            status: Set(None),
            employee_code: Set(Some("ADM001".to_string())),
            phone: Set(Some("555-0100".to_string())),
            birthday: Set(Some("1985-01-01".to_string())),
            hire_date: Set(Some(Utc::now())),
            is_deleted: Set(false),
            ..Default::default()
        }
        .insert(&*db_arc)
        .await
        .expect("seed admin employee");

        let token = auth_service
            .generate_token(&admin)
            .expect("mint admin token");

        let router = Router::new()
            .nest("/api/v1", assetdesk_api::api_v1_routes())
            .nest(
                "/auth",
                assetdesk_api::auth::auth_routes().with_state(auth_service.clone()),
            )
            .layer(Extension(auth_service.clone()))
            .with_state(state.clone());

        Self {
            router,
            state,
            admin,
            token,
            auth_service,
            db_file,
            _event_task: event_task,
        }
    }

    /// Access the auth service used by the test application.
    #[allow(dead_code)]
    pub fn auth_service(&self) -> Arc<AuthService> {
        self.auth_service.clone()
    }

    /// Bearer token for the seeded admin.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for admin-authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_file);
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("collect response body");
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}
