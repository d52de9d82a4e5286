/*!
 * Authentication and authorization for the AssetDesk API.
 *
 * Supports JWT bearer tokens (HS256) with role-based access control.
 * Employees authenticate with their email; accounts without a stored
 * password hash use a derived first-login password that is hashed and
 * persisted on first successful login.
 */

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::entities::employee::{self, EmployeeRole};

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated user data extracted from a validated token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub token_id: String,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(EmployeeRole::Admin.as_str())
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    /// Access token lifetime in seconds.
    pub token_expiration: i64,
}

impl AuthConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            jwt_audience: config.auth_audience.clone(),
            jwt_issuer: config.auth_issuer.clone(),
            token_expiration: config.jwt_expiration as i64,
        }
    }
}

/// Authentication service that handles credential checks and token issuance
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Validate credentials against the employees table and issue a token.
    ///
    /// An employee whose `password_hash` is still null is matched against
    /// the derived first-login password; on success the password is hashed
    /// and stored so subsequent logins take the normal path.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let found = employee::Entity::find()
            .filter(employee::Column::Email.eq(email))
            .filter(employee::Column::IsDeleted.eq(false))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let Some(user) = found else {
            return Err(AuthError::InvalidCredentials);
        };

        match &user.password_hash {
            Some(stored) => {
                if !verify_password(password, stored)? {
                    return Err(AuthError::InvalidCredentials);
                }
            }
            None => {
                let expected = first_login_password(&user).ok_or(AuthError::InvalidCredentials)?;
                if password != expected {
                    return Err(AuthError::InvalidCredentials);
                }

                // Persist the hash so the derived password path runs once.
                let hashed = hash_password(password)?;
                let mut active: employee::ActiveModel = user.clone().into();
                active.password_hash = Set(Some(hashed));
                active
                    .update(&*self.db)
                    .await
                    .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
                debug!(employee_id = %user.id, "stored password hash on first login");
            }
        }

        let token = self.generate_token(&user)?;
        Ok(LoginResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_expiration,
            user: UserInfo {
                id: user.id,
                name: user.name,
                email: user.email,
                role: user.role,
            },
        })
    }

    /// Generate a signed JWT for an employee
    pub fn generate_token(&self, user: &employee::Model) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + ChronoDuration::seconds(self.config.token_expiration);

        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.clone()]);
        validation.set_issuer(&[self.config.jwt_issuer.clone()]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        Ok(claims)
    }
}

/// Derive the first-login password for an employee:
/// last 3 of the employee code, `#`, last 4 of the phone, `@`, birth year.
///
/// Returns `None` if any of the three fields is missing or too short.
fn first_login_password(user: &employee::Model) -> Option<String> {
    let code = user.employee_code.as_deref()?;
    let phone = user.phone.as_deref()?;
    let birthday = user.birthday.as_deref()?;

    let code_tail = tail_chars(code, 3)?;
    let phone_tail = tail_chars(phone, 4)?;
    let birth_year: String = birthday.chars().take(4).collect();
    if birth_year.chars().count() < 4 {
        return None;
    }

    Some(format!("{}#{}@{}", code_tail, phone_tail, birth_year))
}

/// Last `n` characters of `s`, or `None` when the string is shorter.
/// Counts characters rather than bytes so multibyte input cannot panic.
fn tail_chars(s: &str, n: usize) -> Option<String> {
    let len = s.chars().count();
    if len < n {
        return None;
    }
    Some(s.chars().skip(len - n).collect())
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message): (StatusCode, &str, String) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication required".to_string(),
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired".to_string(),
            ),
            Self::TokenCreation(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_TOKEN_CREATION_FAILED",
                msg.clone(),
            ),
            Self::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "AUTH_INSUFFICIENT_PERMISSIONS",
                "Insufficient permissions".to_string(),
            ),
            Self::PasswordHash(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_PASSWORD_ERROR",
                "Failed to process credentials".to_string(),
            ),
            Self::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_DATABASE_ERROR",
                "Authentication backend error".to_string(),
            ),
            Self::InternalError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": error_code,
            "message": error_message,
            "timestamp": Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

/// Authentication middleware that extracts and validates bearer tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let headers = request.headers().clone();

    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    match extract_auth_from_headers(&headers, &auth_service) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Role middleware to check that the authenticated user has the required role
pub async fn role_middleware(
    State(required_role): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = match request.extensions().get::<AuthUser>() {
        Some(user) => user.clone(),
        None => return Err(AuthError::MissingAuth),
    };

    if !user.has_role(&required_role) {
        warn!(user_id = %user.user_id, required_role, "role check failed");
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_value) = auth_header.to_str() {
            if auth_value.starts_with("Bearer ") {
                let token = auth_value.trim_start_matches("Bearer ").trim();
                let claims = auth_service.validate_token(token)?;
                let user_id =
                    Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

                return Ok(AuthUser {
                    user_id,
                    name: claims.name,
                    email: claims.email,
                    role: claims.role,
                    token_id: claims.jti,
                });
            }
        }
    }

    Err(AuthError::MissingAuth)
}

/// Login request payload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Successful login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Authentication routes
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    let protected = axum::Router::new()
        .route("/me", axum::routing::get(me_handler))
        .with_auth();

    axum::Router::new()
        .route("/login", axum::routing::post(login_handler))
        .merge(protected)
}

/// Login handler
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(credentials): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    credentials
        .validate()
        .map_err(|_| AuthError::InvalidCredentials)?;

    let response = auth_service
        .login(&credentials.email, &credentials.password)
        .await?;

    Ok(Json(response))
}

/// Current-user handler
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me_handler(
    State(auth_service): State<Arc<AuthService>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserInfo>, AuthError> {
    // Read back from the database so role/name changes are reflected
    // without waiting for the token to expire.
    let user = employee::Entity::find_by_id(auth_user.user_id)
        .filter(employee::Column::IsDeleted.eq(false))
        .one(&*auth_service.db)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::InvalidToken)?;

    Ok(Json(UserInfo {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    }))
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_role(self, role: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_role(self, role: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            role.to_string(),
            role_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_employee(code: Option<&str>, phone: Option<&str>, birthday: Option<&str>) -> employee::Model {
        employee::Model {
            id: Uuid::new_v4(),
            name: "Jordan Smith".to_string(),
            email: "jordan@example.com".to_string(),
            password_hash: None,
            role: "employee".to_string(),
            position: None,
            department: None,
            status: None,
            employee_code: code.map(str::to_string),
            phone: phone.map(str::to_string),
            birthday: birthday.map(str::to_string),
            hire_date: None,
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn test_auth_service() -> AuthService {
        let config = AuthConfig {
            jwt_secret: "test-secret-key-that-is-long-enough!".to_string(),
            jwt_audience: "assetdesk-api".to_string(),
            jwt_issuer: "assetdesk-auth".to_string(),
            token_expiration: 3600,
        };
        // Token helpers never touch the connection.
        let db = Arc::new(DatabaseConnection::default());
        AuthService::new(config, db)
    }

    #[test]
    fn first_login_password_combines_code_phone_and_birth_year() {
        let user = sample_employee(Some("EMP042"), Some("555-1234"), Some("1991-06-02"));
        assert_eq!(first_login_password(&user).as_deref(), Some("042#1234@1991"));
    }

    #[test]
    fn first_login_password_handles_multibyte_fields() {
        let user = sample_employee(Some("EMP04é"), Some("12é345"), Some("1991-06-02"));
        assert_eq!(
            first_login_password(&user).as_deref(),
            Some("04é#é345@1991")
        );
    }

    #[test]
    fn first_login_password_requires_all_fields() {
        let user = sample_employee(None, Some("555-1234"), Some("1991-06-02"));
        assert!(first_login_password(&user).is_none());

        let short = sample_employee(Some("A1"), Some("555-1234"), Some("1991-06-02"));
        assert!(first_login_password(&short).is_none());
    }

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(verify_password("s3cret!", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn token_round_trips_with_claims() {
        let service = test_auth_service();
        let user = sample_employee(Some("EMP001"), Some("555-0000"), Some("1990-01-01"));

        let token = service.generate_token(&user).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, "jordan@example.com");
        assert_eq!(claims.role, "employee");
        assert_eq!(claims.iss, "assetdesk-auth");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = test_auth_service();
        let user = sample_employee(Some("EMP001"), Some("555-0000"), Some("1990-01-01"));

        let mut token = service.generate_token(&user).unwrap();
        token.push('x');
        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }
}
