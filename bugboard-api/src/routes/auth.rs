/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST {prefix}/auth/register` - Register new user
/// - `POST {prefix}/auth/login` - Login and get a token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    Json,
};
use bugboard_shared::{
    auth::{jwt, middleware::TOKEN_COOKIE, password},
    models::user::{CreateUser, Registration, User},
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name, unique across users
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name is required (at most 100 characters)"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// Optional e-mail address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

impl RegisterRequest {
    /// Trims the name and treats a blank e-mail as absent
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            password: self.password,
            email: self
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
        }
    }
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: Uuid,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token, also set as the `token` cookie
    pub token: String,
}

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Register a new user
///
/// The very first account becomes `admin`; every later one is a `user`.
///
/// # Endpoint
///
/// ```text
/// POST {prefix}/auth/register
/// Content-Type: application/json
///
/// { "name": "alice", "password": "s3cret", "email": "alice@example.com" }
/// ```
///
/// # Response
///
/// ```json
/// { "message": "User registered", "userId": "uuid" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing name or password, invalid e-mail
/// - `409 Conflict`: Name already taken
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let req = req.normalized();
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    let outcome = User::register(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    let user = match outcome {
        Registration::Created(user) => user,
        Registration::NameTaken => {
            return Err(ApiError::Conflict("Name already taken".to_string()));
        }
    };

    info!(user_id = %user.id, role = user.role.as_str(), "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered".to_string(),
            user_id: user.id,
        }),
    ))
}

/// Login endpoint
///
/// Unknown names and wrong passwords produce the same `401` response.
///
/// # Endpoint
///
/// ```text
/// POST {prefix}/auth/login
/// Content-Type: application/json
///
/// { "name": "alice", "password": "s3cret" }
/// ```
///
/// # Response
///
/// ```json
/// { "token": "eyJ..." }
/// ```
///
/// plus `Set-Cookie: token=eyJ...; HttpOnly; SameSite=Lax; Path=/; Max-Age=3600`.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<([(header::HeaderName, HeaderValue); 1], Json<LoginResponse>)> {
    req.validate()?;

    let Some(user) = User::find_by_name(&state.db, req.name.trim()).await? else {
        debug!("Login attempt for unknown name");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !password::verify_password(&req.password, &user.password_hash)? {
        debug!(user_id = %user.id, "Login attempt with wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let ttl = state.config.jwt.ttl_seconds;
    let claims = jwt::Claims::with_expiration(user.id, user.name, Duration::seconds(ttl));
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    let cookie = HeaderValue::from_str(&token_cookie(&token, ttl, state.config.api.production))
        .map_err(|e| ApiError::InternalError(format!("Invalid cookie value: {}", e)))?;

    info!(user_id = %user.id, "User logged in");

    Ok(([(header::SET_COOKIE, cookie)], Json(LoginResponse { token })))
}

/// `Set-Cookie` value carrying the token
fn token_cookie(token: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        TOKEN_COOKIE, token, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
