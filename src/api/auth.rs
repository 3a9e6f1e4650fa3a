use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState};
use crate::constants::limits::MIN_PASSWORD_LENGTH;

const SESSION_USER_KEY: &str = "user_id";

/// The authenticated requester, resolved by the middleware and handed to
/// handlers as a request extension.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i32,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub api_key: String,
}

#[derive(Serialize)]
pub struct UserInfoResponse {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that checks:
/// 1. Session cookie (from login/signup)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    // Check session first (fastest path for web UI)
    if let Ok(Some(user_id)) = session.get::<i32>(SESSION_USER_KEY).await {
        tracing::Span::current().record("user_id", user_id);
        request.extensions_mut().insert(CurrentUser { id: user_id });
        return Ok(next.run(request).await);
    }

    if let Some(key) = extract_api_key(&headers)
        && let Ok(Some(user)) = state.store().verify_api_key(&key).await
    {
        tracing::Span::current().record("user_id", user.id);
        request.extensions_mut().insert(CurrentUser { id: user.id });
        return Ok(next.run(request).await);
    }

    let response = (StatusCode::UNAUTHORIZED, "Unauthorized");
    Ok(response.into_response())
}

/// Extract API key from headers
fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signup
/// Create an account, start a session, and return the API key
pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.username.is_empty()
        || payload.full_name.is_empty()
        || payload.email.is_empty()
        || payload.password.is_empty()
    {
        return Err(ApiError::validation("Please enter all fields"));
    }
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if state
        .store()
        .get_user_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to check username: {e}")))?
        .is_some()
    {
        return Err(ApiError::Conflict("Username is already taken".to_string()));
    }

    if state
        .store()
        .get_user_by_email(&payload.email)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to check email: {e}")))?
        .is_some()
    {
        return Err(ApiError::Conflict("Email is already taken".to_string()));
    }

    let security = state.config().read().await.security.clone();
    let user = state
        .store()
        .create_user(
            &payload.username,
            &payload.full_name,
            &payload.email,
            &payload.password,
            &security,
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create user: {e}")))?;

    if let Err(e) = session.insert(SESSION_USER_KEY, user.id).await {
        return Err(ApiError::internal(format!("Failed to create session: {e}")));
    }

    tracing::info!("New user signed up: {}", user.username);

    Ok(Json(LoginResponse {
        username: user.username,
        api_key: user.api_key,
    }))
}

/// POST /auth/login
/// Authenticate with username and password, returns API key on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let is_valid = state
        .store()
        .verify_user_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    if !is_valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let user = state
        .store()
        .get_user_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    if let Err(e) = session.insert(SESSION_USER_KEY, user.id).await {
        return Err(ApiError::internal(format!("Failed to create session: {e}")));
    }

    Ok(Json(LoginResponse {
        username: user.username,
        api_key: user.api_key,
    }))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /auth/me
/// Get current user information (requires authentication)
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<UserInfoResponse>, ApiError> {
    let user = state
        .store()
        .get_user_by_id(user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    Ok(Json(UserInfoResponse {
        username: user.username,
        full_name: user.full_name,
        email: user.email,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }))
}

/// PUT /auth/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.new_password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(format!(
            "New password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if payload.current_password == payload.new_password {
        return Err(ApiError::validation(
            "New password must be different from current password",
        ));
    }

    let user = state
        .store()
        .get_user_by_id(user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    let is_valid = state
        .store()
        .verify_user_password(&user.username, &payload.current_password)
        .await
        .map_err(|e| ApiError::internal(format!("Password verification error: {e}")))?;

    if !is_valid {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    let security = state.config().read().await.security.clone();
    state
        .store()
        .update_user_password(&user.username, &payload.new_password, &security)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update password: {e}")))?;

    tracing::info!("Password changed for user: {}", user.username);

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}
