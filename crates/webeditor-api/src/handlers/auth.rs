//! Authentication API handlers
//!
//! Provides HTTP endpoints for account signup, login, and the current-user
//! profile.

use crate::auth::{AuthenticatedUser, JwtResponse, LoginRequest, MessageResponse, SignupRequest, UserInfo};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

/// Register a new user account
///
/// New users are assigned `ROLE_USER`.
///
/// # Responses
///
/// * `200 OK` - User successfully registered
/// * `400 Bad Request` - Invalid input, or username/email already in use
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User registered successfully", body = MessageResponse),
        (status = 400, description = "Invalid input or duplicate account", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth.signup(request).await?;
    Ok(Json(response))
}

/// Login with username and password
///
/// Returns a bearer token whose subject is the username. An unreadable body
/// is answered like any other failed login.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = JwtResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "Login rejected: unreadable body");
        AppError::Unauthenticated
    })?;
    let response = state.auth.login(request).await?;
    Ok(Json(response))
}

/// Get current user profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user info", body = UserInfo),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let info = state.auth.me(&user).await?;
    Ok(Json(info))
}
