/// Authentication middleware for guarded and public routes
///
/// Extracts the bearer token from the Authorization header, validates it,
/// and loads the user it names. On success the user is attached to the
/// request extensions as [`AuthenticatedUser`].
use super::jwt::TokenError;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use webeditor_core::{EditorError, Role, User};

/// Principal bound to a request
///
/// Added to request extensions by the auth middleware and extracted in
/// handlers with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    /// User's unique identifier
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

/// Authentication middleware errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Token subject no longer exists")]
    UnknownSubject,

    #[error("User lookup failed: {0}")]
    Store(EditorError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Store(err) => AppError::from(err).into_response(),
            _ => AppError::Unauthenticated.into_response(),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    let username = state.tokens.subject_of(token)?;

    let user = state
        .users
        .find_by_username(&username)
        .await
        .map_err(AuthError::Store)?
        .ok_or(AuthError::UnknownSubject)?;

    Ok(AuthenticatedUser::from(user))
}

/// Authentication middleware that requires a valid bearer token
///
/// This middleware:
/// 1. Drops any principal already present on the request
/// 2. Extracts the `Bearer` token from the Authorization header
/// 3. Validates the token signature, algorithm and expiration
/// 4. Loads the user named by the token subject
/// 5. Adds [`AuthenticatedUser`] to request extensions
///
/// Every failure is answered with the same 401 body; the cause is only
/// logged.
///
/// # Usage
///
/// ```ignore
/// use axum::{Router, routing::get, middleware};
/// use webeditor_api::auth::middleware::auth_middleware;
///
/// let app = Router::new()
///     .route("/protected", get(protected_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    request.extensions_mut().remove::<AuthenticatedUser>();

    let user = match authenticate(&state, request.headers()).await {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!(
                method = %request.method(),
                path = %request.uri().path(),
                reason = %e,
                "Rejected unauthenticated request"
            );
            return Err(e);
        }
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Optional authentication middleware
///
/// Unlike `auth_middleware`, this doesn't fail if no token is present.
/// It only adds the user to extensions if a valid token exists.
pub async fn optional_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().remove::<AuthenticatedUser>();

    if request.headers().contains_key(header::AUTHORIZATION) {
        match authenticate(&state, request.headers()).await {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(reason = %e, "Ignoring invalid credentials on public route"),
        }
    }

    next.run(request).await
}
