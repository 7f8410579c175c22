//! API route definitions

use crate::auth::{auth_middleware, optional_auth_middleware};
use crate::handlers::{auth, contents};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create `/api` routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/contents",
            get(contents::list_contents).post(contents::create_content),
        )
        .route("/contents/my", get(contents::my_contents))
        .route("/contents/search", get(contents::search_contents))
        .route("/contents/status/:status", get(contents::contents_by_status))
        .route(
            "/contents/:id",
            get(contents::get_content)
                .put(contents::update_content)
                .delete(contents::delete_content),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
