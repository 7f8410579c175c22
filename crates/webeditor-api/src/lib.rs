//! Web Editor API - REST server
//!
//! Provides HTTP endpoints for account signup, bearer-token login, and
//! author-owned content management.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

#[cfg(any(test, feature = "test-utils"))]
pub use testing::{create_router_for_testing, create_state_for_testing, create_state_with_clock};

use axum::{http::HeaderValue, routing::get, Router};
use state::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .nest("/api", routes::api_routes(state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origins; none configured means same-origin only
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request},
    };
    use tower::ServiceExt;
    use webeditor_core::{MemoryStore, SystemClock};

    fn router_with_origins(origins: &[&str]) -> Router {
        let mut config = testing::test_config();
        config.server.cors_origins = origins.iter().map(|o| o.to_string()).collect();
        let store = Arc::new(MemoryStore::new());
        let state = AppState::build(config, store.clone(), store, Arc::new(SystemClock)).unwrap();
        create_router(Arc::new(state))
    }

    async fn preflight(app: Router, origin: &str) -> Option<String> {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/contents")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin_and_skips_invalid_entries() {
        let app = router_with_origins(&["https://editor.example", "bad\norigin"]);

        assert_eq!(
            preflight(app.clone(), "https://editor.example").await.as_deref(),
            Some("https://editor.example")
        );
        assert_eq!(preflight(app, "https://evil.example").await, None);
    }

    #[tokio::test]
    async fn test_cors_wildcard_allows_any_origin() {
        let app = router_with_origins(&["*"]);
        assert_eq!(
            preflight(app, "https://anywhere.example").await.as_deref(),
            Some("*")
        );
    }

    #[tokio::test]
    async fn test_cors_without_origins_allows_none() {
        let app = router_with_origins(&[]);
        assert_eq!(preflight(app, "https://editor.example").await, None);
    }
}
