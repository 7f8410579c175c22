//! Security headers middleware
//!
//! Adds security headers to all HTTP responses:
//! - X-Content-Type-Options: nosniff
//! - X-Frame-Options: DENY
//! - Strict-Transport-Security
//! - Content-Security-Policy (outside the Swagger UI, which needs inline scripts)
//! - Referrer-Policy
//! - Cache-Control: no-store on `/api` responses, which carry tokens and
//!   per-user data

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

const SWAGGER_PREFIX: &str = "/swagger-ui";
const API_PREFIX: &str = "/api/";

/// Security headers middleware
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if !path.starts_with(SWAGGER_PREFIX) {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'"),
        );
    }

    if path.starts_with(API_PREFIX) {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{Request, StatusCode},
        middleware,
        response::IntoResponse,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn test_handler() -> impl IntoResponse {
        (StatusCode::OK, "test response")
    }

    fn app() -> Router {
        Router::new()
            .route("/health", get(test_handler))
            .route("/api/contents", get(test_handler))
            .route("/swagger-ui/index.html", get(test_handler))
            .layer(middleware::from_fn(security_headers_middleware))
    }

    async fn get_path(path: &str) -> Response {
        app()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_security_headers_added() {
        let response = get_path("/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
        assert_eq!(
            headers.get(header::CONTENT_SECURITY_POLICY).unwrap(),
            "default-src 'self'"
        );
        assert!(headers.get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn test_api_responses_are_not_cached() {
        let response = get_path("/api/contents").await;
        assert_eq!(response.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
    }

    #[tokio::test]
    async fn test_swagger_ui_has_no_csp() {
        let response = get_path("/swagger-ui/index.html").await;
        assert!(response.headers().get(header::CONTENT_SECURITY_POLICY).is_none());
        assert_eq!(response.headers().get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    }
}
