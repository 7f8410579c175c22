//! Request extractors
//!
//! [`AppJson`] replaces `axum::Json` for request bodies so that malformed
//! JSON, wrong field types and a missing `Content-Type` all come back as the
//! regular 400 `ApiError` body instead of axum's plain-text rejections.

use crate::error::AppError;
use axum::extract::{rejection::JsonRejection, FromRequest};

/// JSON body whose rejection is an [`AppError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), reason = %rejection.body_text(), "Rejected request body");
        AppError::validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::IntoResponse,
        routing::post,
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        name: String,
    }

    async fn accept(AppJson(_payload): AppJson<Payload>) -> impl IntoResponse {
        StatusCode::NO_CONTENT
    }

    async fn status_of(content_type: Option<&str>, body: &str) -> StatusCode {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        Router::new()
            .route("/", post(accept))
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_well_formed_body_passes() {
        assert_eq!(
            status_of(Some("application/json"), r#"{"name":"x"}"#).await,
            StatusCode::NO_CONTENT
        );
    }

    #[tokio::test]
    async fn test_body_rejections_are_bad_request() {
        assert_eq!(
            status_of(Some("application/json"), r#"{"name":5}"#).await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Some("application/json"), "{not json").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(None, r#"{"name":"x"}"#).await, StatusCode::BAD_REQUEST);
    }
}
