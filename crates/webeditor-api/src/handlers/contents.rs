//! Content management handlers
//!
//! Thin adapters over [`ContentStore`](webeditor_core::ContentStore): they
//! validate input, build page descriptors, and pass the authenticated
//! principal's id to the store, which applies the ownership check.

use crate::auth::service::not_blank;
use crate::auth::{AuthenticatedUser, MessageResponse};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;
use webeditor_core::{
    content_not_found, Content, ContentDraft, ContentFilter, Page, PageRequest, SortDirection,
    SortField,
};

/// Content creation and update request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ContentRequest {
    /// Title, 1 to 255 characters
    #[serde(default)]
    #[schema(example = "Release notes")]
    #[validate(
        custom(function = "not_blank"),
        length(min = 1, max = 255, message = "Title must be between 1 and 255 characters")
    )]
    pub title: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub body: String,

    /// Free-form status; `DRAFT` when omitted
    #[schema(example = "DRAFT")]
    #[validate(length(max = 255, message = "Status must be at most 255 characters"))]
    pub status: Option<String>,

    /// Comma-separated tags
    #[schema(example = "rust,release")]
    pub tags: Option<String>,
}

impl From<ContentRequest> for ContentDraft {
    fn from(request: ContentRequest) -> Self {
        ContentDraft::new(request.title, request.body)
            .with_status(request.status)
            .with_tags(request.tags)
    }
}

/// Content item as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub status: String,
    pub author_username: String,
    pub tags: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Content> for ContentResponse {
    fn from(content: Content) -> Self {
        Self {
            id: content.id,
            title: content.title,
            body: content.body,
            status: content.status,
            author_username: content.author_username,
            tags: content.tags,
            created_at: content.created_at,
            updated_at: content.updated_at,
        }
    }
}

/// One page of content
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentPage {
    pub items: Vec<ContentResponse>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub page: u32,
    pub size: u32,
}

impl From<Page<Content>> for ContentPage {
    fn from(page: Page<Content>) -> Self {
        let page = page.map(ContentResponse::from);
        Self {
            items: page.items,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
            page: page.page,
            size: page.size,
        }
    }
}

/// Pagination parameters shared by every listing
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    /// Zero-based page index
    #[param(default = 0)]
    pub page: Option<i64>,

    /// Items per page, 1 to 100
    #[param(default = 10)]
    pub size: Option<i64>,

    /// One of id, title, status, createdAt, updatedAt
    #[param(default = "createdAt")]
    pub sort_by: Option<String>,

    /// ASC or DESC
    #[param(default = "DESC")]
    pub sort_direction: Option<String>,
}

impl PageParams {
    fn to_request(&self) -> Result<PageRequest, AppError> {
        let defaults = PageRequest::default();

        let page = match self.page {
            None => defaults.page(),
            Some(page) => u32::try_from(page)
                .map_err(|_| AppError::validation("Page index must not be negative"))?,
        };
        let size = match self.size {
            None => defaults.size(),
            // Out-of-range values are rejected by PageRequest::new
            Some(size) => u32::try_from(size).unwrap_or(0),
        };
        let sort = match self.sort_by.as_deref() {
            None => defaults.sort(),
            Some(field) => field.parse::<SortField>()?,
        };
        let direction = match self.sort_direction.as_deref() {
            None => defaults.direction(),
            Some(direction) => direction.parse::<SortDirection>()?,
        };

        Ok(PageRequest::new(page, size, sort, direction)?)
    }
}

/// Parameters for listing the caller's own content
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct MyContentParams {
    /// Only return items with this status
    pub status: Option<String>,
    #[param(default = 0)]
    pub page: Option<i64>,
    #[param(default = 10)]
    pub size: Option<i64>,
    #[param(default = "createdAt")]
    pub sort_by: Option<String>,
    #[param(default = "DESC")]
    pub sort_direction: Option<String>,
}

/// Parameters for title search
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Case-sensitive substring of the title
    pub keyword: Option<String>,
    #[param(default = 0)]
    pub page: Option<i64>,
    #[param(default = 10)]
    pub size: Option<i64>,
    #[param(default = "createdAt")]
    pub sort_by: Option<String>,
    #[param(default = "DESC")]
    pub sort_direction: Option<String>,
}

impl MyContentParams {
    fn paging(&self) -> PageParams {
        PageParams {
            page: self.page,
            size: self.size,
            sort_by: self.sort_by.clone(),
            sort_direction: self.sort_direction.clone(),
        }
    }
}

impl SearchParams {
    fn paging(&self) -> PageParams {
        PageParams {
            page: self.page,
            size: self.size,
            sort_by: self.sort_by.clone(),
            sort_direction: self.sort_direction.clone(),
        }
    }
}

async fn list(
    state: &AppState,
    filter: ContentFilter,
    params: &PageParams,
) -> Result<Json<ContentPage>, AppError> {
    let request = params.to_request()?;
    let page = state.contents.find_page(&filter, &request).await?;
    Ok(Json(ContentPage::from(page)))
}

/// Create new content
///
/// The authenticated user becomes the author. Status defaults to `DRAFT`.
#[utoipa::path(
    post,
    path = "/api/contents",
    tag = "contents",
    request_body = ContentRequest,
    responses(
        (status = 201, description = "Content created", body = ContentResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_content(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    AppJson(request): AppJson<ContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let content = state.contents.insert(user.id, request.into()).await?;
    tracing::info!(content_id = content.id, author = %user.username, "Content created");

    Ok((StatusCode::CREATED, Json(ContentResponse::from(content))))
}

/// Update content
///
/// Only the author may update. An omitted status resets it to `DRAFT`.
#[utoipa::path(
    put,
    path = "/api/contents/{id}",
    tag = "contents",
    params(("id" = i64, Path, description = "Content ID")),
    request_body = ContentRequest,
    responses(
        (status = 200, description = "Content updated", body = ContentResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Caller is not the author", body = crate::error::ApiError),
        (status = 404, description = "Content not found", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_content(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    AppJson(request): AppJson<ContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let content = state.contents.update(id, user.id, request.into()).await?;
    tracing::info!(content_id = id, author = %user.username, "Content updated");

    Ok(Json(ContentResponse::from(content)))
}

/// Delete content
///
/// Only the author may delete.
#[utoipa::path(
    delete,
    path = "/api/contents/{id}",
    tag = "contents",
    params(("id" = i64, Path, description = "Content ID")),
    responses(
        (status = 200, description = "Content deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Caller is not the author", body = crate::error::ApiError),
        (status = 404, description = "Content not found", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_content(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.contents.delete(id, user.id).await?;
    tracing::info!(content_id = id, author = %user.username, "Content deleted");

    Ok(Json(MessageResponse::new("Content deleted successfully")))
}

/// Get content by ID
#[utoipa::path(
    get,
    path = "/api/contents/{id}",
    tag = "contents",
    params(("id" = i64, Path, description = "Content ID")),
    responses(
        (status = 200, description = "Content found", body = ContentResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Content not found", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let content = state
        .contents
        .find_by_id(id)
        .await?
        .ok_or_else(|| content_not_found(id))?;

    Ok(Json(ContentResponse::from(content)))
}

/// List all content
#[utoipa::path(
    get,
    path = "/api/contents",
    tag = "contents",
    params(PageParams),
    responses(
        (status = 200, description = "Content page", body = ContentPage),
        (status = 400, description = "Invalid paging parameters", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_contents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    list(&state, ContentFilter::All, &params).await
}

/// List the caller's own content, optionally by status
#[utoipa::path(
    get,
    path = "/api/contents/my",
    tag = "contents",
    params(MyContentParams),
    responses(
        (status = 200, description = "Content page", body = ContentPage),
        (status = 400, description = "Invalid paging parameters", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_contents(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<MyContentParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = match params.status.clone() {
        Some(status) => ContentFilter::AuthorAndStatus(user.id, status),
        None => ContentFilter::Author(user.id),
    };
    list(&state, filter, &params.paging()).await
}

/// List content with a given status
#[utoipa::path(
    get,
    path = "/api/contents/status/{status}",
    tag = "contents",
    params(("status" = String, Path, description = "Content status"), PageParams),
    responses(
        (status = 200, description = "Content page", body = ContentPage),
        (status = 400, description = "Invalid paging parameters", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn contents_by_status(
    State(state): State<Arc<AppState>>,
    Path(status): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    list(&state, ContentFilter::Status(status), &params).await
}

/// Search content by title substring
#[utoipa::path(
    get,
    path = "/api/contents/search",
    tag = "contents",
    params(SearchParams),
    responses(
        (status = 200, description = "Content page", body = ContentPage),
        (status = 400, description = "Missing keyword or invalid paging", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn search_contents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let keyword = params
        .keyword
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AppError::validation("Search keyword must not be blank"))?;

    list(&state, ContentFilter::TitleContains(keyword), &params.paging()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<i64>, size: Option<i64>, sort_by: Option<&str>, dir: Option<&str>) -> PageParams {
        PageParams {
            page,
            size,
            sort_by: sort_by.map(str::to_string),
            sort_direction: dir.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults() {
        let request = PageParams::default().to_request().unwrap();
        assert_eq!(request, PageRequest::default());
    }

    #[test]
    fn test_explicit_paging() {
        let request = params(Some(2), Some(5), Some("title"), Some("asc"))
            .to_request()
            .unwrap();
        assert_eq!(request.page(), 2);
        assert_eq!(request.size(), 5);
        assert_eq!(request.sort(), SortField::Title);
        assert_eq!(request.direction(), SortDirection::Asc);
    }

    #[test]
    fn test_rejects_out_of_range_and_unknown_values() {
        assert!(params(Some(-1), None, None, None).to_request().is_err());
        assert!(params(None, Some(0), None, None).to_request().is_err());
        assert!(params(None, Some(101), None, None).to_request().is_err());
        assert!(params(None, Some(-5), None, None).to_request().is_err());
        assert!(params(None, None, Some("password"), None).to_request().is_err());
        assert!(params(None, None, None, Some("UP")).to_request().is_err());
    }

    #[test]
    fn test_request_defaults_status_to_draft() {
        let request = ContentRequest {
            title: "t".to_string(),
            body: "b".to_string(),
            status: None,
            tags: Some("a,b".to_string()),
        };
        let draft = ContentDraft::from(request);
        assert_eq!(draft.status, "DRAFT");
        assert_eq!(draft.tags.as_deref(), Some("a,b"));
    }

    #[test]
    fn test_request_validation() {
        let valid = ContentRequest {
            title: "Hello".to_string(),
            body: "World".to_string(),
            status: None,
            tags: None,
        };
        assert!(valid.validate().is_ok());

        let blank_title = ContentRequest {
            title: "   ".to_string(),
            ..valid.clone()
        };
        assert!(blank_title.validate().is_err());

        let long_title = ContentRequest {
            title: "x".repeat(256),
            ..valid.clone()
        };
        assert!(long_title.validate().is_err());

        let max_title = ContentRequest {
            title: "é".repeat(255),
            ..valid.clone()
        };
        assert!(max_title.validate().is_ok());

        let empty_body = ContentRequest {
            body: String::new(),
            ..valid
        };
        assert!(empty_body.validate().is_err());
    }
}
