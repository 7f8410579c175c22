//! Storage capabilities for users and content
//!
//! Handlers only see these traits. [`PgStore`] backs them with PostgreSQL,
//! [`MemoryStore`] keeps everything in process for tests and local runs.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::{Content, ContentDraft, NewUser, Page, PageRequest, Result, User};

/// Persisted user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; a duplicate username or email yields `EditorError::Conflict`
    async fn insert(&self, user: NewUser) -> Result<User>;

    /// Exact, case-sensitive username lookup
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn exists_by_username(&self, username: &str) -> Result<bool>;

    async fn exists_by_email(&self, email: &str) -> Result<bool>;

    /// Cheap reachability probe for readiness checks
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Which content rows a listing covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentFilter {
    All,
    Author(i64),
    Status(String),
    AuthorAndStatus(i64, String),
    /// Case-sensitive substring of the title
    TitleContains(String),
}

/// Author-owned content items
///
/// `update` and `delete` load the row and apply
/// [`authorize_mutation`](crate::authorize_mutation) atomically with the
/// write, returning `NotFound` for a missing id and `Forbidden` for a
/// non-author.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn insert(&self, author_id: i64, draft: ContentDraft) -> Result<Content>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Content>>;

    async fn update(&self, id: i64, actor_id: i64, draft: ContentDraft) -> Result<Content>;

    async fn delete(&self, id: i64, actor_id: i64) -> Result<()>;

    async fn find_page(&self, filter: &ContentFilter, request: &PageRequest)
        -> Result<Page<Content>>;

    async fn count_by_author(&self, author_id: i64) -> Result<u64>;
}
