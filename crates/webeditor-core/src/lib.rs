//! Web Editor Core - Domain models, storage, and shared types
//!
//! This crate defines the core abstractions used by the web editor API:
//! - Users and their single role
//! - Author-owned content items and their drafts
//! - Pagination descriptors and page records
//! - Storage traits with PostgreSQL and in-memory implementations
//! - The ownership guard applied to content mutations
//! - Configuration management

pub mod clock;
pub mod config;
pub mod guard;
pub mod page;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, PasswordConfig,
    ServerConfig,
};
pub use guard::{authorize_mutation, content_not_found, Mutation};
pub use page::{Page, PageRequest, SortDirection, SortField, MAX_PAGE_SIZE};
pub use store::{ContentFilter, ContentStore, MemoryStore, PgStore, UserStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for web editor operations
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{}", .0.message())]
    Conflict(Conflict),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

pub type Result<T> = std::result::Result<T, EditorError>;

/// Unique constraint that rejected a user insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    Username,
    Email,
}

impl Conflict {
    /// Client-facing message for the duplicate
    pub fn message(&self) -> &'static str {
        match self {
            Conflict::Username => "Error: Username is already taken",
            Conflict::Email => "Error: Email is already in use",
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// Role granted to a user. The set is closed and currently has one member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[default]
    #[serde(rename = "ROLE_USER")]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ROLE_USER" => Ok(Role::User),
            other => Err(EditorError::ValidationError(format!("Unknown role: {other}"))),
        }
    }
}

/// Persisted user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,

    /// PHC-formatted Argon2 hash; never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User about to be inserted; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role: Role::default(),
        }
    }
}

// ============================================================================
// Content
// ============================================================================

/// Status assigned to content written without one
pub const DEFAULT_STATUS: &str = "DRAFT";

/// Author-owned content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub status: String,
    pub tags: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Content {
    pub fn is_authored_by(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }
}

/// Writable fields of a content item, already validated
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDraft {
    pub title: String,
    pub body: String,
    pub status: String,
    pub tags: Option<String>,
}

impl ContentDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            status: DEFAULT_STATUS.to_string(),
            tags: None,
        }
    }

    /// Set the status; `None` keeps the default
    pub fn with_status(mut self, status: Option<String>) -> Self {
        if let Some(status) = status {
            self.status = status;
        }
        self
    }

    pub fn with_tags(mut self, tags: Option<String>) -> Self {
        self.tags = tags;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
