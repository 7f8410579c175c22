//! PostgreSQL store
//!
//! Users and content live in two tables created by the embedded migrations.
//! Content mutations lock the target row (`FOR UPDATE`) and run the ownership
//! check inside the same transaction as the write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, QueryBuilder};

use super::{ContentFilter, ContentStore, UserStore};
use crate::guard::{authorize_mutation, content_not_found, Mutation};
use crate::{
    Conflict, Content, ContentDraft, DatabaseConfig, EditorError, NewUser, Page, PageRequest,
    Result, User,
};

/// Column list shared by every content read; joins the author for the username
macro_rules! content_select {
    () => {
        "SELECT c.id, c.title, c.body, c.status, c.tags, c.author_id, \
         u.username AS author_username, c.created_at, c.updated_at \
         FROM contents c JOIN users u ON u.id = c.author_id"
    };
}

const USER_COLUMNS: &str = "id, username, email, password, role, created_at, updated_at";

/// PostgreSQL-backed user and content store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a pool sized from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| EditorError::DatabaseError(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| EditorError::DatabaseError(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> EditorError {
    move |e| EditorError::DatabaseError(format!("{context}: {e}"))
}

/// Map a unique violation on the users table to the matching conflict
fn classify_user_insert(e: sqlx::Error) -> EditorError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            match db.constraint() {
                Some("users_username_key") => return EditorError::Conflict(Conflict::Username),
                Some("users_email_key") => return EditorError::Conflict(Conflict::Email),
                _ => {}
            }
        }
    }
    EditorError::DatabaseError(format!("Failed to insert user: {e}"))
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = EditorError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password,
            role: row.role.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ContentRow {
    id: i64,
    title: String,
    body: String,
    status: String,
    tags: Option<String>,
    author_id: i64,
    author_username: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContentRow> for Content {
    fn from(row: ContentRow) -> Self {
        Content {
            id: row.id,
            title: row.title,
            body: row.body,
            status: row.status,
            tags: row.tags,
            author_id: row.author_id,
            author_username: row.author_username,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, email, password, role) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(classify_user_insert)?;

        tracing::debug!(user_id = row.id, username = %row.username, "User inserted");
        row.try_into()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get user by username"))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let row =
            sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to get user by id"))?;

        row.map(User::try_from).transpose()
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to check username"))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to check email"))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error("Database ping failed"))?;
        Ok(())
    }
}

/// Append the WHERE clause for a listing filter
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ContentFilter) {
    match filter {
        ContentFilter::All => {}
        ContentFilter::Author(author_id) => {
            builder.push(" WHERE c.author_id = ").push_bind(*author_id);
        }
        ContentFilter::Status(status) => {
            builder.push(" WHERE c.status = ").push_bind(status.clone());
        }
        ContentFilter::AuthorAndStatus(author_id, status) => {
            builder
                .push(" WHERE c.author_id = ")
                .push_bind(*author_id)
                .push(" AND c.status = ")
                .push_bind(status.clone());
        }
        ContentFilter::TitleContains(keyword) => {
            // strpos keeps LIKE wildcards in the keyword literal
            builder
                .push(" WHERE strpos(c.title, ")
                .push_bind(keyword.clone())
                .push(") > 0");
        }
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn insert(&self, author_id: i64, draft: ContentDraft) -> Result<Content> {
        let row = sqlx::query_as::<_, ContentRow>(
            "WITH inserted AS ( \
                 INSERT INTO contents (title, body, status, tags, author_id) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, title, body, status, tags, author_id, created_at, updated_at \
             ) \
             SELECT i.id, i.title, i.body, i.status, i.tags, i.author_id, \
                    u.username AS author_username, i.created_at, i.updated_at \
             FROM inserted i JOIN users u ON u.id = i.author_id",
        )
        .bind(&draft.title)
        .bind(&draft.body)
        .bind(&draft.status)
        .bind(&draft.tags)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create content"))?;

        tracing::debug!(content_id = row.id, author_id, "Content created");
        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Content>> {
        let row = sqlx::query_as::<_, ContentRow>(concat!(content_select!(), " WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get content"))?;

        Ok(row.map(Content::from))
    }

    async fn update(&self, id: i64, actor_id: i64, draft: ContentDraft) -> Result<Content> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let current: Content = sqlx::query_as::<_, ContentRow>(concat!(
            content_select!(),
            " WHERE c.id = $1 FOR UPDATE OF c"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock content"))?
        .ok_or_else(|| content_not_found(id))?
        .into();

        authorize_mutation(&current, actor_id, Mutation::Update)?;

        let row = sqlx::query_as::<_, ContentRow>(
            "UPDATE contents c \
             SET title = $2, body = $3, status = $4, tags = $5, updated_at = NOW() \
             FROM users u \
             WHERE c.id = $1 AND u.id = c.author_id \
             RETURNING c.id, c.title, c.body, c.status, c.tags, c.author_id, \
                       u.username AS author_username, c.created_at, c.updated_at",
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.body)
        .bind(&draft.status)
        .bind(&draft.tags)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to update content"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit content update"))?;

        tracing::debug!(content_id = id, actor_id, "Content updated");
        Ok(row.into())
    }

    async fn delete(&self, id: i64, actor_id: i64) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let current: Content = sqlx::query_as::<_, ContentRow>(concat!(
            content_select!(),
            " WHERE c.id = $1 FOR UPDATE OF c"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock content"))?
        .ok_or_else(|| content_not_found(id))?
        .into();

        authorize_mutation(&current, actor_id, Mutation::Delete)?;

        sqlx::query("DELETE FROM contents WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete content"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit content delete"))?;

        tracing::debug!(content_id = id, actor_id, "Content deleted");
        Ok(())
    }

    async fn find_page(
        &self,
        filter: &ContentFilter,
        request: &PageRequest,
    ) -> Result<Page<Content>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM contents c");
        push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count contents"))?;

        let direction = request.direction().as_sql();
        let mut select = QueryBuilder::<Postgres>::new(content_select!());
        push_filter(&mut select, filter);
        // Column names come from the SortField whitelist; id breaks ties
        select.push(format!(
            " ORDER BY c.{} {direction}, c.id {direction}",
            request.sort().column()
        ));
        select
            .push(" LIMIT ")
            .push_bind(request.limit())
            .push(" OFFSET ")
            .push_bind(request.offset());

        let rows: Vec<ContentRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list contents"))?;

        let items = rows.into_iter().map(Content::from).collect();
        Ok(Page::new(
            items,
            u64::try_from(total).unwrap_or_default(),
            request,
        ))
    }

    async fn count_by_author(&self, author_id: i64) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contents WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count contents by author"))?;

        Ok(u64::try_from(total).unwrap_or_default())
    }
}
