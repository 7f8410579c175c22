//! In-process store
//!
//! Holds users and content behind one `RwLock`, enforcing the same unique
//! constraints and ownership checks as [`PgStore`](super::PgStore). A write
//! lock spans each check-then-write, so it plays the role of the row lock.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{ContentFilter, ContentStore, UserStore};
use crate::guard::{authorize_mutation, content_not_found, Mutation};
use crate::{
    Conflict, Content, ContentDraft, EditorError, NewUser, Page, PageRequest, Result,
    SortDirection, SortField, User,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    contents: BTreeMap<i64, Content>,
    last_user_id: i64,
    last_content_id: i64,
}

/// Memory-backed user and content store
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentFilter {
    fn matches(&self, content: &Content) -> bool {
        match self {
            ContentFilter::All => true,
            ContentFilter::Author(author_id) => content.author_id == *author_id,
            ContentFilter::Status(status) => content.status == *status,
            ContentFilter::AuthorAndStatus(author_id, status) => {
                content.author_id == *author_id && content.status == *status
            }
            ContentFilter::TitleContains(keyword) => content.title.contains(keyword.as_str()),
        }
    }
}

fn compare(a: &Content, b: &Content, field: SortField) -> Ordering {
    let primary = match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Title => a.title.cmp(&b.title),
        SortField::Status => a.status.cmp(&b.status),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(EditorError::Conflict(Conflict::Username));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(EditorError::Conflict(Conflict::Email));
        }

        tables.last_user_id += 1;
        let now = Utc::now();
        let stored = User {
            id: tables.last_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(stored.id, stored.clone());

        tracing::debug!(user_id = stored.id, username = %stored.username, "User inserted");
        Ok(stored)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|u| u.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|u| u.email == email))
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn insert(&self, author_id: i64, draft: ContentDraft) -> Result<Content> {
        let mut tables = self.tables.write().await;

        let author_username = tables
            .users
            .get(&author_id)
            .map(|u| u.username.clone())
            .ok_or_else(|| EditorError::NotFound(format!("User not found with id: {author_id}")))?;

        tables.last_content_id += 1;
        let now = Utc::now();
        let content = Content {
            id: tables.last_content_id,
            title: draft.title,
            body: draft.body,
            status: draft.status,
            tags: draft.tags,
            author_id,
            author_username,
            created_at: now,
            updated_at: now,
        };
        tables.contents.insert(content.id, content.clone());

        tracing::debug!(content_id = content.id, author_id, "Content created");
        Ok(content)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Content>> {
        Ok(self.tables.read().await.contents.get(&id).cloned())
    }

    async fn update(&self, id: i64, actor_id: i64, draft: ContentDraft) -> Result<Content> {
        let mut tables = self.tables.write().await;
        let content = tables
            .contents
            .get_mut(&id)
            .ok_or_else(|| content_not_found(id))?;

        authorize_mutation(content, actor_id, Mutation::Update)?;

        content.title = draft.title;
        content.body = draft.body;
        content.status = draft.status;
        content.tags = draft.tags;
        content.updated_at = Utc::now().max(content.created_at);

        tracing::debug!(content_id = id, actor_id, "Content updated");
        Ok(content.clone())
    }

    async fn delete(&self, id: i64, actor_id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        let content = tables.contents.get(&id).ok_or_else(|| content_not_found(id))?;

        authorize_mutation(content, actor_id, Mutation::Delete)?;
        tables.contents.remove(&id);

        tracing::debug!(content_id = id, actor_id, "Content deleted");
        Ok(())
    }

    async fn find_page(
        &self,
        filter: &ContentFilter,
        request: &PageRequest,
    ) -> Result<Page<Content>> {
        let tables = self.tables.read().await;

        let mut matching: Vec<&Content> = tables
            .contents
            .values()
            .filter(|c| filter.matches(c))
            .collect();
        matching.sort_by(|a, b| {
            let ordering = compare(a, b, request.sort());
            match request.direction() {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(request.size() as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, total, request))
    }

    async fn count_by_author(&self, author_id: i64) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .contents
            .values()
            .filter(|c| c.author_id == author_id)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    async fn with_users(names: &[&str]) -> (MemoryStore, Vec<User>) {
        let store = MemoryStore::new();
        let mut users = Vec::new();
        for name in names {
            let user = UserStore::insert(&store, NewUser::new(*name, format!("{name}@x.io"), "hash"))
                .await
                .unwrap();
            users.push(user);
        }
        (store, users)
    }

    fn request(page: u32, size: u32) -> PageRequest {
        PageRequest::new(page, size, SortField::Id, SortDirection::Asc).unwrap()
    }

    #[tokio::test]
    async fn test_user_ids_are_monotonic() {
        let (_, users) = with_users(&["alice", "bob"]).await;
        assert!(users[0].id < users[1].id);
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_rejected() {
        let (store, _) = with_users(&["alice"]).await;

        let err = UserStore::insert(&store, NewUser::new("alice", "other@x.io", "h"))
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Conflict(Conflict::Username)));

        let err = UserStore::insert(&store, NewUser::new("alice2", "alice@x.io", "h"))
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Conflict(Conflict::Email)));
    }

    #[tokio::test]
    async fn test_username_lookup_is_case_sensitive() {
        let (store, _) = with_users(&["alice"]).await;
        assert!(store.find_by_username("alice").await.unwrap().is_some());
        assert!(store.find_by_username("Alice").await.unwrap().is_none());
        assert!(!store.exists_by_username("ALICE").await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_signup_has_one_winner() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                UserStore::insert(store.as_ref(), NewUser::new("racer", format!("r{i}@x.io"), "h"))
                    .await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(e) => assert!(matches!(e, EditorError::Conflict(Conflict::Username))),
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_non_author_cannot_update_or_delete() {
        let (store, users) = with_users(&["alice", "bob"]).await;
        let (alice, bob) = (&users[0], &users[1]);

        let content = ContentStore::insert(&store, alice.id, ContentDraft::new("Mine", "body"))
            .await
            .unwrap();
        assert_eq!(content.author_username, "alice");
        assert_eq!(content.status, "DRAFT");

        let err = store
            .update(content.id, bob.id, ContentDraft::new("Hijacked", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Forbidden(_)));

        let err = store.delete(content.id, bob.id).await.unwrap_err();
        assert!(matches!(err, EditorError::Forbidden(_)));

        let unchanged = ContentStore::find_by_id(&store, content.id).await.unwrap().unwrap();
        assert_eq!(unchanged, content);
    }

    #[tokio::test]
    async fn test_author_update_keeps_author_and_advances_timestamp() {
        let (store, users) = with_users(&["alice"]).await;
        let content = ContentStore::insert(&store, users[0].id, ContentDraft::new("v1", "body"))
            .await
            .unwrap();

        let updated = store
            .update(
                content.id,
                users[0].id,
                ContentDraft::new("v2", "body").with_status(Some("PUBLISHED".into())),
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "v2");
        assert_eq!(updated.status, "PUBLISHED");
        assert_eq!(updated.author_id, users[0].id);
        assert_eq!(updated.created_at, content.created_at);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn test_missing_content_is_not_found() {
        let (store, users) = with_users(&["alice"]).await;

        let err = store
            .update(99, users[0].id, ContentDraft::new("t", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::NotFound(_)));

        let err = store.delete(99, users[0].id).await.unwrap_err();
        assert_eq!(err.to_string(), "Content not found with id: 99");
    }

    #[tokio::test]
    async fn test_delete_removes_content() {
        let (store, users) = with_users(&["alice"]).await;
        let content = ContentStore::insert(&store, users[0].id, ContentDraft::new("t", "b"))
            .await
            .unwrap();

        store.delete(content.id, users[0].id).await.unwrap();
        assert!(ContentStore::find_by_id(&store, content.id).await.unwrap().is_none());
        assert_eq!(store.count_by_author(users[0].id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pages_partition_result_set() {
        let (store, users) = with_users(&["alice"]).await;
        for i in 0..15 {
            ContentStore::insert(&store, users[0].id, ContentDraft::new(format!("Post {i}"), "b"))
                .await
                .unwrap();
        }

        let first = store.find_page(&ContentFilter::All, &request(0, 10)).await.unwrap();
        let second = store.find_page(&ContentFilter::All, &request(1, 10)).await.unwrap();
        let beyond = store.find_page(&ContentFilter::All, &request(2, 10)).await.unwrap();

        assert_eq!(first.items.len(), 10);
        assert_eq!(second.items.len(), 5);
        assert!(beyond.items.is_empty());
        assert_eq!(first.total_elements, 15);
        assert_eq!(first.total_pages, 2);

        let ids: HashSet<i64> = first.items.iter().chain(&second.items).map(|c| c.id).collect();
        assert_eq!(ids.len(), 15);
    }

    #[tokio::test]
    async fn test_sort_direction_and_field() {
        let (store, users) = with_users(&["alice"]).await;
        for title in ["banana", "apple", "cherry"] {
            ContentStore::insert(&store, users[0].id, ContentDraft::new(title, "b"))
                .await
                .unwrap();
        }

        let by_title = PageRequest::new(0, 10, SortField::Title, SortDirection::Asc).unwrap();
        let page = store.find_page(&ContentFilter::All, &by_title).await.unwrap();
        let titles: Vec<&str> = page.items.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["apple", "banana", "cherry"]);

        let newest_first = PageRequest::new(0, 10, SortField::Id, SortDirection::Desc).unwrap();
        let page = store.find_page(&ContentFilter::All, &newest_first).await.unwrap();
        assert!(page.items.windows(2).all(|w| w[0].id > w[1].id));
    }

    #[tokio::test]
    async fn test_filters() {
        let (store, users) = with_users(&["alice", "bob"]).await;
        let (alice, bob) = (users[0].id, users[1].id);

        ContentStore::insert(&store, alice, ContentDraft::new("Rust notes", "b"))
            .await
            .unwrap();
        ContentStore::insert(
            &store,
            alice,
            ContentDraft::new("Release plan", "b").with_status(Some("PUBLISHED".into())),
        )
        .await
        .unwrap();
        ContentStore::insert(&store, bob, ContentDraft::new("rust tips", "b"))
            .await
            .unwrap();

        let total = |filter: ContentFilter| {
            let store = &store;
            async move {
                store
                    .find_page(&filter, &request(0, 10))
                    .await
                    .unwrap()
                    .total_elements
            }
        };

        assert_eq!(total(ContentFilter::All).await, 3);
        assert_eq!(total(ContentFilter::Author(alice)).await, 2);
        assert_eq!(total(ContentFilter::Status("DRAFT".into())).await, 2);
        assert_eq!(
            total(ContentFilter::AuthorAndStatus(alice, "PUBLISHED".into())).await,
            1
        );
        assert_eq!(total(ContentFilter::TitleContains("Rust".into())).await, 1);
        assert_eq!(total(ContentFilter::TitleContains("%".into())).await, 0);
        assert_eq!(store.count_by_author(alice).await.unwrap(), 2);
    }
}
