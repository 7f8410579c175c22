//! Author-only mutation check for content
//!
//! Stores call [`authorize_mutation`] after loading the target row inside
//! their write transaction (or under their write lock), so the check and the
//! write observe the same author.

use crate::{Content, EditorError, Result};

/// Kind of write being attempted on a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Update,
    Delete,
}

impl Mutation {
    fn verb(&self) -> &'static str {
        match self {
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        }
    }
}

/// Message for a content id that does not resolve
pub fn content_not_found(id: i64) -> EditorError {
    EditorError::NotFound(format!("Content not found with id: {id}"))
}

/// Allow the mutation only when `actor_id` authored `content`
pub fn authorize_mutation(content: &Content, actor_id: i64, mutation: Mutation) -> Result<()> {
    if content.is_authored_by(actor_id) {
        return Ok(());
    }

    tracing::debug!(
        content_id = content.id,
        author_id = content.author_id,
        actor_id,
        action = mutation.verb(),
        "Rejected content mutation by non-author"
    );

    Err(EditorError::Forbidden(format!(
        "You are not authorized to {} this content",
        mutation.verb()
    )))
}
