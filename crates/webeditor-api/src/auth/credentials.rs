//! Username and password verification
//!
//! Argon2 work runs on tokio's blocking pool. An unknown username still pays
//! for one verification against the hasher's dummy hash.

use super::password::PasswordHasher;
use std::sync::Arc;
use thiserror::Error;
use webeditor_core::{EditorError, User, UserStore};

/// Why a credential check did not produce a principal
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Unknown user")]
    UnknownUser,

    #[error("Password does not match")]
    BadPassword,

    #[error("User lookup failed: {0}")]
    Store(#[from] EditorError),

    #[error("Password worker failed: {0}")]
    Worker(String),
}

/// Resolves (username, password) pairs to users
pub struct CredentialVerifier {
    users: Arc<dyn UserStore>,
    hasher: Arc<PasswordHasher>,
}

impl CredentialVerifier {
    pub fn new(users: Arc<dyn UserStore>, hasher: Arc<PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    pub async fn verify(&self, username: &str, password: &str) -> Result<User, CredentialError> {
        let user = self.users.find_by_username(username).await?;

        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();

        let Some(user) = user else {
            tokio::task::spawn_blocking(move || hasher.verify_dummy(&password))
                .await
                .map_err(|e| CredentialError::Worker(e.to_string()))?;
            return Err(CredentialError::UnknownUser);
        };

        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| CredentialError::Worker(e.to_string()))?;

        if matches {
            Ok(user)
        } else {
            Err(CredentialError::BadPassword)
        }
    }
}
