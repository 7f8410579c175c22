//! Application state management
//!
//! [`AppState::build`] is the single wiring point: it constructs the hasher,
//! token codec, and auth service over whichever stores the caller supplies.

use crate::auth::{AuthService, PasswordError, PasswordHasher, TokenCodec};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use webeditor_core::{AppConfig, Clock, ContentStore, UserStore};

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// User accounts
    pub users: Arc<dyn UserStore>,
    /// Content items
    pub contents: Arc<dyn ContentStore>,
    /// Bearer token codec
    pub tokens: Arc<TokenCodec>,
    /// Signup, login, and profile logic
    pub auth: AuthService,
    /// Server start time
    pub start_time: Instant,
    /// Ready status
    pub is_ready: AtomicBool,
}

impl AppState {
    /// Wire the auth core over the given stores
    ///
    /// Building the hasher also derives its dummy hash, so this does one
    /// Argon2 computation at the configured work factor.
    pub fn build(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        contents: Arc<dyn ContentStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PasswordError> {
        let hasher = Arc::new(PasswordHasher::new(&config.password)?);
        let tokens = Arc::new(TokenCodec::new(&config.auth, clock));
        let auth = AuthService::new(
            Arc::clone(&users),
            Arc::clone(&contents),
            hasher,
            Arc::clone(&tokens),
        );

        Ok(Self {
            config,
            users,
            contents,
            tokens,
            auth,
            start_time: Instant::now(),
            is_ready: AtomicBool::new(true),
        })
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if service is ready
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::SeqCst)
    }

    /// Set ready status
    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::SeqCst);
    }
}
