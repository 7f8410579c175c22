//! Test utilities
//!
//! Builds the full router over an in-memory store with a fast password
//! work factor, so integration tests need no database.

use crate::create_router;
use crate::state::AppState;
use axum::Router;
use std::sync::Arc;
use webeditor_core::{AppConfig, Clock, MemoryStore, PasswordConfig, SystemClock};

/// Signing secret used by every test router
pub const TEST_JWT_SECRET: &str = "webeditor-test-secret-0123456789abcdef";

/// Configuration with a valid secret and the cheapest Argon2 parameters
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    config.password = PasswordConfig {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    };
    config
}

/// State over a fresh in-memory store, driven by the given clock
pub fn create_state_with_clock(clock: Arc<dyn Clock>) -> Arc<AppState> {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::build(test_config(), store.clone(), store, clock)
        .expect("test password parameters are valid");
    Arc::new(state)
}

/// State over a fresh in-memory store and the wall clock
pub fn create_state_for_testing() -> Arc<AppState> {
    create_state_with_clock(Arc::new(SystemClock))
}

/// Router over a fresh in-memory store and the wall clock
pub fn create_router_for_testing() -> Router {
    create_router(create_state_for_testing())
}
