//! API handlers

pub mod auth;
pub mod contents;
pub mod health;
