//! Authentication and authorization module
//!
//! This module provides bearer-token authentication with the following components:
//! - Token issuance and validation
//! - Password hashing with Argon2id
//! - Credential verification against the user store
//! - Middleware binding the request principal
//! - Authentication service for signup, login, and profile

pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use credentials::{CredentialError, CredentialVerifier};
pub use jwt::{Claims, TokenCodec, TokenError};
pub use middleware::{auth_middleware, optional_auth_middleware, AuthError, AuthenticatedUser};
pub use password::{PasswordError, PasswordHasher};
pub use service::{
    AuthService, JwtResponse, LoginRequest, MessageResponse, SignupRequest, UserInfo,
};
