//! Authentication service layer
//!
//! Provides the business logic behind signup, login, and the current-user
//! profile. Request bodies are validated here, passwords go through the
//! Argon2 hasher on the blocking pool, and tokens come from the codec.

use super::credentials::{CredentialError, CredentialVerifier};
use super::jwt::TokenCodec;
use super::middleware::AuthenticatedUser;
use super::password::PasswordHasher;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};
use webeditor_core::{Conflict, ContentStore, EditorError, NewUser, Role, UserStore};

/// Rejects empty and whitespace-only strings
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct SignupRequest {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub username: String,

    #[serde(default)]
    #[validate(
        email(message = "must be a well-formed email address"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub email: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Issued bearer token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JwtResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub username: String,
    pub email: String,
}

/// Single-message response body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Current user profile
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[schema(value_type = String, example = "ROLE_USER")]
    pub role: Role,
    pub content_count: u64,
}

/// Authentication service
pub struct AuthService {
    users: Arc<dyn UserStore>,
    contents: Arc<dyn ContentStore>,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenCodec>,
    verifier: CredentialVerifier,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        contents: Arc<dyn ContentStore>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenCodec>,
    ) -> Self {
        let verifier = CredentialVerifier::new(Arc::clone(&users), Arc::clone(&hasher));
        Self {
            users,
            contents,
            hasher,
            tokens,
            verifier,
        }
    }

    /// Register a new user
    ///
    /// # Arguments
    ///
    /// * `request` - Registration details
    ///
    /// # Returns
    ///
    /// * `Ok(MessageResponse)` - User created with `ROLE_USER`
    /// * `Err(AppError)` - Invalid input, or username/email already taken
    pub async fn signup(&self, request: SignupRequest) -> Result<MessageResponse, AppError> {
        request.validate()?;

        // Advisory checks; the unique constraints decide races
        if self.users.exists_by_username(&request.username).await? {
            return Err(EditorError::Conflict(Conflict::Username).into());
        }
        if self.users.exists_by_email(&request.email).await? {
            return Err(EditorError::Conflict(Conflict::Email).into());
        }

        let hasher = Arc::clone(&self.hasher);
        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password worker failed: {e}")))?
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let user = self
            .users
            .insert(NewUser::new(request.username, request.email, password_hash))
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(MessageResponse::new("User registered successfully"))
    }

    /// Login with username and password
    ///
    /// Unknown users and wrong passwords produce the same
    /// `AppError::Unauthenticated`.
    pub async fn login(&self, request: LoginRequest) -> Result<JwtResponse, AppError> {
        let user = match self
            .verifier
            .verify(&request.username, &request.password)
            .await
        {
            Ok(user) => user,
            Err(CredentialError::Store(e)) => return Err(e.into()),
            Err(CredentialError::Worker(e)) => {
                return Err(AppError::Internal(format!("Password worker failed: {e}")))
            }
            Err(e) => {
                tracing::debug!(reason = %e, "Login rejected");
                return Err(AppError::Unauthenticated);
            }
        };

        let token = self
            .tokens
            .issue(&user.username)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(JwtResponse {
            token,
            token_type: "Bearer".to_string(),
            username: user.username,
            email: user.email,
        })
    }

    /// Profile of the authenticated principal with their content count
    pub async fn me(&self, principal: &AuthenticatedUser) -> Result<UserInfo, AppError> {
        let content_count = self.contents.count_by_author(principal.id).await?;

        Ok(UserInfo {
            id: principal.id,
            username: principal.username.clone(),
            email: principal.email.clone(),
            role: principal.role,
            content_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webeditor_core::{AuthConfig, MemoryStore, PasswordConfig, SystemClock};

    fn service() -> AuthService {
        let store = Arc::new(MemoryStore::new());
        let hasher = Arc::new(
            PasswordHasher::new(&PasswordConfig {
                memory_cost: 1024,
                time_cost: 1,
                parallelism: 1,
            })
            .unwrap(),
        );
        let tokens = Arc::new(TokenCodec::new(
            &AuthConfig {
                jwt_secret: "test-secret-0123456789abcdef0123456789".to_string(),
                token_lifetime_secs: 3600,
            },
            Arc::new(SystemClock),
        ));
        AuthService::new(store.clone(), store, hasher, tokens)
    }

    fn signup(username: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_signup_validation() {
        assert!(signup("alice", "alice@x.io", "pw").validate().is_ok());
        assert!(signup("", "alice@x.io", "pw").validate().is_err());
        assert!(signup("   ", "alice@x.io", "pw").validate().is_err());
        assert!(signup("alice", "not-an-email", "pw").validate().is_err());
        assert!(signup("alice", "alice@x.io", "").validate().is_err());
    }

    #[tokio::test]
    async fn test_signup_then_login_issues_token_for_username() {
        let service = service();
        let message = service
            .signup(signup("alice", "alice@x.io", "s3cret"))
            .await
            .unwrap();
        assert_eq!(message.message, "User registered successfully");

        let response = service
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "s3cret".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.email, "alice@x.io");
        assert_eq!(service.tokens.subject_of(&response.token).unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_duplicate_signup_messages() {
        let service = service();
        service
            .signup(signup("alice", "alice@x.io", "pw"))
            .await
            .unwrap();

        let err = service
            .signup(signup("alice", "other@x.io", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Error: Username is already taken"));

        let err = service
            .signup(signup("bob", "alice@x.io", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Error: Email is already in use"));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service
            .signup(signup("alice", "alice@x.io", "pw"))
            .await
            .unwrap();

        let wrong_password = service
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_user = service
            .login(LoginRequest {
                username: "ghost".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::Unauthenticated));
        assert!(matches!(unknown_user, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_stored_password_is_hashed() {
        let service = service();
        service
            .signup(signup("alice", "alice@x.io", "plain-text-pw"))
            .await
            .unwrap();

        let user = service.users.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "plain-text-pw");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }
}
