//! JWT token issuance and validation
//!
//! Tokens are compact HS256 JWS values carrying `{sub, iat, exp}`. Expiry is
//! checked against the injected [`Clock`] with no leeway, and any header
//! declaring an algorithm other than HS256 is refused before the signature
//! is looked at.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use webeditor_core::{AuthConfig, Clock};

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - username
    pub sub: String,
    /// Issued at timestamp (Unix epoch seconds)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,
}

/// Reasons a token is refused
///
/// All kinds collapse to the same 401 outward; they are kept apart for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Unsupported token algorithm")]
    UnsupportedAlgorithm,

    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

/// Signs and checks bearer tokens with the service secret
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime_secs: i64,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // exp is compared against the injected clock in `validate`
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            lifetime_secs: i64::try_from(config.token_lifetime_secs).unwrap_or(i64::MAX),
            clock,
        }
    }

    /// Issue a token for `username`, valid from now for the configured lifetime
    pub fn issue(&self, username: &str) -> Result<String, TokenError> {
        let now = self.clock.now().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            iat: now,
            exp: now.saturating_add(self.lifetime_secs),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Check algorithm, signature and expiry, returning the claims
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - Token is authentic and `now < exp`
    /// * `Err(TokenError)` - Which check refused the token
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let header = decode_header(token).map_err(|_| {
            if declares_foreign_algorithm(token) {
                TokenError::UnsupportedAlgorithm
            } else {
                TokenError::Malformed
            }
        })?;
        if header.alg != Algorithm::HS256 {
            return Err(TokenError::UnsupportedAlgorithm);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::InvalidAlgorithm => TokenError::UnsupportedAlgorithm,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }

    /// Username carried by a valid token
    pub fn subject_of(&self, token: &str) -> Result<String, TokenError> {
        self.validate(token).map(|claims| claims.sub)
    }
}

/// True when the header segment is JSON naming an `alg` the codec cannot
/// represent (for example `none`)
fn declares_foreign_algorithm(token: &str) -> bool {
    let Some(segment) = token.split('.').next() else {
        return false;
    };
    let Ok(raw) = URL_SAFE_NO_PAD.decode(segment) else {
        return false;
    };
    let Ok(header) = serde_json::from_slice::<serde_json::Value>(&raw) else {
        return false;
    };

    header
        .get("alg")
        .and_then(|alg| alg.as_str())
        .is_some_and(|alg| alg != "HS256")
}
