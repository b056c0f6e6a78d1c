//! Authentication and authorization utilities
//!
//! Provides:
//! - Credential hashing and verification
//! - Session token generation and validation
//! - Caller context extraction for handlers
//!
//! Callers without a usable session token are redirected to the login
//! endpoint (via `AppError::Unauthenticated`) rather than given a bare 401,
//! preserving the requested path so the flow can resume afterwards.

use crate::errors::{AppError, Result};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Capability required to manage loans (renewals, returns)
pub const SCOPE_MANAGE_LOANS: &str = "loans.manage";

/// Capability required for author/book/copy management forms
pub const SCOPE_MANAGE_CATALOG: &str = "catalog.manage";

/// Extracted caller context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Username, for logging and the "my books" display
    pub username: String,

    /// Scopes/permissions
    pub scopes: Vec<String>,
}

impl AuthContext {
    /// Check if the context has a specific scope
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope) || self.scopes.iter().any(|s| s == "admin")
    }

    /// Require a specific scope, returning error if not present
    pub fn require_scope(&self, scope: &str) -> Result<()> {
        if self.has_scope(scope) {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: format!("Missing required scope: {}", scope),
            })
        }
    }
}

/// Session token claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Username
    pub username: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Scopes
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Session token manager
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl SessionManager {
    /// Create a new session manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    /// Generate a new session token
    pub fn generate_token(
        &self,
        user_id: Uuid,
        username: &str,
        scopes: Vec<String>,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = SessionClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            scopes,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a session token
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidCredentials,
            })
    }
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validate a password against a stored hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password) == stored_hash
}

/// Extract the token from an Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Axum extractor for AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<SessionManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let sessions = Arc::<SessionManager>::from_ref(state);
        let next = parts.uri.path().to_string();

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthenticated { next: next.clone() })?;

        let token = extract_bearer_token(auth_header)
            .ok_or_else(|| AppError::Unauthenticated { next: next.clone() })?;

        // An expired or garbled token reads the same as no session at all
        let claims = sessions
            .validate_token(token)
            .map_err(|_| AppError::Unauthenticated { next: next.clone() })?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthenticated { next })?;

        Ok(AuthContext {
            user_id,
            username: claims.username,
            scopes: claims.scopes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "1X<ISRUkw+tuK";
        let hash = hash_password(password);
        assert!(verify_password(password, &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("abc123"), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_token_roundtrip() {
        let manager = SessionManager::new("test_secret", 3600);

        let user_id = Uuid::new_v4();
        let scopes = vec![SCOPE_MANAGE_LOANS.to_string()];

        let token = manager
            .generate_token(user_id, "librarian", scopes.clone())
            .unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "librarian");
        assert_eq!(claims.scopes, scopes);
    }

    #[test]
    fn test_scope_checks() {
        let ctx = AuthContext {
            user_id: Uuid::new_v4(),
            username: "member".to_string(),
            scopes: vec![],
        };
        assert!(!ctx.has_scope(SCOPE_MANAGE_LOANS));
        assert!(matches!(
            ctx.require_scope(SCOPE_MANAGE_LOANS),
            Err(AppError::Forbidden { .. })
        ));

        let librarian = AuthContext {
            user_id: Uuid::new_v4(),
            username: "librarian".to_string(),
            scopes: vec![SCOPE_MANAGE_LOANS.to_string()],
        };
        assert!(librarian.require_scope(SCOPE_MANAGE_LOANS).is_ok());
        assert!(!librarian.has_scope(SCOPE_MANAGE_CATALOG));
    }

    #[test]
    fn test_admin_scope_implies_all() {
        let admin = AuthContext {
            user_id: Uuid::new_v4(),
            username: "admin".to_string(),
            scopes: vec!["admin".to_string()],
        };
        assert!(admin.has_scope(SCOPE_MANAGE_LOANS));
        assert!(admin.has_scope(SCOPE_MANAGE_CATALOG));
    }
}
