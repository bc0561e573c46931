//! Database models for local-auth
//!
//! This module defines the database entity structs that map to PostgreSQL tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// User Model
// ============================================================================

/// User entity holding local credentials and the active refresh-token digest
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Argon2 digest of the currently valid refresh token; `None` means no active session
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh user record with no active session
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Digest of the live refresh token, if the user has an active session
    pub fn active_session(&self) -> Option<&str> {
        self.refresh_token_hash.as_deref()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_has_no_session() {
        let user = User::new("a@x.com", "$argon2id$v=19$...");

        assert_eq!(user.email, "a@x.com");
        assert!(user.refresh_token_hash.is_none());
        assert!(user.active_session().is_none());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_active_session_exposes_digest() {
        let mut user = User::new("a@x.com", "hash");
        user.refresh_token_hash = Some("rt_digest".to_string());

        assert_eq!(user.active_session(), Some("rt_digest"));
    }

    #[test]
    fn test_new_users_get_distinct_ids() {
        let a = User::new("a@x.com", "hash");
        let b = User::new("a@x.com", "hash");

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_user_serialization_hides_secrets() {
        let mut user = User::new("a@x.com", "secret_password_hash");
        user.refresh_token_hash = Some("secret_refresh_hash".to_string());

        let json = serde_json::to_string(&user).unwrap();

        assert!(json.contains("a@x.com"));
        assert!(!json.contains("secret_password_hash"));
        assert!(!json.contains("secret_refresh_hash"));
        assert!(!json.contains("password_hash"));
    }
}
