//! Credential store repositories
//!
//! The auth service talks to persistence only through [`UserStore`], so the
//! PostgreSQL repository and the in-process store are interchangeable.

pub mod memory;
pub mod user;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::db::models::User;

pub use memory::MemoryUserStore;
pub use user::{UserRepository, UserRepositoryError};

/// Persistence operations over the `users` table
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user with no active session.
    ///
    /// Fails with [`UserRepositoryError::EmailAlreadyExists`] when the email is taken.
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, UserRepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError>;

    /// Overwrite the stored refresh-token digest unconditionally
    async fn update_refresh_token_hash(
        &self,
        id: Uuid,
        refresh_token_hash: &str,
    ) -> Result<(), UserRepositoryError>;

    /// Clear the refresh-token digest if one is set.
    ///
    /// Returns the number of rows changed; zero is not an error.
    async fn clear_refresh_token_hash(&self, id: Uuid) -> Result<u64, UserRepositoryError>;

    async fn health_check(&self) -> Result<(), UserRepositoryError>;
}
