//! Database module for local-auth
//!
//! This module provides database connectivity, models, and the credential
//! store used by the auth service, backed by PostgreSQL and SQLx or by an
//! in-process map.

pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used items
pub use models::User;
pub use pool::{DbConfig, DbError, create_pool, create_pool_with_migrations};
pub use repositories::{MemoryUserStore, UserRepository, UserRepositoryError, UserStore};

// Re-export sqlx types that might be needed
pub use sqlx::PgPool;
