//! User repository for database operations
//!
//! PostgreSQL implementation of [`UserStore`]. Passwords and refresh tokens
//! arrive here already hashed; this layer never sees plaintext.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::UserStore;
use crate::core::db::DbError;
use crate::core::db::models::User;

/// User repository error types
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("User not found")]
    NotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<DbError> for UserRepositoryError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionError(e) => UserRepositoryError::DatabaseError(e),
            DbError::MigrationError(e) => {
                UserRepositoryError::DatabaseError(sqlx::Error::Migrate(Box::new(e)))
            }
        }
    }
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, UserRepositoryError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, refresh_token_hash, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(UserRepositoryError::EmailAlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, refresh_token_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, refresh_token_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_refresh_token_hash(
        &self,
        id: Uuid,
        refresh_token_hash: &str,
    ) -> Result<(), UserRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(refresh_token_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserRepositoryError::NotFound);
        }

        Ok(())
    }

    async fn clear_refresh_token_hash(&self, id: Uuid) -> Result<u64, UserRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = NULL
            WHERE id = $1 AND refresh_token_hash IS NOT NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), UserRepositoryError> {
        crate::core::db::pool::health_check(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Error Type Tests
    // ========================================================================

    #[test]
    fn test_user_repository_error_display() {
        assert_eq!(UserRepositoryError::NotFound.to_string(), "User not found");
        assert_eq!(
            UserRepositoryError::EmailAlreadyExists.to_string(),
            "Email already exists"
        );
    }

    #[test]
    fn test_from_db_error() {
        let err: UserRepositoryError = DbError::ConnectionError(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(
            err,
            UserRepositoryError::DatabaseError(sqlx::Error::PoolTimedOut)
        ));
    }

    // ========================================================================
    // Integration Tests (require database)
    // ========================================================================

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_and_find_user() {
        let repo = create_test_repo().await;
        let email = unique_email("create");

        let user = repo.create(&email, "$argon2id$test").await.unwrap();
        assert_eq!(user.email, email);
        assert!(user.refresh_token_hash.is_none());

        let by_email = repo.find_by_email(&email).await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let by_id = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, email);
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_user_duplicate_email() {
        let repo = create_test_repo().await;
        let email = unique_email("duplicate");

        repo.create(&email, "hash").await.unwrap();
        let result = repo.create(&email, "other_hash").await;

        assert!(matches!(
            result,
            Err(UserRepositoryError::EmailAlreadyExists)
        ));
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_refresh_token_hash_lifecycle() {
        let repo = create_test_repo().await;
        let user = repo.create(&unique_email("rt"), "hash").await.unwrap();

        repo.update_refresh_token_hash(user.id, "rt_hash_1")
            .await
            .unwrap();
        repo.update_refresh_token_hash(user.id, "rt_hash_2")
            .await
            .unwrap();
        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token_hash.as_deref(), Some("rt_hash_2"));

        assert_eq!(repo.clear_refresh_token_hash(user.id).await.unwrap(), 1);
        assert_eq!(repo.clear_refresh_token_hash(user.id).await.unwrap(), 0);
        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.refresh_token_hash.is_none());
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_update_refresh_token_hash_missing_user() {
        let repo = create_test_repo().await;

        let result = repo.update_refresh_token_hash(Uuid::new_v4(), "hash").await;
        assert!(matches!(result, Err(UserRepositoryError::NotFound)));
    }

    fn unique_email(prefix: &str) -> String {
        format!("{}_{}@example.com", prefix, &Uuid::new_v4().to_string()[..8])
    }

    // Helper function to create a repository against a migrated test database
    async fn create_test_repo() -> UserRepository {
        use crate::core::config::Config;
        use crate::core::db::pool::create_pool_with_migrations;

        let config = Config::from_env()
            .db_config()
            .expect("DATABASE_URL must be set for tests");
        let pool = create_pool_with_migrations(&config)
            .await
            .expect("Failed to create test pool");
        UserRepository::new(pool)
    }
}
