//! In-process credential store
//!
//! Backs the service when no `DATABASE_URL` is configured and in tests.
//! Contents are lost on restart.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{UserRepositoryError, UserStore};
use crate::core::db::models::User;

/// `DashMap`-backed user store with a unique email index
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<Uuid, User>,
    emails: DashMap<String, Uuid>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.users.len()
    }

    fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, UserRepositoryError> {
        // The entry guard holds the email slot until the user row exists.
        match self.emails.entry(email.to_string()) {
            Entry::Occupied(_) => Err(UserRepositoryError::EmailAlreadyExists),
            Entry::Vacant(slot) => {
                let user = User::new(email, password_hash);
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let Some(id) = self.emails.get(email).map(|id| *id.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|user| user.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.users.get(&id).map(|user| user.value().clone()))
    }

    async fn update_refresh_token_hash(
        &self,
        id: Uuid,
        refresh_token_hash: &str,
    ) -> Result<(), UserRepositoryError> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or(UserRepositoryError::NotFound)?;
        user.refresh_token_hash = Some(refresh_token_hash.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn clear_refresh_token_hash(&self, id: Uuid) -> Result<u64, UserRepositoryError> {
        let Some(mut user) = self.users.get_mut(&id) else {
            return Ok(0);
        };
        if user.refresh_token_hash.take().is_none() {
            return Ok(0);
        }
        user.updated_at = Utc::now();
        Ok(1)
    }

    async fn health_check(&self) -> Result<(), UserRepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryUserStore::new();

        let user = store.create("a@x.com", "hash").await.unwrap();

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        let by_id = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_id.email, "a@x.com");
        assert!(by_id.refresh_token_hash.is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_find_missing() {
        let store = MemoryUserStore::new();

        assert!(store.find_by_email("nobody@x.com").await.unwrap().is_none());
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryUserStore::new();
        store.create("a@x.com", "hash").await.unwrap();

        let result = store.create("a@x.com", "other").await;

        assert!(matches!(
            result,
            Err(UserRepositoryError::EmailAlreadyExists)
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_signup_creates_one_user() {
        let store = Arc::new(MemoryUserStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create("race@x.com", "hash").await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_overwrites_hash() {
        let store = MemoryUserStore::new();
        let user = store.create("a@x.com", "hash").await.unwrap();

        store.update_refresh_token_hash(user.id, "one").await.unwrap();
        store.update_refresh_token_hash(user.id, "two").await.unwrap();

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token_hash.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let store = MemoryUserStore::new();

        let result = store.update_refresh_token_hash(Uuid::new_v4(), "hash").await;

        assert!(matches!(result, Err(UserRepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = MemoryUserStore::new();
        let user = store.create("a@x.com", "hash").await.unwrap();
        store.update_refresh_token_hash(user.id, "rt").await.unwrap();

        assert_eq!(store.clear_refresh_token_hash(user.id).await.unwrap(), 1);
        assert_eq!(store.clear_refresh_token_hash(user.id).await.unwrap(), 0);
        assert_eq!(
            store.clear_refresh_token_hash(Uuid::new_v4()).await.unwrap(),
            0
        );

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.refresh_token_hash.is_none());
    }
}
