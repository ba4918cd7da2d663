//! In-memory user record storage

use crate::errors::StorageError;
use crate::storage::traits::{Result, UserRecord, UserStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory user store (for testing/development)
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, username: &str) -> Result<UserRecord> {
        let user = UserRecord::new(username);
        let mut users = self
            .users
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let users = self
            .users
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;
        Ok(users.get(user_id).cloned())
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        let mut users = self
            .users
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;
        match users.remove(user_id) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(format!("User not found: {}", user_id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_delete_user() {
        let store = MemoryUserStore::new();

        let user = store.create_user("alice").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(store.get_user(&user.id).await.unwrap(), Some(user.clone()));

        store.delete_user(&user.id).await.unwrap();
        assert_eq!(store.get_user(&user.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_user_is_not_found() {
        let store = MemoryUserStore::new();
        let err = store.delete_user("no-such-user").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_usernames_may_repeat() {
        let store = MemoryUserStore::new();
        let first = store.create_user("bob").await.unwrap();
        let second = store.create_user("bob").await.unwrap();
        assert_ne!(first.id, second.id);
        assert!(store.get_user(&first.id).await.unwrap().is_some());
        assert!(store.get_user(&second.id).await.unwrap().is_some());
    }
}
