//! Storage trait definitions for registered users.
//!
//! Defines the async user record interface implemented by the memory, SQLite
//! and PostgreSQL backends.

use crate::errors::StorageError;
use async_trait::async_trait;
use base64::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, StorageError>;

/// A registered end user of the partner platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Opaque identifier assigned at creation
    pub id: String,
    /// Caller-supplied name; uniqueness is not enforced
    pub username: String,
    /// Single-use value passed as OAuth `state`
    pub registration_code: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Build a new record with a fresh id and registration code.
    pub fn new(username: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            registration_code: generate_registration_code(),
            created_at: Utc::now(),
        }
    }
}

/// Trait for storing and removing user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create and persist a new user
    async fn create_user(&self, username: &str) -> Result<UserRecord>;

    /// Retrieve a user by ID
    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>>;

    /// Delete a user; `StorageError::NotFound` if no such user exists
    async fn delete_user(&self, user_id: &str) -> Result<()>;
}

/// 32 bytes from the thread-local CSPRNG, URL-safe base64 without padding.
pub fn generate_registration_code() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.r#gen();
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registration_codes_are_url_safe_and_distinct() {
        let codes: HashSet<String> = (0..256).map(|_| generate_registration_code()).collect();
        assert_eq!(codes.len(), 256);
        for code in &codes {
            assert_eq!(code.len(), 43);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            );
        }
    }

    #[test]
    fn test_new_record_assigns_identity() {
        let first = UserRecord::new("alice");
        let second = UserRecord::new("alice");
        assert_eq!(first.username, "alice");
        assert_ne!(first.id, second.id);
        assert_ne!(first.registration_code, second.registration_code);
        assert!(Uuid::parse_str(&first.id).is_ok());
    }
}
