//! SQLite implementation for user record storage

use crate::errors::StorageError;
use crate::storage::schema::{SchemaMigrator, SchemaVersion};
use crate::storage::traits::{Result, UserRecord, UserStore};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

/// SQLite implementation of user storage
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Create a new SQLite user store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Convert SQLite row to UserRecord
    fn row_to_user(row: &SqliteRow) -> Result<UserRecord> {
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get created_at: {}", e)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| StorageError::InvalidData(format!("Invalid created_at timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(UserRecord {
            id: row
                .try_get("id")
                .map_err(|e| StorageError::DatabaseError(format!("Failed to get id: {}", e)))?,
            username: row.try_get("username").map_err(|e| {
                StorageError::DatabaseError(format!("Failed to get username: {}", e))
            })?,
            registration_code: row.try_get("registration_code").map_err(|e| {
                StorageError::DatabaseError(format!("Failed to get registration_code: {}", e))
            })?,
            created_at,
        })
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create_user(&self, username: &str) -> Result<UserRecord> {
        let user = UserRecord::new(username);

        sqlx::query(
            r#"
            INSERT INTO users (id, username, registration_code, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.registration_code)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("User not found: {}", user_id)));
        }

        Ok(())
    }
}

#[async_trait]
impl SchemaMigrator for SqliteUserStore {
    async fn read_schema_version(&self) -> Result<SchemaVersion> {
        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'migrations'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        if tables == 0 {
            return Ok(SchemaVersion::Absent);
        }

        let version: Option<i64> =
            sqlx::query_scalar("SELECT value FROM migrations WHERE key = 'version'")
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(version.map(SchemaVersion::from).unwrap_or(SchemaVersion::Absent))
    }

    async fn apply_initial_schema(&self) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS migrations (
                key TEXT PRIMARY KEY NOT NULL,
                value INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::DatabaseError(format!("Migration failed: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY NOT NULL,
                username TEXT NOT NULL,
                registration_code TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::DatabaseError(format!("Migration failed: {}", e)))?;

        sqlx::query(
            "INSERT INTO migrations (key, value) VALUES ('version', 1) ON CONFLICT(key) DO NOTHING",
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::DatabaseError(format!("Migration failed: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
