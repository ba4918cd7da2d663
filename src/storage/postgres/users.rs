//! PostgreSQL implementation for user record storage

use crate::errors::StorageError;
use crate::storage::schema::{SchemaMigrator, SchemaVersion};
use crate::storage::traits::{Result, UserRecord, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};

/// PostgreSQL implementation of user storage
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Create a new PostgreSQL user store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &PgRow) -> Result<UserRecord> {
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get created_at: {}", e)))?;

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
impl UserStore for PostgresUserStore {
    async fn create_user(&self, username: &str) -> Result<UserRecord> {
        let user = UserRecord::new(username);

        sqlx::query(
            r#"
            INSERT INTO users (id, username, registration_code, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.registration_code)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
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
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
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
impl SchemaMigrator for PostgresUserStore {
    async fn read_schema_version(&self) -> Result<SchemaVersion> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = 'migrations'
            )
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        if !exists {
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
                key TEXT PRIMARY KEY,
                value BIGINT NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::DatabaseError(format!("Migration failed: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                registration_code TEXT NOT NULL UNIQUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::DatabaseError(format!("Migration failed: {}", e)))?;

        sqlx::query(
            "INSERT INTO migrations (key, value) VALUES ('version', 1) ON CONFLICT (key) DO NOTHING",
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
