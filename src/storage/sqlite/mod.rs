//! SQLite storage implementations
//!
//! SQLite is suitable for single-instance deployments and development.

mod users;

use crate::errors::StorageError;
use crate::storage::schema::bootstrap_schema;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::str::FromStr;

pub use users::SqliteUserStore;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Open (creating if missing) the database at `database_url`.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::ConnectionFailed(format!("Invalid SQLite URL: {}", e)))?
        .create_if_missing(true);

    SqlitePool::connect_with(options)
        .await
        .map_err(|e| StorageError::ConnectionFailed(format!("SQLite connection failed: {}", e)))
}

impl SqliteUserStore {
    /// Bring the schema up to the current version
    pub async fn migrate(&self) -> Result<()> {
        bootstrap_schema(self).await
    }
}
