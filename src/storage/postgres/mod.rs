//! PostgreSQL storage implementations
//!
//! PostgreSQL is suitable for production deployments with several service instances.

mod users;

use crate::errors::StorageError;
use crate::storage::schema::bootstrap_schema;
use sqlx::postgres::PgPool;

pub use users::PostgresUserStore;

pub type Result<T> = std::result::Result<T, StorageError>;

pub async fn connect(database_url: &str) -> Result<PgPool> {
    PgPool::connect(database_url)
        .await
        .map_err(|e| StorageError::ConnectionFailed(format!("PostgreSQL connection failed: {}", e)))
}

impl PostgresUserStore {
    /// Bring the schema up to the current version
    pub async fn migrate(&self) -> Result<()> {
        bootstrap_schema(self).await
    }
}
