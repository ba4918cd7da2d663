//! Schema version detection and bootstrap shared by the SQL backends.

use async_trait::async_trait;

use crate::errors::StorageError;
use crate::storage::traits::Result;

/// Bootstrap gives up after this many read/apply rounds.
const MAX_BOOTSTRAP_ROUNDS: usize = 4;

/// Schema version reported by a database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// No migrations table, or no version row in it
    Absent,
    V1,
    Unknown(i64),
}

impl From<i64> for SchemaVersion {
    fn from(value: i64) -> Self {
        match value {
            1 => SchemaVersion::V1,
            other => SchemaVersion::Unknown(other),
        }
    }
}

/// Backend-specific pieces of schema bootstrap
#[async_trait]
pub trait SchemaMigrator: Send + Sync {
    /// Read the current version, `Absent` when the schema was never initialized
    async fn read_schema_version(&self) -> Result<SchemaVersion>;

    /// Create the v1 schema and record its version, atomically
    async fn apply_initial_schema(&self) -> Result<()>;
}

/// Read the version, apply what is missing, and read again until the schema is current.
pub async fn bootstrap_schema<M: SchemaMigrator + ?Sized>(migrator: &M) -> Result<()> {
    for _ in 0..MAX_BOOTSTRAP_ROUNDS {
        match migrator.read_schema_version().await? {
            SchemaVersion::Absent => {
                tracing::info!("initializing database schema");
                migrator.apply_initial_schema().await?;
            }
            SchemaVersion::V1 => return Ok(()),
            SchemaVersion::Unknown(version) => {
                return Err(StorageError::UnknownSchemaVersion(version));
            }
        }
    }
    Err(StorageError::MigrationStalled(MAX_BOOTSTRAP_ROUNDS))
}
