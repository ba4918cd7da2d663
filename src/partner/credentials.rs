//! File-backed partner client credentials.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::errors::CredentialError;
use crate::partner::types::ClientCredentials;

/// Source of the partner client identifier and secret.
///
/// Implementations must not cache; every call reads the backing source.
#[async_trait]
pub trait ClientCredentialStore: Send + Sync {
    async fn read_client_id(&self) -> Result<String, CredentialError>;

    async fn read_client_secret(&self) -> Result<String, CredentialError>;

    async fn read_credentials(&self) -> Result<ClientCredentials, CredentialError> {
        let client_id = self.read_client_id().await?;
        let client_secret = self.read_client_secret().await?;
        Ok(ClientCredentials {
            client_id,
            client_secret,
        })
    }
}

/// Reads each credential from its own file, trimming surrounding whitespace.
#[derive(Debug, Clone)]
pub struct FileClientCredentialStore {
    client_id_path: PathBuf,
    client_secret_path: PathBuf,
}

impl FileClientCredentialStore {
    pub fn new(client_id_path: PathBuf, client_secret_path: PathBuf) -> Self {
        Self {
            client_id_path,
            client_secret_path,
        }
    }

    async fn read_trimmed(path: &Path) -> Result<String, CredentialError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CredentialError::ReadFailed(path.display().to_string(), e))?;
        let value = raw.trim();
        if value.is_empty() {
            return Err(CredentialError::Empty(path.display().to_string()));
        }
        Ok(value.to_string())
    }
}

#[async_trait]
impl ClientCredentialStore for FileClientCredentialStore {
    async fn read_client_id(&self) -> Result<String, CredentialError> {
        Self::read_trimmed(&self.client_id_path).await
    }

    async fn read_client_secret(&self) -> Result<String, CredentialError> {
        Self::read_trimmed(&self.client_secret_path).await
    }
}
