//! Blob storage
//!
//! The pipeline talks to storage only through [`BlobStore`]: list, read and
//! write objects addressed by container (bucket) and path (key).
//!
//! - [`s3::S3BlobStore`]: S3-compatible object storage (AWS, MinIO)
//! - [`memory::MemoryBlobStore`]: in-process test double; the server binary never wires it
//!
//! Stores are created per run by a [`BlobStoreConnector`] once the storage key
//! has been resolved from the secret provider.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub mod config;
pub mod memory;
pub mod s3;

pub use memory::MemoryBlobStore;
pub use s3::{S3BlobStore, S3Connector};

/// Errors from blob store operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Object not found: {container}/{path}")]
    NotFound { container: String, path: String },

    #[error("Object already exists: {container}/{path}")]
    AlreadyExists { container: String, path: String },

    #[error("Storage IO error on {container}/{path}: {message}")]
    Io {
        container: String,
        path: String,
        message: String,
    },

    #[error("Failed to connect to storage: {0}")]
    Connect(String),
}

impl StorageError {
    pub fn io(container: &str, path: &str, message: impl Into<String>) -> Self {
        Self::Io {
            container: container.to_string(),
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(container: &str, path: &str) -> Self {
        Self::NotFound {
            container: container.to_string(),
            path: path.to_string(),
        }
    }
}

/// Container + path addressed object storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// List every object path in `container` that starts with `prefix`, in
    /// the order the backend returns them.
    async fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Read a whole object.
    async fn read_all(&self, container: &str, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a whole object. With `overwrite = false` an existing object is
    /// left untouched and [`StorageError::AlreadyExists`] is returned.
    async fn write(
        &self,
        container: &str,
        path: &str,
        content: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), StorageError>;
}

/// Account identity plus the secret key resolved for this run
#[derive(Clone)]
pub struct StorageCredentials {
    pub account: String,
    pub key: String,
}

impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("account", &self.account)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Builds a [`BlobStore`] from credentials
#[async_trait]
pub trait BlobStoreConnector: Send + Sync {
    async fn connect(
        &self,
        credentials: StorageCredentials,
    ) -> Result<Arc<dyn BlobStore>, StorageError>;
}

/// Connector that always hands out the same store, ignoring credentials.
///
/// Test helper for driving the router against a [`MemoryBlobStore`].
pub struct FixedConnector {
    store: Arc<dyn BlobStore>,
}

impl FixedConnector {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BlobStoreConnector for FixedConnector {
    async fn connect(
        &self,
        _credentials: StorageCredentials,
    ) -> Result<Arc<dyn BlobStore>, StorageError> {
        Ok(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_key() {
        let credentials = StorageCredentials {
            account: "acct".to_string(),
            key: "super-secret".to_string(),
        };

        let printed = format!("{:?}", credentials);
        assert!(printed.contains("acct"));
        assert!(!printed.contains("super-secret"));
    }

    #[test]
    fn test_error_messages_name_the_object() {
        let err = StorageError::not_found("raw", "inbox/a.csv");
        assert_eq!(err.to_string(), "Object not found: raw/inbox/a.csv");

        let err = StorageError::io("raw", "inbox/a.csv", "timeout");
        assert!(err.to_string().contains("timeout"));
    }
}
