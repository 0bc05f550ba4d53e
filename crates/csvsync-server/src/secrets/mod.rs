//! Secret providers
//!
//! A run needs exactly one secret: the storage account key. It is fetched by
//! name through [`SecretProvider`] at the start of every run, so rotated keys
//! are picked up without a restart.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

pub mod keyvault;

pub use keyvault::KeyVaultSecretProvider;

/// Secret retrieval failures. All of them abort the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Secret '{0}' not found")]
    NotFound(String),

    #[error("Secret provider unreachable: {0}")]
    Unreachable(String),

    #[error("Secret provider rejected request for '{name}' with HTTP {status}")]
    Rejected { name: String, status: u16 },

    #[error("Malformed secret response for '{name}': {message}")]
    Malformed { name: String, message: String },
}

/// Returns a string secret by name
#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<String, AuthError>;
}

/// Reads secrets from process environment variables of the same name
#[derive(Debug, Default, Clone)]
pub struct EnvSecretProvider;

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn get_secret(&self, name: &str) -> Result<String, AuthError> {
        std::env::var(name).map_err(|_| AuthError::NotFound(name.to_string()))
    }
}

/// Fixed in-memory secrets. Test helper; never wired by the server binary.
#[derive(Debug, Default, Clone)]
pub struct StaticSecretProvider {
    secrets: HashMap<String, String>,
}

impl StaticSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretProvider for StaticSecretProvider {
    async fn get_secret(&self, name: &str) -> Result<String, AuthError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| AuthError::NotFound(name.to_string()))
    }
}
