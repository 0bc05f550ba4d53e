//! Configuration management
//!
//! Everything the server needs is read once at startup into [`Config`] and
//! handed to the trigger handler explicitly. Nothing below the API layer
//! looks at the environment.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::storage::config::{StorageConfig, DEFAULT_S3_REGION};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default location of the mapping resource inside the destination container.
pub const DEFAULT_MAPPING_PATH: &str = "Dropbox_TableNames/file_to_table_name_mapping.csv";

/// Configuration errors. Always fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub secrets: SecretsConfig,
    pub run: RunConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Where the storage key comes from
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretsConfig {
    /// Key Vault base URL; secrets come from the environment when unset
    pub vault_url: Option<String>,
    #[serde(skip_serializing)]
    pub vault_token: Option<String>,
    pub storage_key_secret_name: String,
}

impl std::fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsConfig")
            .field("vault_url", &self.vault_url)
            .field("vault_token", &self.vault_token.as_ref().map(|_| "<redacted>"))
            .field("storage_key_secret_name", &self.storage_key_secret_name)
            .finish()
    }
}

/// Containers and prefixes for one CSV pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunConfig {
    pub source_container: String,
    pub destination_container: String,
    /// Empty, or ends with exactly one `/`
    pub source_prefix: String,
    /// Empty, or ends with exactly one `/`
    pub destination_prefix: String,
    /// Read from the destination container
    pub mapping_path: String,
}

impl Config {
    /// Load configuration from `.env` (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Required: `STORAGE_ACCOUNT_NAME`, `STORAGE_KEY_SECRET_NAME`,
    /// `SOURCE_CONTAINER`, `DEST_CONTAINER`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let required = |key: &'static str| value(key).ok_or(ConfigError::Missing(key));

        // MinIO-style endpoints default to path-style addressing
        let account = required("STORAGE_ACCOUNT_NAME")?;
        let region = value("S3_REGION").unwrap_or_else(|| DEFAULT_S3_REGION.to_string());
        let mut storage = match value("S3_ENDPOINT") {
            Some(endpoint) => StorageConfig {
                region,
                ..StorageConfig::for_minio(endpoint, account)
            },
            None => StorageConfig::for_aws(region, account),
        };
        storage.path_style = parse_or(value("S3_PATH_STYLE"), "S3_PATH_STYLE", storage.path_style)?;

        let config = Config {
            server: ServerConfig {
                host: value("CSVSYNC_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
                port: parse_or(value("CSVSYNC_PORT"), "CSVSYNC_PORT", DEFAULT_SERVER_PORT)?,
                shutdown_timeout_secs: parse_or(
                    value("CSVSYNC_SHUTDOWN_TIMEOUT"),
                    "CSVSYNC_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                )?,
            },
            storage,
            secrets: SecretsConfig {
                vault_url: value("KEYVAULT_URL"),
                vault_token: value("KEYVAULT_TOKEN"),
                storage_key_secret_name: required("STORAGE_KEY_SECRET_NAME")?,
            },
            run: RunConfig {
                source_container: required("SOURCE_CONTAINER")?,
                destination_container: required("DEST_CONTAINER")?,
                source_prefix: normalize_prefix(&value("SOURCE_PATH").unwrap_or_default()),
                destination_prefix: normalize_prefix(&value("DEST_PATH").unwrap_or_default()),
                mapping_path: value("MAPPING_PATH")
                    .unwrap_or_else(|| DEFAULT_MAPPING_PATH.to_string()),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                key: "CSVSYNC_PORT",
                value: "0".to_string(),
            });
        }

        if let Some(url) = &self.secrets.vault_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    key: "KEYVAULT_URL",
                    value: url.clone(),
                });
            }
        }

        if self.run.source_container.is_empty() {
            return Err(ConfigError::Missing("SOURCE_CONTAINER"));
        }

        if self.run.destination_container.is_empty() {
            return Err(ConfigError::Missing("DEST_CONTAINER"));
        }

        if self.secrets.vault_url.is_none() {
            tracing::warn!("KEYVAULT_URL not set - secrets will be read from the environment");
        }

        Ok(())
    }
}

fn parse_or<T: FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}

/// Strip surrounding `/` and append a single trailing `/` when non-empty.
pub fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}
