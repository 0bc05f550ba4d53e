//! csvsync Server Library
//!
//! HTTP-triggered CSV normalization between two blob containers.
//!
//! # Overview
//!
//! A single request to `/api/v1/process_csv` runs one pass:
//!
//! 1. Resolve the storage key from the secret provider
//! 2. Connect to blob storage with it
//! 3. Load the filename-to-table mapping (best effort)
//! 4. List the source prefix and, for every `.csv` file, sanitize the header
//!    row and upload the result under a mapped or cleaned name
//!
//! One bad file never stops the rest; the response reports how many files
//! were processed and which ones failed.
//!
//! # Modules
//!
//! - **api**: router, response envelopes and the server loop
//! - **config**: environment-based configuration, loaded once at startup
//! - **features**: the `csv_processing` command slice
//! - **ingest**: mapping table, output naming and the per-file pipeline
//! - **secrets**: Key Vault and environment secret providers
//! - **storage**: blob store abstraction with S3 and in-memory backends
//!
//! # Example
//!
//! ```no_run
//! use csvsync_server::{api, config::Config, secrets::EnvSecretProvider, storage::S3Connector};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let connector = Arc::new(S3Connector::new(config.storage.clone()));
//!     api::serve(config, Arc::new(EnvSecretProvider), connector).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod secrets;
pub mod storage;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use features::csv_processing::{ProcessCsvCommand, ProcessCsvError, ProcessCsvReport};
