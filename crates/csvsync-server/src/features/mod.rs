//! Feature modules implementing the csvsync API
//!
//! Each feature is a vertical slice with its own commands and routes.
//!
//! # Features
//!
//! - **csv_processing**: runs one sanitize-and-rename pass over the source
//!   container and reports processed and failed files
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Operations that change state (here: blobs in storage)
//! - `routes.rs` - HTTP route definitions
//!
//! Commands implement `mediator::Request` and expose a standalone `handle`
//! function that routes call directly.

pub mod csv_processing;

use axum::Router;
use std::sync::Arc;

use crate::config::Config;
use crate::secrets::SecretProvider;
use crate::storage::BlobStoreConnector;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Loaded once at startup
    pub config: Arc<Config>,
    /// Resolves the storage key at the start of each run
    pub secrets: Arc<dyn SecretProvider>,
    /// Builds a blob store from the resolved credentials
    pub connector: Arc<dyn BlobStoreConnector>,
}

/// Creates the API router with all feature routes mounted
///
/// - `/process_csv` - Run one CSV pass
pub fn router(state: FeatureState) -> Router<()> {
    Router::new().merge(csv_processing::csv_processing_routes().with_state(state))
}
