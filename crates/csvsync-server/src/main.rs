//! csvsync Server - Main entry point

use anyhow::Result;
use csvsync_common::logging::{init_logging, LogConfig};
use std::sync::Arc;
use tracing::info;

use csvsync_server::{
    api,
    config::Config,
    secrets::{EnvSecretProvider, KeyVaultSecretProvider, SecretProvider},
    storage::{BlobStoreConnector, S3Connector},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let log_config = LogConfig::builder()
        .log_file_prefix("csvsync-server")
        .filter_directives("csvsync_server=debug,tower_http=debug")
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_from(|key| std::env::var(key).ok())?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting csvsync Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let secrets: Arc<dyn SecretProvider> = match &config.secrets.vault_url {
        Some(vault_url) => {
            info!(vault = %vault_url, "Using Key Vault secret provider");
            Arc::new(KeyVaultSecretProvider::new(
                vault_url.clone(),
                config.secrets.vault_token.clone(),
            )?)
        },
        None => {
            info!("Using environment secret provider");
            Arc::new(EnvSecretProvider)
        },
    };

    let connector: Arc<dyn BlobStoreConnector> = Arc::new(S3Connector::new(config.storage.clone()));

    api::serve(config, secrets, connector).await
}
