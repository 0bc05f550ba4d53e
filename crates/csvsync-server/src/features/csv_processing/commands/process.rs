//! Process CSV command
//!
//! One pass over the source prefix: resolve the storage key, connect, load the
//! mapping table (best effort), list the source files and push every CSV
//! through [`CsvPipeline`]. Only the steps before the per-file loop can fail
//! the command as a whole; per-file failures end up in the report.

use mediator::Request;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{Config, ConfigError};
use crate::ingest::{load_mapping, CsvPipeline, RunResult};
use crate::secrets::{AuthError, SecretProvider};
use crate::storage::{BlobStoreConnector, StorageCredentials, StorageError};

/// Failing paths listed in a partial-failure message.
pub const MAX_REPORTED_FAILURES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessCsvCommand {
    pub storage_account: String,
    pub storage_key_secret_name: String,
    pub source_container: String,
    pub destination_container: String,
    pub source_prefix: String,
    pub destination_prefix: String,
    pub mapping_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessCsvReport {
    pub processed: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_paths: Vec<String>,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ProcessCsvError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Storage(StorageError),
    #[error("{0}")]
    Listing(StorageError),
}

impl Request<Result<ProcessCsvReport, ProcessCsvError>> for ProcessCsvCommand {}

impl ProcessCsvCommand {
    pub fn from_config(config: &Config) -> Self {
        Self {
            storage_account: config.storage.account.clone(),
            storage_key_secret_name: config.secrets.storage_key_secret_name.clone(),
            source_container: config.run.source_container.clone(),
            destination_container: config.run.destination_container.clone(),
            source_prefix: config.run.source_prefix.clone(),
            destination_prefix: config.run.destination_prefix.clone(),
            mapping_path: config.run.mapping_path.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ProcessCsvError> {
        if self.storage_account.trim().is_empty() {
            return Err(ConfigError::Missing("STORAGE_ACCOUNT_NAME").into());
        }
        if self.storage_key_secret_name.trim().is_empty() {
            return Err(ConfigError::Missing("STORAGE_KEY_SECRET_NAME").into());
        }
        if self.source_container.trim().is_empty() {
            return Err(ConfigError::Missing("SOURCE_CONTAINER").into());
        }
        if self.destination_container.trim().is_empty() {
            return Err(ConfigError::Missing("DEST_CONTAINER").into());
        }
        if self.mapping_path.trim().is_empty() {
            return Err(ConfigError::Missing("MAPPING_PATH").into());
        }
        Ok(())
    }
}

impl ProcessCsvReport {
    pub fn from_run(result: RunResult) -> Self {
        let message = summary_message(&result);
        Self {
            processed: result.processed_count,
            failed: result.failed_paths.len(),
            failed_paths: result.failed_paths,
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Human-readable outcome of a pass.
///
/// `Processed 3 CSV files successfully.` or
/// `Processed 2 files, failed 1: ['inbox/b.csv']`, with ` ...` appended when
/// more than [`MAX_REPORTED_FAILURES`] paths failed.
pub fn summary_message(result: &RunResult) -> String {
    if result.is_success() {
        return format!("Processed {} CSV files successfully.", result.processed_count);
    }

    let shown: Vec<String> = result
        .failed_paths
        .iter()
        .take(MAX_REPORTED_FAILURES)
        .map(|path| format!("'{}'", path))
        .collect();
    let more = if result.failed_paths.len() > MAX_REPORTED_FAILURES {
        " ..."
    } else {
        ""
    };

    format!(
        "Processed {} files, failed {}: [{}]{}",
        result.processed_count,
        result.failed_paths.len(),
        shown.join(", "),
        more
    )
}

#[tracing::instrument(
    skip(secrets, connector, command),
    fields(source = %command.source_container, destination = %command.destination_container)
)]
pub async fn handle(
    secrets: &dyn SecretProvider,
    connector: &dyn BlobStoreConnector,
    command: ProcessCsvCommand,
) -> Result<ProcessCsvReport, ProcessCsvError> {
    command.validate()?;

    let key = secrets.get_secret(&command.storage_key_secret_name).await?;

    let store = connector
        .connect(StorageCredentials {
            account: command.storage_account.clone(),
            key,
        })
        .await
        .map_err(ProcessCsvError::Storage)?;

    let mapping = load_mapping(
        store.as_ref(),
        &command.destination_container,
        &command.mapping_path,
    )
    .await
    .into_table();

    let source_paths = store
        .list(&command.source_container, &command.source_prefix)
        .await
        .map_err(ProcessCsvError::Listing)?;

    info!(
        prefix = %command.source_prefix,
        "Found {} files in source",
        source_paths.len()
    );

    let pipeline = CsvPipeline::new(
        store,
        command.source_container,
        command.destination_container,
        command.destination_prefix,
    );
    let result = pipeline.process_all(&source_paths, &mapping).await;

    Ok(ProcessCsvReport::from_run(result))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::secrets::StaticSecretProvider;
    use crate::storage::{FixedConnector, MemoryBlobStore};
    use async_trait::async_trait;
    use std::sync::Arc;

    const SECRET: &str = "storage-key";

    fn command() -> ProcessCsvCommand {
        ProcessCsvCommand {
            storage_account: "acct".to_string(),
            storage_key_secret_name: SECRET.to_string(),
            source_container: "raw".to_string(),
            destination_container: "curated".to_string(),
            source_prefix: "inbox/".to_string(),
            destination_prefix: "clean/".to_string(),
            mapping_path: "maps/mapping.csv".to_string(),
        }
    }

    fn secrets() -> StaticSecretProvider {
        StaticSecretProvider::new().with_secret(SECRET, "key-value")
    }

    fn run(failed: &[&str], processed: usize) -> RunResult {
        RunResult {
            processed_count: processed,
            failed_paths: failed.iter().map(|p| p.to_string()).collect(),
        }
    }

    struct RefusingConnector;

    #[async_trait]
    impl BlobStoreConnector for RefusingConnector {
        async fn connect(
            &self,
            _credentials: StorageCredentials,
        ) -> Result<Arc<dyn crate::storage::BlobStore>, StorageError> {
            Err(StorageError::Connect("account disabled".to_string()))
        }
    }

    #[test]
    fn test_validation_success() {
        assert!(command().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_source_container() {
        let cmd = ProcessCsvCommand {
            source_container: " ".to_string(),
            ..command()
        };
        assert!(matches!(
            cmd.validate(),
            Err(ProcessCsvError::Config(ConfigError::Missing("SOURCE_CONTAINER")))
        ));
    }

    #[test]
    fn test_summary_message_success() {
        assert_eq!(
            summary_message(&run(&[], 3)),
            "Processed 3 CSV files successfully."
        );
    }

    #[test]
    fn test_summary_message_partial_failure() {
        assert_eq!(
            summary_message(&run(&["inbox/b.csv"], 2)),
            "Processed 2 files, failed 1: ['inbox/b.csv']"
        );
    }

    #[test]
    fn test_summary_message_truncates_failures() {
        let failed = ["f1", "f2", "f3", "f4", "f5", "f6", "f7"];
        assert_eq!(
            summary_message(&run(&failed, 0)),
            "Processed 0 files, failed 7: ['f1', 'f2', 'f3', 'f4', 'f5'] ..."
        );

        let exactly_five = ["f1", "f2", "f3", "f4", "f5"];
        assert!(!summary_message(&run(&exactly_five, 0)).ends_with("..."));
    }

    #[tokio::test]
    async fn test_handle_processes_source_prefix_only() {
        let store = Arc::new(MemoryBlobStore::new());
        store.insert("raw", "inbox/a.csv", "Col A\n1\n");
        store.insert("raw", "archive/old.csv", "x\n1\n");
        store.insert(
            "curated",
            "maps/mapping.csv",
            "filename,schema,tablename\na,dbo,alpha\n",
        );

        let report = handle(&secrets(), &FixedConnector::new(store.clone()), command())
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.processed, 1);
        assert_eq!(report.message, "Processed 1 CSV files successfully.");
        assert_eq!(store.get("curated", "clean/alpha.csv").unwrap(), b"Col_A\n1\n");
        assert!(store.get("curated", "clean/old.csv").is_none());
    }

    #[tokio::test]
    async fn test_handle_without_mapping_resource() {
        let store = Arc::new(MemoryBlobStore::new());
        store.insert("raw", "inbox/My Data.csv", "a\n1\n");

        let report = handle(&secrets(), &FixedConnector::new(store.clone()), command())
            .await
            .unwrap();

        assert!(report.is_success());
        assert!(store.get("curated", "clean/My_Data.csv").is_some());
    }

    #[tokio::test]
    async fn test_handle_reports_partial_failure() {
        let store = Arc::new(MemoryBlobStore::new());
        store.insert("raw", "inbox/a.csv", "x,y\n1,2\n");
        store.insert("raw", "inbox/b.csv", "x,y\n1,2,3\n");
        store.insert("raw", "inbox/c.csv", "x,y\n3,4\n");

        let report = handle(&secrets(), &FixedConnector::new(store), command())
            .await
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failed_paths, vec!["inbox/b.csv"]);
    }

    #[tokio::test]
    async fn test_handle_missing_secret_is_auth_error() {
        let store = Arc::new(MemoryBlobStore::new());

        let err = handle(
            &StaticSecretProvider::new(),
            &FixedConnector::new(store),
            command(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ProcessCsvError::Auth(AuthError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_handle_connect_failure_is_storage_error() {
        let err = handle(&secrets(), &RefusingConnector, command())
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessCsvError::Storage(StorageError::Connect(_))));
    }
}
