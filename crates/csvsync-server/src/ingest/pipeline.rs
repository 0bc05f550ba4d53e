//! Per-file CSV pipeline
//!
//! For every `.csv` path in a listing: pick the output name, download,
//! normalize, and upload into the destination prefix. Each file yields its own
//! [`FileOutcome`]; failures are logged and collected in [`RunResult`] and
//! never stop the remaining files from being processed.

use csvsync_common::{naming::base_name, table::ParsedTable, TableError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument};

use super::mapping::MappingTable;
use super::resolver::choose_output_name;
use crate::storage::{BlobStore, StorageError};

const CSV_EXTENSION: &str = ".csv";

/// Why a single file could not be processed
#[derive(Debug, Error)]
pub enum FileError {
    #[error("download failed: {0}")]
    Download(StorageError),

    #[error("invalid CSV: {0}")]
    Table(#[from] TableError),

    #[error("upload failed: {0}")]
    Upload(StorageError),
}

/// Destination path on success
pub type FileOutcome = Result<String, FileError>;

/// Aggregate of one pass over the source listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub processed_count: usize,
    pub failed_paths: Vec<String>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.failed_paths.is_empty()
    }

    fn record(&mut self, source_path: &str, outcome: &FileOutcome) {
        match outcome {
            Ok(_) => self.processed_count += 1,
            Err(_) => self.failed_paths.push(source_path.to_string()),
        }
    }
}

/// Whether a listed path is a CSV file (extension match, case-insensitive).
pub fn is_csv_path(path: &str) -> bool {
    path.to_lowercase().ends_with(CSV_EXTENSION)
}

/// Parse, sanitize headers, and re-serialize one CSV file.
pub fn normalize_csv(bytes: &[u8]) -> Result<Vec<u8>, TableError> {
    let mut table = ParsedTable::from_bytes(bytes)?;
    table.sanitize_headers();
    table.to_csv_bytes()
}

/// Moves CSV files from one container to another through [`normalize_csv`]
pub struct CsvPipeline {
    store: Arc<dyn BlobStore>,
    source_container: String,
    destination_container: String,
    destination_prefix: String,
}

impl CsvPipeline {
    pub fn new(
        store: Arc<dyn BlobStore>,
        source_container: impl Into<String>,
        destination_container: impl Into<String>,
        destination_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            source_container: source_container.into(),
            destination_container: destination_container.into(),
            destination_prefix: destination_prefix.into(),
        }
    }

    /// Process every CSV path in listing order.
    #[instrument(skip_all, fields(listed = source_paths.len(), mapping_rows = mapping.len()))]
    pub async fn process_all(&self, source_paths: &[String], mapping: &MappingTable) -> RunResult {
        let mut result = RunResult::default();

        for source_path in source_paths.iter().filter(|path| is_csv_path(path)) {
            let base = base_name(source_path);
            let output_name = choose_output_name(base, mapping);

            if output_name.is_mapped() {
                info!("Mapping applied: {} -> {}", base, output_name.as_str());
            } else {
                info!("No mapping; cleaned: {} -> {}", base, output_name.as_str());
            }

            let outcome = self.process_file(source_path, output_name.as_str()).await;
            match &outcome {
                Ok(destination) => info!(source = %source_path, "Saved: {}", destination),
                Err(err) => error!(source = %source_path, error = %err, "Failed {}", source_path),
            }

            result.record(source_path, &outcome);
        }

        info!(
            processed = result.processed_count,
            failed = result.failed_paths.len(),
            "CSV pass finished"
        );

        result
    }

    /// Download, normalize and upload a single file as `output_name`.
    pub async fn process_file(&self, source_path: &str, output_name: &str) -> FileOutcome {
        let raw = self
            .store
            .read_all(&self.source_container, source_path)
            .await
            .map_err(FileError::Download)?;

        let normalized = normalize_csv(&raw)?;

        let destination = format!("{}{}", self.destination_prefix, output_name);
        self.store
            .write(&self.destination_container, &destination, normalized, true)
            .await
            .map_err(FileError::Upload)?;

        Ok(destination)
    }
}
