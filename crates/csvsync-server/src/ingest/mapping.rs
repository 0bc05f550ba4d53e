//! Filename-to-table mapping
//!
//! The mapping resource is a CSV with at least the columns `filename`,
//! `schema` and `tablename` (matched case-insensitively after trimming).
//! Each row says: source files whose name starts with `filename` should be
//! written out as `tablename`. Rows keep their file order because the first
//! matching row wins.
//!
//! Loading never fails the run. [`load_mapping`] reports either
//! [`MappingLoad::Loaded`] or [`MappingLoad::Unavailable`], and
//! [`MappingLoad::into_table`] turns the latter into an empty table.

use csvsync_common::{table::ParsedTable, TableError};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::storage::{BlobStore, StorageError};

/// Columns every mapping resource must provide.
pub const REQUIRED_COLUMNS: [&str; 3] = ["filename", "schema", "tablename"];

/// One prefix rule. Values are stored trimmed but otherwise verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRow {
    pub filename: String,
    pub schema: String,
    pub tablename: String,
}

impl MappingRow {
    pub fn new(
        filename: impl Into<String>,
        schema: impl Into<String>,
        tablename: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            schema: schema.into(),
            tablename: tablename.into(),
        }
    }
}

/// Ordered, immutable set of mapping rows; never holds a row with an empty
/// `filename`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    rows: Vec<MappingRow>,
}

impl MappingTable {
    pub fn new(rows: Vec<MappingRow>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .filter(|row| !row.filename.trim().is_empty())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[MappingRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappingRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Why a mapping resource could not be used
#[derive(Debug, Error)]
pub enum MappingLoadError {
    #[error("mapping resource unreadable: {0}")]
    Storage(#[from] StorageError),

    #[error("mapping resource is not a valid CSV: {0}")]
    Table(#[from] TableError),

    #[error("mapping resource must have columns {required:?}, got {found:?}")]
    MissingColumns {
        required: Vec<&'static str>,
        found: Vec<String>,
    },
}

/// Outcome of loading the mapping resource
#[derive(Debug)]
pub enum MappingLoad {
    Loaded(MappingTable),
    Unavailable(MappingLoadError),
}

impl MappingLoad {
    /// Collapse to a table, logging a warning when the mapping was unavailable.
    pub fn into_table(self) -> MappingTable {
        match self {
            MappingLoad::Loaded(table) => {
                if table.is_empty() {
                    info!("No mapping rows loaded; will use cleaned filenames");
                } else {
                    info!(rows = table.len(), "Loaded mapping rows");
                }
                table
            },
            MappingLoad::Unavailable(reason) => {
                warn!(
                    reason = %reason,
                    "Mapping file not loaded; proceeding without mapping"
                );
                MappingTable::default()
            },
        }
    }
}

/// Fetch and parse the mapping resource at `container`/`path`.
#[instrument(skip(store))]
pub async fn load_mapping(store: &dyn BlobStore, container: &str, path: &str) -> MappingLoad {
    let parsed = match store.read_all(container, path).await {
        Ok(bytes) => parse_mapping(&bytes),
        Err(err) => Err(err.into()),
    };

    match parsed {
        Ok(table) => MappingLoad::Loaded(table),
        Err(reason) => MappingLoad::Unavailable(reason),
    }
}

/// Parse mapping CSV bytes (UTF-8, optional BOM).
pub fn parse_mapping(bytes: &[u8]) -> Result<MappingTable, MappingLoadError> {
    let table = ParsedTable::from_bytes(bytes)?;
    let headers: Vec<String> = table
        .headers()
        .iter()
        .map(|header| header.trim().to_lowercase())
        .collect();

    let column = |name: &str| headers.iter().position(|header| header == name);
    let (Some(filename), Some(schema), Some(tablename)) =
        (column("filename"), column("schema"), column("tablename"))
    else {
        return Err(MappingLoadError::MissingColumns {
            required: REQUIRED_COLUMNS.to_vec(),
            found: headers,
        });
    };

    let rows = table
        .rows()
        .iter()
        .map(|row| {
            MappingRow::new(
                row[filename].trim(),
                row[schema].trim(),
                row[tablename].trim(),
            )
        })
        .collect();

    Ok(MappingTable::new(rows))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;

    #[test]
    fn test_parse_normalizes_headers_and_trims_values() {
        let csv = "\u{feff} FileName , SCHEMA,TableName ,owner\n Sales2023 , dbo , orders ,ann\n";
        let table = parse_mapping(csv.as_bytes()).unwrap();

        assert_eq!(table.rows(), &[MappingRow::new("Sales2023", "dbo", "orders")]);
    }

    #[test]
    fn test_parse_keeps_order_and_drops_empty_filenames() {
        let csv = "filename,schema,tablename\nb,,beta\n   ,x,ignored\na,s,alpha\n,,\n";
        let table = parse_mapping(csv.as_bytes()).unwrap();

        let keys: Vec<&str> = table.iter().map(|row| row.filename.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(table.rows()[0].schema, "");
    }

    #[test]
    fn test_parse_fills_absent_values() {
        let csv = "filename,schema,tablename\nshort\n";
        let table = parse_mapping(csv.as_bytes()).unwrap();

        assert_eq!(table.rows(), &[MappingRow::new("short", "", "")]);
    }

    #[test]
    fn test_missing_required_column() {
        let err = parse_mapping(b"filename,tablename\na,b\n").unwrap_err();

        match err {
            MappingLoadError::MissingColumns { found, .. } => {
                assert_eq!(found, vec!["filename", "tablename"]);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unavailable_collapses_to_empty_table() {
        let load = MappingLoad::Unavailable(MappingLoadError::MissingColumns {
            required: REQUIRED_COLUMNS.to_vec(),
            found: vec![],
        });

        assert!(load.into_table().is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_resource_is_unavailable() {
        let store = MemoryBlobStore::new();

        let load = load_mapping(&store, "curated", "maps/mapping.csv").await;
        assert!(matches!(
            load,
            MappingLoad::Unavailable(MappingLoadError::Storage(StorageError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_load_with_missing_column_yields_empty_table() {
        let store = MemoryBlobStore::new();
        store.insert("curated", "maps/mapping.csv", "filename,schema\nx,y\n");

        let table = load_mapping(&store, "curated", "maps/mapping.csv")
            .await
            .into_table();
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_load_success() {
        let store = MemoryBlobStore::new();
        store.insert(
            "curated",
            "maps/mapping.csv",
            "filename,schema,tablename\nSales2023,dbo,orders\nsales,dbo,legacy\n",
        );

        let load = load_mapping(&store, "curated", "maps/mapping.csv").await;
        let MappingLoad::Loaded(table) = load else {
            panic!("mapping should load");
        };
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].tablename, "legacy");
    }
}
