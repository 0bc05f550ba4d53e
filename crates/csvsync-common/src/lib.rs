//! csvsync Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared, storage-agnostic building blocks for the csvsync project.
//!
//! # Overview
//!
//! - **Naming**: the deterministic name sanitizer used for file, table and column names
//! - **Tables**: CSV decoding, parsing into a rectangular string table, and re-serialization
//! - **Error Handling**: table error types and result alias
//! - **Logging**: tracing subscriber setup shared by all binaries
//!
//! # Example
//!
//! ```no_run
//! use csvsync_common::{naming::sanitize, table::ParsedTable, Result};
//!
//! fn normalize(bytes: &[u8]) -> Result<Vec<u8>> {
//!     let mut table = ParsedTable::from_bytes(bytes)?;
//!     table.sanitize_headers();
//!     table.to_csv_bytes()
//! }
//!
//! assert_eq!(sanitize("My File-Name.csv"), "My_File_Name_csv");
//! ```

pub mod error;
pub mod logging;
pub mod naming;
pub mod table;

// Re-export commonly used types
pub use error::{Result, TableError};
