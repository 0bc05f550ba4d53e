//! CSV ingestion core
//!
//! - **mapping**: loads the filename-prefix → table-name rules
//! - **resolver**: picks each output file name from those rules
//! - **pipeline**: moves and normalizes the files, collecting per-file failures
//!
//! Nothing here reads configuration or secrets; the trigger feature passes in
//! a connected store and explicit container/prefix values.

pub mod mapping;
pub mod pipeline;
pub mod resolver;

pub use mapping::{load_mapping, MappingLoad, MappingLoadError, MappingRow, MappingTable};
pub use pipeline::{normalize_csv, CsvPipeline, FileError, FileOutcome, RunResult};
pub use resolver::{choose_output_name, fallback_output_name, resolve_output_name, OutputName};
