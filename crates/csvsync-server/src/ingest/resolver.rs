//! Output file naming
//!
//! A source file is renamed after the first mapping row whose `filename` is a
//! case-insensitive prefix of the file's base name. Rows are tried strictly in
//! table order: neither the longest nor an exact match takes priority. When no
//! row yields a usable table name, the output is the sanitized stem of the
//! source file.

use csvsync_common::naming::{file_stem, sanitize};
use tracing::debug;

use super::mapping::MappingTable;

/// The chosen output name and how it was derived
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputName {
    Mapped(String),
    Cleaned(String),
}

impl OutputName {
    pub fn as_str(&self) -> &str {
        match self {
            OutputName::Mapped(name) | OutputName::Cleaned(name) => name,
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, OutputName::Mapped(_))
    }
}

/// Mapped output name for `base_filename`, if any mapping row applies.
pub fn resolve_output_name(base_filename: &str, mapping: &MappingTable) -> Option<String> {
    let lower_base = base_filename.to_lowercase();

    mapping.iter().find_map(|row| {
        let key = row.filename.to_lowercase();
        if key.is_empty() || !lower_base.starts_with(&key) {
            return None;
        }

        let schema = sanitize(&row.schema);
        let tablename = sanitize(&row.tablename);
        debug!(
            key = %row.filename,
            schema = %schema,
            tablename = %tablename,
            "Mapping row matched"
        );

        // schema never changes the output name
        if tablename.is_empty() {
            None
        } else {
            Some(format!("{}.csv", tablename))
        }
    })
}

/// `{sanitized stem}.csv` for a source base name.
pub fn fallback_output_name(base_filename: &str) -> String {
    format!("{}.csv", sanitize(file_stem(base_filename)))
}

/// Mapped name when a row applies, otherwise the cleaned fallback.
pub fn choose_output_name(base_filename: &str, mapping: &MappingTable) -> OutputName {
    match resolve_output_name(base_filename, mapping) {
        Some(name) => OutputName::Mapped(name),
        None => OutputName::Cleaned(fallback_output_name(base_filename)),
    }
}
