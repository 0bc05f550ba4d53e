//! Name sanitizer
//!
//! Turns arbitrary file, table and column names into identifiers made only of
//! ASCII letters, digits and single underscores.
//!
//! The steps run in a fixed order because each one consumes the output of the
//! previous one:
//!
//! 1. trim surrounding whitespace
//! 2. delete `/` and `#`
//! 3. replace `-`, `.` and whitespace with `_`
//! 4. delete anything that is not `[A-Za-z0-9_]`
//! 5. collapse runs of `_`
//! 6. trim surrounding `_`
//!
//! # Examples
//!
//! ```
//! use csvsync_common::naming::sanitize;
//!
//! assert_eq!(sanitize("My File-Name.csv"), "My_File_Name_csv");
//! assert_eq!(sanitize("a/b#c  d"), "abc_d");
//! assert_eq!(sanitize("!!!"), "");
//! ```

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)]
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-.\s]").unwrap());

#[allow(clippy::unwrap_used)]
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

#[allow(clippy::unwrap_used)]
static UNDERSCORE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());

/// Sanitize a raw name. Total: always returns a string, possibly empty.
pub fn sanitize(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped: String = trimmed.chars().filter(|c| *c != '/' && *c != '#').collect();
    let separated = SEPARATORS.replace_all(&stripped, "_");
    let allowed = DISALLOWED.replace_all(&separated, "");
    let collapsed = UNDERSCORE_RUNS.replace_all(&allowed, "_");

    collapsed.trim_matches('_').to_string()
}

/// Return the file name without its final extension.
///
/// Leading dots are part of the name, so `.csv` has no extension and
/// `report.v2.csv` has the stem `report.v2`.
pub fn file_stem(file_name: &str) -> &str {
    let without_leading_dots = file_name.trim_start_matches('.');
    let offset = file_name.len() - without_leading_dots.len();

    match without_leading_dots.rfind('.') {
        Some(index) => &file_name[..offset + index],
        None => file_name,
    }
}

/// Last `/`-separated segment of an object path.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
