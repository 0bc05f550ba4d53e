//! Rectangular CSV tables
//!
//! [`ParsedTable`] is the in-memory shape every CSV passes through on its way
//! from the source store to the destination store: a header row plus rows of
//! string cells, all aligned to the header.
//!
//! Parsing is multiline-aware (quoted fields may contain newlines), accepts
//! doubled quotes inside quoted fields, and treats `\` as an escape
//! character everywhere: `1\,2` is the single cell `1,2` and `C:\dir`
//! reads as `C:dir`. Cells are never typed; every value stays the text found
//! in the file after escapes are applied.
//! Rows shorter than the header are padded with empty strings; rows longer
//! than the header are rejected.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::{Result, TableError};
use crate::naming::sanitize;

const UTF8_BOM: char = '\u{feff}';
const ESCAPE: char = '\\';

/// Decode raw bytes as UTF-8, dropping a leading byte-order mark.
pub fn decode_text(bytes: &[u8]) -> Result<String> {
    let text = String::from_utf8(bytes.to_vec())?;

    Ok(match text.strip_prefix(UTF8_BOM) {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// A header row plus string rows of the same width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ParsedTable {
    /// Decode and parse raw file content.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = decode_text(bytes)?;
        Self::from_text(&text)
    }

    /// Parse CSV text whose first record is the header row.
    pub fn from_text(text: &str) -> Result<Self> {
        let prepared = quote_escaped_fields(text);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .quote(b'"')
            .double_quote(true)
            .escape(Some(b'\\'))
            .from_reader(prepared.as_bytes());

        let raw_headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if raw_headers.is_empty() {
            return Err(TableError::NoColumns);
        }

        let headers = disambiguate_headers(&raw_headers);
        let width = headers.len();
        let mut rows = Vec::new();

        for (index, record) in reader.records().enumerate() {
            let record = record?;

            if record.len() > width {
                let line = record
                    .position()
                    .map(|position| position.line())
                    .unwrap_or(index as u64 + 2);
                return Err(TableError::RaggedRow {
                    line,
                    expected: width,
                    actual: record.len(),
                });
            }

            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        tracing::trace!(columns = width, rows = rows.len(), "Parsed CSV table");

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Run every header through [`sanitize`].
    pub fn sanitize_headers(&mut self) {
        self.headers = self.headers.iter().map(|h| sanitize(h)).collect();
    }

    /// Serialize as comma-delimited UTF-8 with `\n` line endings, quoting
    /// only fields that need it.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(Vec::new());

        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }

        writer
            .into_inner()
            .map_err(|e| TableError::Write(e.to_string()))
    }
}

/// Rewrite unquoted fields that contain backslash escapes as quoted fields.
///
/// The csv reader applies its escape character only inside quotes, so an
/// unquoted `1\,2` would split in two. Such a field is resolved here and
/// re-emitted quoted, with `"` doubled and `\` escaped for the reader.
/// Quoted fields and anything after a closing quote pass through untouched.
fn quote_escaped_fields(text: &str) -> Cow<'_, str> {
    if !text.contains(ESCAPE) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    let mut field = String::new();
    let mut escaped = false;
    let mut quoted = false;
    let mut at_field_start = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ',' | '\n' | '\r' => {
                flush_unquoted(&mut out, &mut field, escaped);
                escaped = false;
                quoted = false;
                at_field_start = true;
                out.push(c);
            },
            '"' if at_field_start => {
                at_field_start = false;
                quoted = true;
                out.push(c);
                while let Some(q) = chars.next() {
                    out.push(q);
                    match q {
                        ESCAPE => {
                            if let Some(next) = chars.next() {
                                out.push(next);
                            }
                        },
                        '"' if chars.peek() == Some(&'"') => {
                            chars.next();
                            out.push('"');
                        },
                        '"' => break,
                        _ => {},
                    }
                }
            },
            ESCAPE if !quoted => {
                at_field_start = false;
                escaped = true;
                if let Some(next) = chars.next() {
                    field.push(next);
                }
            },
            _ => {
                at_field_start = false;
                if quoted {
                    out.push(c);
                } else {
                    field.push(c);
                }
            },
        }
    }
    flush_unquoted(&mut out, &mut field, escaped);

    Cow::Owned(out)
}

fn flush_unquoted(out: &mut String, field: &mut String, escaped: bool) {
    if escaped {
        out.push('"');
        for c in field.chars() {
            match c {
                '"' => out.push_str("\"\""),
                ESCAPE => out.push_str("\\\\"),
                _ => out.push(c),
            }
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
    field.clear();
}

/// Name blank headers `Unnamed: {index}` and suffix repeated names with
/// `.1`, `.2`, ... so every column keeps a distinct name.
fn disambiguate_headers(raw: &[String]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (index, name) in raw.iter().enumerate() {
        let mut header = if name.is_empty() {
            format!("Unnamed: {index}")
        } else {
            name.clone()
        };

        let mut count = counts.get(&header).copied().unwrap_or(0);
        while count > 0 {
            counts.insert(header.clone(), count + 1);
            header = format!("{header}.{count}");
            count = counts.get(&header).copied().unwrap_or(0);
        }

        counts.insert(header.clone(), count + 1);
        headers.push(header);
    }

    headers
}
