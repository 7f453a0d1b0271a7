//! Route record sources
//!
//! [`RouteSource`] is the data-access seam between table storage and parsing.
//! [`DelimitedSource`] reads CSV/TSV exports of the pipeline tracker sheets.

use crate::{DataError, Result, RouteRecord};
use std::io::Read;
use std::mem::take;
use std::path::Path;

/// Route values that mean "no route available" in tracker exports
pub const DEFAULT_SENTINELS: &[&str] = &[
    "--",
    "unknown",
    "tbd",
    "unavailable",
    "n/a",
    "capacity expansion only",
    "bidirectionality upgrade only",
];

/// Anything that can supply route records
pub trait RouteSource {
    /// Read all records with a usable route value
    fn read_records(&mut self) -> Result<Vec<RouteRecord>>;
}

impl RouteSource for Vec<RouteRecord> {
    fn read_records(&mut self) -> Result<Vec<RouteRecord>> {
        Ok(take(self))
    }
}

/// Configuration for reading delimited tables
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Field separator, `\t` for TSV or `,` for CSV
    pub separator: char,
    /// Header of the column holding the record label
    pub label_column: String,
    /// Header of the column holding the raw route string
    pub route_column: String,
    /// Route values to skip, compared case-insensitively after trimming
    pub sentinels: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            separator: '\t',
            label_column: "PipelineName".to_string(),
            route_column: "Route".to_string(),
            sentinels: DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SourceConfig {
    fn is_sentinel(&self, route: &str) -> bool {
        let route = route.trim();
        route.is_empty() || self.sentinels.iter().any(|s| s.eq_ignore_ascii_case(route))
    }
}

/// A CSV/TSV table held in memory, header row first
#[derive(Debug, Clone)]
pub struct DelimitedSource {
    rows: Vec<Vec<String>>,
    config: SourceConfig,
    skipped: usize,
}

impl DelimitedSource {
    pub fn from_text(text: &str, config: SourceConfig) -> Self {
        Self {
            rows: parse_rows(text, config.separator),
            config,
            skipped: 0,
        }
    }

    pub fn from_reader<R: Read>(mut reader: R, config: SourceConfig) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Self::from_text(&text, config))
    }

    pub fn from_path(path: impl AsRef<Path>, config: SourceConfig) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file), config)
    }

    /// Rows filtered out by the last `read_records` call
    #[inline]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn column_index(header: &[String], name: &str) -> Result<usize> {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }
}

impl RouteSource for DelimitedSource {
    fn read_records(&mut self) -> Result<Vec<RouteRecord>> {
        let (header, body) = self.rows.split_first().ok_or(DataError::EmptyTable)?;
        let label_idx = Self::column_index(header, &self.config.label_column)?;
        let route_idx = Self::column_index(header, &self.config.route_column)?;

        let mut records = Vec::with_capacity(body.len());
        let mut skipped = 0;
        for (line, row) in body.iter().enumerate() {
            let route = row.get(route_idx).map(String::as_str).unwrap_or_default();
            let label = row.get(label_idx).map(String::as_str).unwrap_or_default();
            if self.config.is_sentinel(route) {
                tracing::debug!("Skipping row {} ({:?}): no route ({:?})", line + 2, label, route);
                skipped += 1;
                continue;
            }
            records.push(RouteRecord::new(label.trim(), route.trim()));
        }

        self.skipped = skipped;
        tracing::info!(
            "Read {} route records ({} rows without a route)",
            records.len(),
            skipped
        );
        Ok(records)
    }
}

/// Quote-aware, CRLF-tolerant CSV/TSV splitter
fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.trim_start_matches('\u{feff}').chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // escaped quote
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == sep && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if row.len() == 1 && row[0].is_empty() {
                    row.clear();
                } else {
                    rows.push(take(&mut row));
                }
            }
            _ => field.push(ch),
        }
    }

    // Flush the last row when the text does not end with a newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}
