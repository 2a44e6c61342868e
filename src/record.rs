use chrono::NaiveDateTime;

use crate::config::FieldNames;
use crate::error::{Result, SessionizeError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Format of the combined `date time` value, used for parsing and output.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column separator of the input log.
pub const DELIMITER: char = ',';

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One request from the input log, reduced to what sessionization needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Client identifier (the IP address in EDGAR logs).
    pub key: String,
    /// Request time at second resolution.
    pub timestamp: NaiveDateTime,
}

impl Record {
    pub fn new(key: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            key: key.into(),
            timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Combine separate date and time fields into one timestamp.
///
/// `line` is the 1-based physical line the fields came from and is only
/// used for the error message.
pub fn parse_timestamp(date: &str, time: &str, line: usize) -> Result<NaiveDateTime> {
    let combined = format!("{} {}", date, time);
    NaiveDateTime::parse_from_str(&combined, TIMESTAMP_FORMAT).map_err(|_| {
        SessionizeError::InvalidTimestamp {
            line,
            value: combined,
        }
    })
}

/// Render a timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Header resolution
// ---------------------------------------------------------------------------

/// Column positions of the fields a record is built from.
///
/// Resolved once from the header row; every other column is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldIndex {
    pub key: usize,
    pub date: usize,
    pub time: usize,
}

impl FieldIndex {
    /// Resolve column positions from a header line.
    pub fn resolve(header: &str, names: &FieldNames) -> Result<Self> {
        let columns: Vec<&str> = header.split(DELIMITER).map(str::trim).collect();
        let position = |name: &str| {
            columns
                .iter()
                .position(|c| *c == name)
                .ok_or_else(|| SessionizeError::MissingField {
                    field: name.to_string(),
                })
        };

        Ok(Self {
            key: position(names.key.as_str())?,
            date: position(names.date.as_str())?,
            time: position(names.time.as_str())?,
        })
    }

    /// Number of columns a row needs for every index to be addressable.
    pub fn min_columns(&self) -> usize {
        self.key.max(self.date).max(self.time) + 1
    }

    /// Decode one data row into a [`Record`].
    pub fn decode(&self, row: &str, line: usize) -> Result<Record> {
        let tokens: Vec<&str> = row.split(DELIMITER).map(str::trim).collect();
        if tokens.len() < self.min_columns() {
            return Err(SessionizeError::MalformedRow {
                line,
                expected: self.min_columns(),
                found: tokens.len(),
            });
        }

        let timestamp = parse_timestamp(tokens[self.date], tokens[self.time], line)?;
        Ok(Record::new(tokens[self.key], timestamp))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
