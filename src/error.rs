//! Crate-wide error type.
//!
//! Every failure here is fatal for the run: the job is one-shot, so there
//! is no recovery path and no partial-record skipping.

use std::fmt;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that abort a sessionization run.
#[derive(Debug)]
pub enum SessionizeError {
    /// An I/O error while reading input or writing output.
    Io(std::io::Error),
    /// The header row does not name a required column.
    MissingField { field: String },
    /// A data row has fewer columns than the header requires.
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    /// The combined date and time fields could not be parsed.
    InvalidTimestamp { line: usize, value: String },
    /// The inactivity period is not an integer.
    InvalidPeriod { value: String },
    /// The inactivity period is below zero.
    NegativePeriod { value: i64 },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SessionizeError>;

impl fmt::Display for SessionizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionizeError::Io(e) => write!(f, "I/O error: {}", e),
            SessionizeError::MissingField { field } => {
                write!(f, "header is missing required field \"{}\"", field)
            }
            SessionizeError::MalformedRow {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {}: expected at least {} fields, found {}",
                line, expected, found
            ),
            SessionizeError::InvalidTimestamp { line, value } => {
                write!(f, "line {}: invalid timestamp \"{}\"", line, value)
            }
            SessionizeError::InvalidPeriod { value } => {
                write!(f, "inactivity period \"{}\" is not an integer", value)
            }
            SessionizeError::NegativePeriod { value } => {
                write!(f, "inactivity period must not be negative, got {}", value)
            }
        }
    }
}

impl std::error::Error for SessionizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionizeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SessionizeError {
    fn from(err: std::io::Error) -> Self {
        SessionizeError::Io(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
