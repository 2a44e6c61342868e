//! Delimited input source.
//!
//! Reads the header row once to resolve column positions, then decodes
//! each subsequent non-blank row into a [`Record`], in file order.

use std::io::BufRead;

use log::trace;

use crate::config::FieldNames;
use crate::error::Result;
use crate::record::{FieldIndex, Record};

// ---------------------------------------------------------------------------
// RecordReader
// ---------------------------------------------------------------------------

/// Iterator over the records of a delimited request log.
///
/// Yields `Err` at most once: the first decoding or I/O failure ends the
/// iteration, since every later gap computation would be built on a
/// corrupted clock.
pub struct RecordReader<R> {
    input: R,
    /// `None` when the input had no header line at all.
    index: Option<FieldIndex>,
    /// 1-based physical line number of the last line read.
    line: usize,
    buf: String,
    done: bool,
}

impl<R: BufRead> RecordReader<R> {
    /// Read the header line and resolve the configured field names.
    ///
    /// A completely empty input is accepted and yields no records.
    pub fn new(mut input: R, names: &FieldNames) -> Result<Self> {
        let mut header = String::new();
        let read = input.read_line(&mut header)?;

        let index = if read == 0 {
            None
        } else {
            Some(FieldIndex::resolve(&header, names)?)
        };

        Ok(Self {
            input,
            index,
            line: usize::from(read > 0),
            buf: String::new(),
            done: index.is_none(),
        })
    }

    /// Resolved column positions, if a header was present.
    pub fn field_index(&self) -> Option<FieldIndex> {
        self.index
    }

    /// 1-based physical line number of the most recently read line.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let index = self.index?;

        loop {
            self.buf.clear();
            let read = match self.input.read_line(&mut self.buf) {
                Ok(n) => n,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            if read == 0 {
                self.done = true;
                return None;
            }
            self.line += 1;

            if self.buf.trim().is_empty() {
                trace!("skipping blank line {}", self.line);
                continue;
            }

            let decoded = index.decode(&self.buf, self.line);
            if decoded.is_err() {
                self.done = true;
            }
            return Some(decoded);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
