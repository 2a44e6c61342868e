//! The driving loop.
//!
//! Records are consumed one at a time in input order. Each record first
//! advances the clock; when the timestamp moves, open sessions are scanned
//! and the idle ones are written as one closing batch. Only then is the
//! record applied to its own session. After the last record every session
//! still open is flushed through the same emission path.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::{info, trace};

use crate::clock::{Advance, Clock};
use crate::config::{read_inactivity_period, FieldNames, InactivityPeriod};
use crate::emit::{emit_batch, flush_all};
use crate::error::Result;
use crate::reader::RecordReader;
use crate::record::Record;
use crate::scan::InactivityScanner;
use crate::session::SessionStore;

// ---------------------------------------------------------------------------
// RunStats
// ---------------------------------------------------------------------------

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Data records processed.
    pub records: usize,
    /// Sessions written.
    pub sessions: usize,
    /// Non-empty closing batches written, the final flush included.
    pub batches: usize,
}

// ---------------------------------------------------------------------------
// Sessionizer
// ---------------------------------------------------------------------------

/// Owns all run state and the output sink.
pub struct Sessionizer<W: Write> {
    store: SessionStore,
    clock: Clock,
    scanner: InactivityScanner,
    sink: W,
    stats: RunStats,
}

impl<W: Write> Sessionizer<W> {
    pub fn new(period: InactivityPeriod, sink: W) -> Self {
        Self {
            store: SessionStore::new(),
            clock: Clock::new(),
            scanner: InactivityScanner::new(period),
            sink,
            stats: RunStats::default(),
        }
    }

    /// Process one record: scan on a timestamp advance, then apply.
    pub fn process(&mut self, record: &Record) -> Result<()> {
        if let Advance::Moved { to } = self.clock.advance(record.timestamp) {
            let idle = self.scanner.scan(&self.store, to);
            let written = emit_batch(&mut self.store, &idle, &mut self.sink)?;
            self.record_batch(written);
        }

        let origin_line = self.stats.records;
        if self.store.apply(record, origin_line) {
            trace!("opened session for {} at record {}", record.key, origin_line);
        }
        self.stats.records += 1;
        Ok(())
    }

    /// Flush every open session and hand back the sink and run counters.
    pub fn finish(mut self) -> Result<(W, RunStats)> {
        let written = flush_all(&mut self.store, &mut self.sink)?;
        self.record_batch(written);
        self.sink.flush()?;
        Ok((self.sink, self.stats))
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    fn record_batch(&mut self, written: usize) {
        if written > 0 {
            self.stats.sessions += written;
            self.stats.batches += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Sessionize an already-decoded record stream, writing to `sink`.
///
/// The first error aborts the run; lines already written stay written.
pub fn sessionize<I, W>(records: I, period: InactivityPeriod, sink: W) -> Result<RunStats>
where
    I: IntoIterator<Item = Result<Record>>,
    W: Write,
{
    let mut sessionizer = Sessionizer::new(period, sink);
    for record in records {
        sessionizer.process(&record?)?;
    }
    let (_, stats) = sessionizer.finish()?;
    Ok(stats)
}

/// Sessionize a delimited log read from `input`, writing to `sink`.
pub fn run<R: BufRead, W: Write>(
    input: R,
    period: InactivityPeriod,
    fields: &FieldNames,
    sink: W,
) -> Result<RunStats> {
    let reader = RecordReader::new(input, fields)?;
    sessionize(reader, period, sink)
}

/// File-backed variant of [`run`].
///
/// The period and the header are validated before the output file is
/// touched. The output file is truncated, and its parent directory is
/// created when missing.
pub fn run_files(
    input_path: &Path,
    period_path: &Path,
    output_path: &Path,
    fields: &FieldNames,
) -> Result<RunStats> {
    let period = read_inactivity_period(period_path)?;
    let reader = RecordReader::new(BufReader::new(File::open(input_path)?), fields)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let output = BufWriter::new(File::create(output_path)?);

    info!(
        "sessionizing {} with an inactivity period of {}s",
        input_path.display(),
        period.as_secs()
    );
    let stats = sessionize(reader, period, output)?;
    info!(
        "wrote {} session(s) from {} record(s) in {} batch(es) to {}",
        stats.sessions,
        stats.records,
        stats.batches,
        output_path.display()
    );
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
