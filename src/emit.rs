//! Closing batch ordering and emission.
//!
//! Sessions that close together (in one inactivity scan, or in the final
//! flush) are written as one batch, ordered by the calendar date of their
//! first request and then by the input position of that request. Only the
//! date takes part in the first sort component, so two sessions opened on
//! the same day compare by origin line alone.

use std::io::Write;

use log::debug;

use crate::error::Result;
use crate::session::{Session, SessionStore};

// ---------------------------------------------------------------------------
// ClosedSession / ClosingBatch
// ---------------------------------------------------------------------------

/// A session that has left the store and is waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedSession {
    pub key: String,
    pub session: Session,
}

/// Sessions closed together, in output order.
#[derive(Debug, Default)]
pub struct ClosingBatch {
    sessions: Vec<ClosedSession>,
}

impl ClosingBatch {
    /// Build a batch, sorting it into output order.
    pub fn new(mut sessions: Vec<ClosedSession>) -> Self {
        sessions.sort_by_key(|c| {
            (
                c.session.first_request_time.date(),
                c.session.origin_line,
            )
        });
        Self { sessions }
    }

    /// Move the sessions named by `keys` out of the store into a batch.
    /// Keys without an open session are ignored.
    pub fn take_from(store: &mut SessionStore, keys: &[String]) -> Self {
        let sessions = keys
            .iter()
            .filter_map(|key| {
                store.take(key).map(|session| ClosedSession {
                    key: key.clone(),
                    session,
                })
            })
            .collect();
        Self::new(sessions)
    }

    /// Move every open session out of the store into a batch.
    pub fn take_all(store: &mut SessionStore) -> Self {
        let sessions = store
            .drain_all()
            .into_iter()
            .map(|(key, session)| ClosedSession { key, session })
            .collect();
        Self::new(sessions)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClosedSession> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Write one line per session to `sink`, in batch order.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> Result<usize> {
        for closed in &self.sessions {
            writeln!(sink, "{}", closed.session.to_output_line(&closed.key))?;
        }
        Ok(self.sessions.len())
    }
}

// ---------------------------------------------------------------------------
// Emission entry points
// ---------------------------------------------------------------------------

/// Close the sessions selected by a scan and write them as one batch.
///
/// Returns the number of lines written.
pub fn emit_batch<W: Write>(
    store: &mut SessionStore,
    keys: &[String],
    sink: &mut W,
) -> Result<usize> {
    let batch = ClosingBatch::take_from(store, keys);
    if !batch.is_empty() {
        debug!("closing {} session(s)", batch.len());
    }
    batch.write_to(sink)
}

/// Close every session still open at end of input.
///
/// Returns the number of lines written. The store is empty afterwards.
pub fn flush_all<W: Write>(store: &mut SessionStore, sink: &mut W) -> Result<usize> {
    let batch = ClosingBatch::take_all(store);
    if !batch.is_empty() {
        debug!("end of input: flushing {} open session(s)", batch.len());
    }
    batch.write_to(sink)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
