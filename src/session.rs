//! Per-client sessions and the store that owns the open ones.
//!
//! A session is created by the first record seen for a key, absorbs every
//! following record for that key while it stays open, and leaves the store
//! for good when it is closed. A key seen again after closing starts a new
//! session.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::record::{format_timestamp, Record};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Running statistics of one open session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Time of the record that opened the session. Never changes.
    pub first_request_time: NaiveDateTime,
    /// Time of the most recent record for this key.
    pub last_request_time: NaiveDateTime,
    /// Starts at 1 and grows by the elapsed seconds between consecutive
    /// records. Not derived from the endpoints.
    pub duration: i64,
    /// Number of records absorbed, including the opening one.
    pub page_count: u64,
    /// 0-based position of the opening record among the data rows.
    pub origin_line: usize,
}

impl Session {
    /// Open a session from its first record.
    pub fn open(record: &Record, origin_line: usize) -> Self {
        Self {
            first_request_time: record.timestamp,
            last_request_time: record.timestamp,
            duration: 1,
            page_count: 1,
            origin_line,
        }
    }

    /// Absorb a further record for the same key.
    pub fn touch(&mut self, record: &Record) {
        let elapsed = (record.timestamp - self.last_request_time).num_seconds();
        self.page_count += 1;
        self.duration += elapsed;
        self.last_request_time = record.timestamp;
    }

    /// Whole seconds since the last request, as seen from `now`.
    pub fn idle_seconds(&self, now: NaiveDateTime) -> i64 {
        (now - self.last_request_time).num_seconds()
    }

    /// Render the output line, without the trailing newline.
    pub fn to_output_line(&self, key: &str) -> String {
        format!(
            "{},{},{},{},{}",
            key,
            format_timestamp(&self.first_request_time),
            format_timestamp(&self.last_request_time),
            self.duration,
            self.page_count
        )
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Open sessions, at most one per client key.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a record: open a session for an unseen key, otherwise update
    /// the existing one. Returns `true` if a new session was opened.
    pub fn apply(&mut self, record: &Record, origin_line: usize) -> bool {
        match self.sessions.get_mut(&record.key) {
            Some(session) => {
                session.touch(record);
                false
            }
            None => {
                self.sessions
                    .insert(record.key.clone(), Session::open(record, origin_line));
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Session> {
        self.sessions.get(key)
    }

    /// Remove and return the open session for `key`.
    pub fn take(&mut self, key: &str) -> Option<Session> {
        self.sessions.remove(key)
    }

    /// Remove every open session.
    pub fn drain_all(&mut self) -> Vec<(String, Session)> {
        self.sessions.drain().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Session)> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 6, 30)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    // -- Session ---------------------------------------------------------

    #[test]
    fn test_open_session_starts_at_one() {
        let s = Session::open(&Record::new("a", at(0, 0, 0)), 4);
        assert_eq!(s.duration, 1);
        assert_eq!(s.page_count, 1);
        assert_eq!(s.origin_line, 4);
        assert_eq!(s.first_request_time, s.last_request_time);
    }

    #[test]
    fn test_touch_sums_deltas() {
        let mut s = Session::open(&Record::new("a", at(0, 0, 0)), 0);
        s.touch(&Record::new("a", at(0, 0, 2)));
        s.touch(&Record::new("a", at(0, 0, 2)));
        s.touch(&Record::new("a", at(0, 0, 7)));

        assert_eq!(s.page_count, 4);
        // 1 + 2 + 0 + 5
        assert_eq!(s.duration, 8);
        assert_eq!(s.first_request_time, at(0, 0, 0));
        assert_eq!(s.last_request_time, at(0, 0, 7));
    }

    #[test]
    fn test_idle_seconds() {
        let s = Session::open(&Record::new("a", at(0, 0, 3)), 0);
        assert_eq!(s.idle_seconds(at(0, 0, 10)), 7);
        assert_eq!(s.idle_seconds(at(0, 0, 3)), 0);
    }

    #[test]
    fn test_output_line() {
        let mut s = Session::open(&Record::new("1.1.1.1", at(0, 0, 0)), 0);
        s.touch(&Record::new("1.1.1.1", at(0, 0, 3)));
        assert_eq!(
            s.to_output_line("1.1.1.1"),
            "1.1.1.1,2017-06-30 00:00:00,2017-06-30 00:00:03,4,2"
        );
    }

    // -- SessionStore ----------------------------------------------------

    #[test]
    fn test_store_apply_creates_then_updates() {
        let mut store = SessionStore::new();
        assert!(store.apply(&Record::new("a", at(0, 0, 0)), 0));
        assert!(!store.apply(&Record::new("a", at(0, 0, 1)), 1));
        assert_eq!(store.len(), 1);

        let s = store.get("a").unwrap();
        assert_eq!(s.page_count, 2);
        // origin line stays with the opening record
        assert_eq!(s.origin_line, 0);
    }

    #[test]
    fn test_store_keys_are_independent() {
        let mut store = SessionStore::new();
        store.apply(&Record::new("a", at(0, 0, 0)), 0);
        store.apply(&Record::new("b", at(0, 0, 5)), 1);
        store.apply(&Record::new("b", at(0, 0, 9)), 2);

        let a = store.get("a").unwrap();
        assert_eq!((a.duration, a.page_count), (1, 1));
        let b = store.get("b").unwrap();
        assert_eq!((b.duration, b.page_count), (5, 2));
    }

    #[test]
    fn test_take_then_reappear_starts_fresh() {
        let mut store = SessionStore::new();
        store.apply(&Record::new("a", at(0, 0, 0)), 0);
        store.apply(&Record::new("a", at(0, 0, 4)), 1);
        let closed = store.take("a").unwrap();
        assert_eq!(closed.page_count, 2);
        assert!(store.is_empty());

        assert!(store.apply(&Record::new("a", at(0, 1, 0)), 2));
        let s = store.get("a").unwrap();
        assert_eq!((s.duration, s.page_count, s.origin_line), (1, 1, 2));
    }

    #[test]
    fn test_drain_all_empties_store() {
        let mut store = SessionStore::new();
        store.apply(&Record::new("a", at(0, 0, 0)), 0);
        store.apply(&Record::new("b", at(0, 0, 0)), 1);
        let drained = store.drain_all();
        assert_eq!(drained.len(), 2);
        assert!(store.is_empty());
    }
}
