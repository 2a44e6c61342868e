use chrono::NaiveDateTime;

use crate::config::InactivityPeriod;
use crate::session::SessionStore;

// ---------------------------------------------------------------------------
// InactivityScanner
// ---------------------------------------------------------------------------

/// Selects open sessions that have been idle for longer than the period.
#[derive(Debug, Clone, Copy)]
pub struct InactivityScanner {
    max_inactive: InactivityPeriod,
}

impl InactivityScanner {
    pub fn new(max_inactive: InactivityPeriod) -> Self {
        Self { max_inactive }
    }

    pub fn max_inactive(&self) -> InactivityPeriod {
        self.max_inactive
    }

    /// Keys of every open session whose gap to `now` strictly exceeds the
    /// inactivity period.
    ///
    /// The order of the returned keys follows the store's iteration order
    /// and carries no meaning; the emitter sorts each batch itself.
    pub fn scan(&self, store: &SessionStore, now: NaiveDateTime) -> Vec<String> {
        store
            .iter()
            .filter(|(_, session)| self.max_inactive.is_exceeded_by(session.idle_seconds(now)))
            .map(|(key, _)| key.clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
