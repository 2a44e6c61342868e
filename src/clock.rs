use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// Advance
// ---------------------------------------------------------------------------

/// What observing a record's timestamp did to the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// First timestamp of the stream. Nothing can be idle yet.
    First,
    /// Same timestamp as the previous record.
    Same,
    /// The stream moved to a new timestamp; open sessions must be scanned.
    Moved { to: NaiveDateTime },
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Tracks the timestamp of the most recently observed record.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    current: Option<NaiveDateTime>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<NaiveDateTime> {
        self.current
    }

    /// Observe the next record's timestamp and report whether it moved.
    pub fn advance(&mut self, ts: NaiveDateTime) -> Advance {
        let advance = match self.current {
            None => Advance::First,
            Some(prev) if prev == ts => Advance::Same,
            Some(_) => Advance::Moved { to: ts },
        };
        self.current = Some(ts);
        advance
    }
}
