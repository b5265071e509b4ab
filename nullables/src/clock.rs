//! Nullable clock — deterministic time for testing.

use ember_types::Timestamp;
use std::cell::Cell;

/// A deterministic clock for testing.
///
/// Time starts wherever you say and only moves forward when told to,
/// matching how the ledger observes time: a monotone `now` handed in by
/// the caller at each operation.
pub struct NullClock {
    current: Cell<u64>,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: Cell::new(initial_secs),
        }
    }

    /// Get the current time.
    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.current.get())
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: u64) {
        self.current.set(self.current.get() + secs);
    }
}
