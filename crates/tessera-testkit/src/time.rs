//! Manually driven clock for deterministic temporal keys.
//!
//! Unlike a process-wide controller, each [`ManualClock`] is its own instance,
//! so tests running in parallel never observe each other's time.

use parking_lot::Mutex;
use std::time::Duration;
use tessera_core::{PhysicalClock, Timestamp};

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    /// Clock frozen at `start`
    pub fn at(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Clock frozen at `millis` milliseconds past the epoch
    pub fn at_millis(millis: u64) -> Self {
        Self::at(Timestamp::from_millis(millis))
    }

    /// Move the clock to `time`, forwards or backwards
    pub fn set(&self, time: Timestamp) {
        *self.now.lock() = time;
    }

    /// Advance the clock by `duration`
    pub fn advance_by(&self, duration: Duration) {
        let mut now = self.now.lock();
        *now = now.saturating_add(duration);
    }

    /// Advance the clock by `millis` milliseconds
    pub fn advance_millis(&self, millis: u64) {
        let mut now = self.now.lock();
        *now = now.saturating_add_millis(millis);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(Timestamp::MIN)
    }
}

impl PhysicalClock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}
