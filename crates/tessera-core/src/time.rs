//! Physical time values.
//!
//! Timestamps are milliseconds since the UNIX epoch, the same resolution the
//! recovery time windows are expressed in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock instant (ms since UNIX epoch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The UNIX epoch
    pub const MIN: Timestamp = Timestamp(0);
    /// Latest representable instant
    pub const MAX: Timestamp = Timestamp(u64::MAX);

    /// Create from milliseconds since the epoch
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Milliseconds since the epoch
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Convert a `SystemTime`, clamping pre-epoch values to the epoch
    pub fn from_system_time(time: SystemTime) -> Self {
        let ms = time
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self(ms)
    }

    /// Shift forward, saturating at [`Timestamp::MAX`]
    pub const fn saturating_add_millis(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    /// Shift backward, saturating at [`Timestamp::MIN`]
    pub const fn saturating_sub_millis(self, ms: u64) -> Self {
        Self(self.0.saturating_sub(ms))
    }

    /// Shift forward by a duration
    pub fn saturating_add(self, duration: Duration) -> Self {
        self.saturating_add_millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
