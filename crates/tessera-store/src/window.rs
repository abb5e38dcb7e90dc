//! Inclusive recovery time windows.

use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_core::{RecoveryError, Result, Timestamp};

/// Inclusive `[from_time, until_time]` bound for recovery queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecoveryTimeWindow {
    from_time: Timestamp,
    until_time: Timestamp,
}

impl RecoveryTimeWindow {
    /// Window between two instants, both included
    pub fn between(from_time: Timestamp, until_time: Timestamp) -> Result<Self> {
        if from_time > until_time {
            return Err(RecoveryError::invalid(format!(
                "Recovery window starts ({from_time}) after it ends ({until_time})"
            )));
        }
        Ok(Self {
            from_time,
            until_time,
        })
    }

    /// Everything at or after `from_time`
    pub fn since(from_time: Timestamp) -> Self {
        Self {
            from_time,
            until_time: Timestamp::MAX,
        }
    }

    /// Everything at or before `until_time`
    pub fn until(until_time: Timestamp) -> Self {
        Self {
            from_time: Timestamp::MIN,
            until_time,
        }
    }

    /// All time
    pub fn unbounded() -> Self {
        Self {
            from_time: Timestamp::MIN,
            until_time: Timestamp::MAX,
        }
    }

    /// Lower bound
    pub fn from_time(&self) -> Timestamp {
        self.from_time
    }

    /// Upper bound
    pub fn until_time(&self) -> Timestamp {
        self.until_time
    }

    /// Whether `timestamp` falls inside the window
    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.from_time <= timestamp && timestamp <= self.until_time
    }
}

impl fmt::Display for RecoveryTimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from_time, self.until_time)
    }
}
