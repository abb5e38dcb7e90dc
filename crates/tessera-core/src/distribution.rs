//! Distribution vocabulary shared by every layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::RecoveryError;
use crate::time::Timestamp;

/// Visibility policy granted to a party over the states of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatesToRecord {
    /// Record the transaction but none of its states
    None,
    /// Record every visible state, relevant or not
    AllVisible,
    /// Record only states the party participates in
    OnlyRelevant,
}

impl StatesToRecord {
    /// Canonical upper-case name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::AllVisible => "ALL_VISIBLE",
            Self::OnlyRelevant => "ONLY_RELEVANT",
        }
    }
}

impl fmt::Display for StatesToRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatesToRecord {
    type Err = RecoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(Self::None),
            "ALL_VISIBLE" => Ok(Self::AllVisible),
            "ONLY_RELEVANT" => Ok(Self::OnlyRelevant),
            other => Err(RecoveryError::invalid(format!(
                "Unknown states-to-record policy: {other}"
            ))),
        }
    }
}

/// Unique, orderable identity of one distribution event.
///
/// Ordered by timestamp first and discriminator second. Every record produced
/// by the same send (or receive) shares one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemporalKey {
    /// Instant the event was recorded
    pub timestamp: Timestamp,
    /// Tie-breaker for events within the same clock tick
    pub discriminator: u32,
}

impl TemporalKey {
    /// Pair a timestamp with a discriminator
    pub const fn new(timestamp: Timestamp, discriminator: u32) -> Self {
        Self {
            timestamp,
            discriminator,
        }
    }
}

impl fmt::Display for TemporalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.timestamp, self.discriminator)
    }
}

/// Sort direction for timestamp-ordered queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    /// Oldest first
    Ascending,
    /// Newest first
    Descending,
}
