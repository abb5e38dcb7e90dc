//! Transaction and party identifiers
//!
//! `TxId` is the content hash of a transaction. `PartyName` is the
//! human-readable distinguished name of a counterparty and `PartyId` the
//! compact numeric id a party directory assigns to it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::RecoveryError;

/// Transaction identifier (32-byte secure hash)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId([u8; 32]);

impl TxId {
    /// Wrap raw hash bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive an id by hashing transaction content
    pub fn from_content(content: &[u8]) -> Self {
        Self(*blake3::hash(content).as_bytes())
    }

    /// Raw hash bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", &hex::encode_upper(self.0)[..12])
    }
}

impl FromStr for TxId {
    type Err = RecoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)
            .map_err(|e| RecoveryError::invalid(format!("Invalid transaction id: {e}")))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            RecoveryError::invalid(format!(
                "Invalid transaction id length: expected 32 bytes, got {}",
                v.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

/// Compact, process-stable numeric identifier of a counterparty.
///
/// Ids are issued by a [`PartyDirectory`](crate::effects::PartyDirectory);
/// application code obtains them by resolving a [`PartyName`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyId(u64);

impl PartyId {
    /// Construct from the raw directory value
    ///
    /// Intended for directory implementations and for rehydrating persisted rows.
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Raw directory value
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "party-{}", self.0)
    }
}

/// Distinguished name of a counterparty, e.g. `O=Bank A, L=London, C=GB`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyName(String);

impl PartyName {
    /// Create a party name
    ///
    /// Whitespace around attribute separators is normalised so that
    /// `O=A,L=B` and `O=A, L=B` name the same party.
    pub fn new(name: impl AsRef<str>) -> Result<Self, RecoveryError> {
        let normalised = name
            .as_ref()
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if normalised.is_empty() {
            return Err(RecoveryError::invalid("Party name cannot be empty"));
        }
        Ok(Self(normalised))
    }

    /// The normalised name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PartyName {
    type Err = RecoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
