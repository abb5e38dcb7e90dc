//! # Tessera Core - Foundation
//!
//! **Purpose**: Define the shared vocabulary of the ledger recovery metadata
//! subsystem: identifiers, temporal keys, visibility policies, the unified
//! error type, configuration, and the effect interfaces consumed from external
//! collaborators.
//!
//! # Architecture Constraints
//!
//! - YES identifier and value types
//! - YES effect traits (clock, party directory, envelope cipher)
//! - YES configuration loading and validation
//! - NO persistence (that's `tessera-store`)
//! - NO cipher implementations (that's `tessera-crypto`)
//! - NO orchestration (that's `tessera-recovery`)

#![forbid(unsafe_code)]

/// Configuration loading, merging and validation
pub mod config;

/// Distribution vocabulary: visibility policy, temporal keys, ordering
pub mod distribution;

/// Effect interfaces consumed from external collaborators
pub mod effects;

/// Unified error handling
pub mod errors;

/// Transaction and party identifiers
pub mod identifiers;

/// Physical time values
pub mod time;

pub use config::{RecoveryConfig, TesseraConfig};
pub use distribution::{SortDirection, StatesToRecord, TemporalKey};
pub use effects::{
    CipherError, EnvelopeCipher, OpenedEnvelope, PartyDirectory, PhysicalClock, SystemClock,
};
pub use errors::{RecoveryError, Result};
pub use identifiers::{PartyId, PartyName, TxId};
pub use time::Timestamp;
