//! Effect interfaces consumed from external collaborators.
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `tessera-crypto` (cipher), `tessera-recovery` (directory),
//!   `tessera-testkit` (deterministic test doubles)
//!
//! All effects here are synchronous and free of shared mutable state, so they
//! can be invoked concurrently without external locking. The only suspension
//! point in the subsystem is the persistence boundary in `tessera-store`.

/// Envelope encryption with a clear-text associated-data section
pub mod cipher;

/// Party name to party id resolution
pub mod directory;

/// Injected wall clock
pub mod time;

pub use cipher::{CipherError, EnvelopeCipher, OpenedEnvelope};
pub use directory::PartyDirectory;
pub use time::{PhysicalClock, SystemClock};
