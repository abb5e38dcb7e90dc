//! # Tessera Recovery - Distribution Metadata
//!
//! **Purpose**: Record who was told about a transaction before it was
//! finalised, so that a node which loses data can ask its counterparties to
//! help it recover.
//!
//! ## Components
//!
//! - [`TemporalKeyAllocator`]: collision-free `(timestamp, discriminator)` keys
//! - [`DistributionEnvelopeCodec`]: encrypted distribution lists with a
//!   clear-text header
//! - [`RecoveryMetadataCoordinator`]: send, receipt, reconstruction and
//!   resolution on top of `tessera-store`
//! - [`PartyInfoCache`]: in-memory party directory
//!
//! ## Architecture Constraints
//!
//! - Persistence, cipher, directory and clock are injected; nothing here
//!   reads global state.
//! - Every write is one transaction at the persistence boundary.
//! - Errors are returned, never retried.

#![forbid(unsafe_code)]

/// Temporal key allocation
pub mod allocator;

/// Send, receipt, reconstruction and resolution
pub mod coordinator;

/// In-memory party directory
pub mod directory;

/// Distribution list envelopes
pub mod envelope;

pub use allocator::TemporalKeyAllocator;
pub use coordinator::{CoordinatorParts, RecoveryMetadataCoordinator};
pub use directory::{derive_party_id, PartyInfoCache};
pub use envelope::{DistributionEnvelopeCodec, HashedDistributionList, PublicHeader};
