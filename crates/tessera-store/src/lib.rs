//! # Tessera Store - Distribution Records
//!
//! **Purpose**: Durable storage of distribution records and the recovery
//! queries that read them back.
//!
//! A *sender* record says "party P was told about transaction T at temporal
//! key K with visibility V". A *receiver* record says "party S told us about
//! transaction T at temporal key K" and carries the sender's encrypted
//! distribution list. Both exist only while T is unresolved.
//!
//! ## Core Concepts
//!
//! - **Persistence boundary**: every write runs inside one
//!   [`PersistenceBoundary::run_in_transaction`] scope, so a batch becomes
//!   visible completely or not at all.
//! - **Record store**: [`DistributionRecordStore`] inserts, looks up by
//!   transaction and cascades deletes on resolution.
//! - **Recovery queries**: [`RecoveryQueryEngine`] applies a typed
//!   [`RecordFilter`] (time window, exclusions, peers, ordering).
//!
//! ## What's NOT in this crate
//!
//! - Envelope encoding and encryption (`tessera-recovery`, `tessera-crypto`)
//! - Allocation of temporal keys (`tessera-recovery`)

#![forbid(unsafe_code)]

/// Typed predicate over distribution records
pub mod filter;

/// Transactional persistence boundary and the in-memory backend
pub mod persistence;

/// Recovery query engine
pub mod query;

/// Distribution record types and result containers
pub mod records;

/// Record store operations
pub mod store;

/// Inclusive recovery time windows
pub mod window;

pub use filter::RecordFilter;
pub use persistence::{
    DistributionTables, MemoryPersistence, PersistenceBoundary, RecordKey, TableStats,
};
pub use query::RecoveryQueryEngine;
pub use records::{
    DistributionRecord, DistributionRecordType, DistributionRecords, EncryptedEnvelope,
    ReceiverDistributionRecord, SenderDistributionRecord,
};
pub use store::{DeletionOutcome, DistributionRecordStore};
pub use window::RecoveryTimeWindow;
