//! Transactional persistence boundary.
//!
//! Every store write runs inside [`PersistenceBoundary::run_in_transaction`].
//! The closure receives mutable access to the record tables; returning `Err`
//! from it (or from anything it calls) discards every change made in that
//! scope. Reads see the latest committed snapshot only.
//!
//! [`MemoryPersistence`] implements the boundary with copy-on-write tables:
//! a unit of work mutates a private copy that replaces the committed tables
//! only on success. Writers are serialised; readers never block on writers
//! beyond the pointer swap.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tessera_core::{PartyId, RecoveryError, Result, StatesToRecord, TemporalKey, Timestamp, TxId};

use crate::filter::RecordFilter;
use crate::records::{EncryptedEnvelope, ReceiverDistributionRecord, SenderDistributionRecord};

/// Composite primary key shared by both record tables.
///
/// Field order gives the physical ordering: by party first, so one party's
/// rows inside a time window form a contiguous range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    /// Peer (sender table) or sender (receiver table)
    pub party_id: PartyId,
    /// Recording instant
    pub timestamp: Timestamp,
    /// Event discriminator
    pub discriminator: u32,
}

impl RecordKey {
    /// Key for `party_id` at `temporal_key`
    pub fn new(party_id: PartyId, temporal_key: TemporalKey) -> Self {
        Self {
            party_id,
            timestamp: temporal_key.timestamp,
            discriminator: temporal_key.discriminator,
        }
    }

    /// Temporal part of the key
    pub fn temporal_key(&self) -> TemporalKey {
        TemporalKey::new(self.timestamp, self.discriminator)
    }

    fn party_range(party_id: PartyId, from: Timestamp, until: Timestamp) -> RangeInclusive<Self> {
        Self {
            party_id,
            timestamp: from,
            discriminator: 0,
        }..=Self {
            party_id,
            timestamp: until,
            discriminator: u32::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SenderRow {
    tx_id: TxId,
    states_to_record: StatesToRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ReceiverRow {
    tx_id: TxId,
    envelope: EncryptedEnvelope,
}

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    /// Rows in the sender table
    pub sender_records: usize,
    /// Rows in the receiver table
    pub receiver_records: usize,
}

impl TableStats {
    /// Rows across both tables
    pub fn total(&self) -> usize {
        self.sender_records + self.receiver_records
    }
}

/// The two distribution record tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionTables {
    sender: BTreeMap<RecordKey, SenderRow>,
    receiver: BTreeMap<RecordKey, ReceiverRow>,
}

impl DistributionTables {
    /// Insert a sender record; a duplicate key is a constraint violation
    pub fn insert_sender(&mut self, record: SenderDistributionRecord) -> Result<()> {
        let key = RecordKey::new(record.peer_party_id, record.temporal_key);
        if self.sender.contains_key(&key) {
            return Err(RecoveryError::constraint_violation(format!(
                "duplicate sender record for {} at {}",
                key.party_id, record.temporal_key
            )));
        }
        self.sender.insert(
            key,
            SenderRow {
                tx_id: record.tx_id,
                states_to_record: record.states_to_record,
            },
        );
        Ok(())
    }

    /// Insert a receiver record; a duplicate key is a constraint violation
    pub fn insert_receiver(&mut self, record: ReceiverDistributionRecord) -> Result<()> {
        let key = RecordKey::new(record.sender_party_id, record.temporal_key);
        if self.receiver.contains_key(&key) {
            return Err(RecoveryError::constraint_violation(format!(
                "duplicate receiver record for {} at {}",
                key.party_id, record.temporal_key
            )));
        }
        self.receiver.insert(
            key,
            ReceiverRow {
                tx_id: record.tx_id,
                envelope: record.envelope,
            },
        );
        Ok(())
    }

    /// Sender records passing `filter`, in key order
    pub fn scan_sender(&self, filter: &RecordFilter) -> Vec<SenderDistributionRecord> {
        scan(&self.sender, filter, |row| &row.tx_id)
            .map(|(key, row)| sender_record(key, row))
            .collect()
    }

    /// Receiver records passing `filter`, in key order
    pub fn scan_receiver(&self, filter: &RecordFilter) -> Vec<ReceiverDistributionRecord> {
        scan(&self.receiver, filter, |row| &row.tx_id)
            .map(|(key, row)| receiver_record(key, row))
            .collect()
    }

    /// Every sender record for `tx_id`, ordered by temporal key then peer
    pub fn sender_by_tx(&self, tx_id: &TxId) -> Vec<SenderDistributionRecord> {
        let mut records: Vec<_> = self
            .sender
            .iter()
            .filter(|(_, row)| row.tx_id == *tx_id)
            .map(|(key, row)| sender_record(key, row))
            .collect();
        records.sort_by_key(|record| (record.temporal_key, record.peer_party_id));
        records
    }

    /// Every receiver record for `tx_id`, ordered by temporal key then sender
    pub fn receiver_by_tx(&self, tx_id: &TxId) -> Vec<ReceiverDistributionRecord> {
        let mut records: Vec<_> = self
            .receiver
            .iter()
            .filter(|(_, row)| row.tx_id == *tx_id)
            .map(|(key, row)| receiver_record(key, row))
            .collect();
        records.sort_by_key(|record| (record.temporal_key, record.sender_party_id));
        records
    }

    /// Remove every row for `tx_id`, returning `(sender, receiver)` row counts
    pub fn delete_tx(&mut self, tx_id: &TxId) -> (usize, usize) {
        let sender_before = self.sender.len();
        self.sender.retain(|_, row| row.tx_id != *tx_id);
        let receiver_before = self.receiver.len();
        self.receiver.retain(|_, row| row.tx_id != *tx_id);
        (
            sender_before - self.sender.len(),
            receiver_before - self.receiver.len(),
        )
    }

    /// Current row counts
    pub fn stats(&self) -> TableStats {
        TableStats {
            sender_records: self.sender.len(),
            receiver_records: self.receiver.len(),
        }
    }
}

fn sender_record(key: &RecordKey, row: &SenderRow) -> SenderDistributionRecord {
    SenderDistributionRecord {
        tx_id: row.tx_id,
        peer_party_id: key.party_id,
        states_to_record: row.states_to_record,
        temporal_key: key.temporal_key(),
    }
}

fn receiver_record(key: &RecordKey, row: &ReceiverRow) -> ReceiverDistributionRecord {
    ReceiverDistributionRecord {
        tx_id: row.tx_id,
        sender_party_id: key.party_id,
        temporal_key: key.temporal_key(),
        envelope: row.envelope.clone(),
    }
}

/// Rows of `table` admitted by `filter`.
///
/// With a peer filter each peer's window is a key range; otherwise the whole
/// table is walked.
fn scan<'a, R>(
    table: &'a BTreeMap<RecordKey, R>,
    filter: &'a RecordFilter,
    tx_of: impl Fn(&R) -> &TxId + 'a,
) -> Box<dyn Iterator<Item = (&'a RecordKey, &'a R)> + 'a> {
    let admitted = move |(key, row): &(&RecordKey, &R)| {
        filter.admits(tx_of(row), key.party_id, key.temporal_key())
    };
    let (from, until) = (filter.window.from_time(), filter.window.until_time());
    if from > until {
        // Only reachable through a deserialised window; `between` rejects it.
        return Box::new(std::iter::empty());
    }
    if filter.peers.is_empty() {
        Box::new(table.iter().filter(admitted))
    } else {
        Box::new(
            filter
                .peers
                .iter()
                .flat_map(move |peer| table.range(RecordKey::party_range(*peer, from, until)))
                .filter(admitted),
        )
    }
}

/// Transactional unit-of-work seam over the record tables
#[async_trait]
pub trait PersistenceBoundary: Send + Sync {
    /// Run a read-only query against the latest committed snapshot
    async fn read<T, F>(&self, query: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DistributionTables) -> T + Send + 'static;

    /// Run `work` as one atomic unit.
    ///
    /// Changes become visible to readers only if `work` returns `Ok`.
    async fn run_in_transaction<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut DistributionTables) -> Result<T> + Send + 'static;
}

/// Blanket implementation for Arc<P> where P: PersistenceBoundary
#[async_trait]
impl<P: PersistenceBoundary + ?Sized> PersistenceBoundary for Arc<P> {
    async fn read<T, F>(&self, query: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DistributionTables) -> T + Send + 'static,
    {
        (**self).read(query).await
    }

    async fn run_in_transaction<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut DistributionTables) -> Result<T> + Send + 'static,
    {
        (**self).run_in_transaction(work).await
    }
}

/// In-memory copy-on-write persistence
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    committed: RwLock<Arc<DistributionTables>>,
    writer: Mutex<()>,
}

impl MemoryPersistence {
    /// Create empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest committed tables
    pub fn snapshot(&self) -> Arc<DistributionTables> {
        Arc::clone(&self.committed.read())
    }

    /// Row counts of the latest committed tables
    pub fn stats(&self) -> TableStats {
        self.committed.read().stats()
    }

    fn commit<T>(
        &self,
        work: impl FnOnce(&mut DistributionTables) -> Result<T>,
    ) -> Result<T> {
        let _writer = self.writer.lock();
        let mut working = DistributionTables::clone(&*self.snapshot());
        match work(&mut working) {
            Ok(value) => {
                *self.committed.write() = Arc::new(working);
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(error = %err, "rolling back distribution table transaction");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl PersistenceBoundary for MemoryPersistence {
    async fn read<T, F>(&self, query: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DistributionTables) -> T + Send + 'static,
    {
        let snapshot = self.snapshot();
        Ok(query(&*snapshot))
    }

    async fn run_in_transaction<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut DistributionTables) -> Result<T> + Send + 'static,
    {
        self.commit(work)
    }
}
