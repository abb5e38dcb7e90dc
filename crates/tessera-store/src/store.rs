//! Distribution record store.
//!
//! Thin, transactional CRUD over the two record tables. Every write is one
//! unit of work against the persistence boundary; multi-record inserts are
//! all-or-nothing.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tessera_core::{Result, TxId};

use crate::persistence::{PersistenceBoundary, TableStats};
use crate::records::{ReceiverDistributionRecord, SenderDistributionRecord};

/// Which tables lost rows in a cascading delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeletionOutcome {
    /// At least one sender record was removed
    pub sender_deleted: bool,
    /// At least one receiver record was removed
    pub receiver_deleted: bool,
}

impl DeletionOutcome {
    /// Whether anything was removed
    pub fn any(&self) -> bool {
        self.sender_deleted || self.receiver_deleted
    }
}

/// Durable sender/receiver distribution records
#[derive(Debug)]
pub struct DistributionRecordStore<P> {
    persistence: Arc<P>,
}

impl<P> Clone for DistributionRecordStore<P> {
    fn clone(&self) -> Self {
        Self {
            persistence: Arc::clone(&self.persistence),
        }
    }
}

impl<P: PersistenceBoundary> DistributionRecordStore<P> {
    /// Create a store over a shared persistence boundary
    pub fn new(persistence: Arc<P>) -> Self {
        Self { persistence }
    }

    /// Underlying persistence boundary
    pub fn persistence(&self) -> &Arc<P> {
        &self.persistence
    }

    /// Insert every record in one transaction; all-or-nothing
    pub async fn insert_sender_records(
        &self,
        records: Vec<SenderDistributionRecord>,
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let count = records.len();
        let tx_id = records[0].tx_id;
        self.persistence
            .run_in_transaction(move |tables| {
                records
                    .into_iter()
                    .try_for_each(|record| tables.insert_sender(record))
            })
            .await?;
        tracing::debug!(tx_id = %tx_id, count, "inserted sender distribution records");
        Ok(())
    }

    /// Insert one sender record
    pub async fn insert_sender_record(&self, record: SenderDistributionRecord) -> Result<()> {
        self.insert_sender_records(vec![record]).await
    }

    /// Insert one receiver record
    pub async fn insert_receiver_record(&self, record: ReceiverDistributionRecord) -> Result<()> {
        self.insert_receiver_records(vec![record]).await
    }

    /// Insert several receiver records in one transaction; all-or-nothing
    pub async fn insert_receiver_records(
        &self,
        records: Vec<ReceiverDistributionRecord>,
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let count = records.len();
        let tx_id = records[0].tx_id;
        self.persistence
            .run_in_transaction(move |tables| {
                records
                    .into_iter()
                    .try_for_each(|record| tables.insert_receiver(record))
            })
            .await?;
        tracing::debug!(tx_id = %tx_id, count, "inserted receiver distribution records");
        Ok(())
    }

    /// Every sender record for `tx_id`, ignoring time.
    ///
    /// Ordered by temporal key then peer, so records of one send event are
    /// contiguous.
    pub async fn find_sender_records_by_tx(
        &self,
        tx_id: &TxId,
    ) -> Result<Vec<SenderDistributionRecord>> {
        let tx_id = *tx_id;
        self.persistence
            .read(move |tables| tables.sender_by_tx(&tx_id))
            .await
    }

    /// Every receiver record for `tx_id`, ignoring time
    pub async fn find_receiver_records_by_tx(
        &self,
        tx_id: &TxId,
    ) -> Result<Vec<ReceiverDistributionRecord>> {
        let tx_id = *tx_id;
        self.persistence
            .read(move |tables| tables.receiver_by_tx(&tx_id))
            .await
    }

    /// Delete every sender and receiver record for `tx_id` atomically.
    ///
    /// Deleting a transaction with no records is not an error.
    pub async fn delete_all_for_tx(&self, tx_id: &TxId) -> Result<DeletionOutcome> {
        let tx_id = *tx_id;
        let (sender, receiver) = self
            .persistence
            .run_in_transaction(move |tables| Ok(tables.delete_tx(&tx_id)))
            .await?;
        tracing::debug!(
            tx_id = %tx_id,
            sender_rows = sender,
            receiver_rows = receiver,
            "deleted distribution records"
        );
        Ok(DeletionOutcome {
            sender_deleted: sender > 0,
            receiver_deleted: receiver > 0,
        })
    }

    /// Row counts of the committed tables
    pub async fn stats(&self) -> Result<TableStats> {
        self.persistence.read(|tables| tables.stats()).await
    }
}
