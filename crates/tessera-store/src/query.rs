//! Recovery query engine.
//!
//! Pure reads over the committed snapshot. Sender and receiver records are
//! filtered independently; with [`DistributionRecordType::All`] both passes
//! run against the same snapshot.

use std::sync::Arc;
use tessera_core::{Result, TxId};

use crate::filter::RecordFilter;
use crate::persistence::PersistenceBoundary;
use crate::records::{
    DistributionRecordType, DistributionRecords, ReceiverDistributionRecord,
    SenderDistributionRecord,
};

/// Time-windowed, filterable queries over the record tables
#[derive(Debug)]
pub struct RecoveryQueryEngine<P> {
    persistence: Arc<P>,
}

impl<P> Clone for RecoveryQueryEngine<P> {
    fn clone(&self) -> Self {
        Self {
            persistence: Arc::clone(&self.persistence),
        }
    }
}

impl<P: PersistenceBoundary> RecoveryQueryEngine<P> {
    /// Create an engine reading from `persistence`
    pub fn new(persistence: Arc<P>) -> Self {
        Self { persistence }
    }

    /// Records of `record_type` passing `filter`.
    ///
    /// Returns `None` when nothing matched.
    pub async fn query(
        &self,
        filter: &RecordFilter,
        record_type: DistributionRecordType,
    ) -> Result<Option<DistributionRecords>> {
        let filter = filter.clone();
        let (sender, receiver) = self
            .persistence
            .read(move |tables| {
                let sender = match record_type {
                    DistributionRecordType::Sender | DistributionRecordType::All => {
                        ordered_senders(&filter, tables.scan_sender(&filter))
                    }
                    DistributionRecordType::Receiver => Vec::new(),
                };
                let receiver = match record_type {
                    DistributionRecordType::Receiver | DistributionRecordType::All => {
                        ordered_receivers(&filter, tables.scan_receiver(&filter))
                    }
                    DistributionRecordType::Sender => Vec::new(),
                };
                (sender, receiver)
            })
            .await?;
        tracing::trace!(
            ?record_type,
            sender = sender.len(),
            receiver = receiver.len(),
            "recovery query"
        );
        Ok(DistributionRecords::new(sender, receiver))
    }

    /// Sender records passing `filter`; the peer filter selects peers
    pub async fn query_sender_records(
        &self,
        filter: &RecordFilter,
    ) -> Result<Vec<SenderDistributionRecord>> {
        let filter = filter.clone();
        self.persistence
            .read(move |tables| ordered_senders(&filter, tables.scan_sender(&filter)))
            .await
    }

    /// Receiver records passing `filter`; the peer filter selects senders
    pub async fn query_receiver_records(
        &self,
        filter: &RecordFilter,
    ) -> Result<Vec<ReceiverDistributionRecord>> {
        let filter = filter.clone();
        self.persistence
            .read(move |tables| ordered_receivers(&filter, tables.scan_receiver(&filter)))
            .await
    }

    /// Every sender record for `tx_id`, bypassing the time window
    pub async fn find_sender_records_by_tx(
        &self,
        tx_id: &TxId,
    ) -> Result<Vec<SenderDistributionRecord>> {
        let tx_id = *tx_id;
        self.persistence
            .read(move |tables| tables.sender_by_tx(&tx_id))
            .await
    }
}

fn ordered_senders(
    filter: &RecordFilter,
    mut records: Vec<SenderDistributionRecord>,
) -> Vec<SenderDistributionRecord> {
    filter.apply_order(&mut records, |record| record.temporal_key);
    records
}

fn ordered_receivers(
    filter: &RecordFilter,
    mut records: Vec<ReceiverDistributionRecord>,
) -> Vec<ReceiverDistributionRecord> {
    filter.apply_order(&mut records, |record| record.temporal_key);
    records
}
