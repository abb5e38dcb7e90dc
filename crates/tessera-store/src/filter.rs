//! Typed predicate over distribution records.
//!
//! A filter combines an inclusive time window, a set of excluded transaction
//! ids, an optional set of peers, and an optional ordering. Every predicate is
//! evaluated over typed values; nothing is spliced into query text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tessera_core::{PartyId, SortDirection, TemporalKey, TxId};

use crate::window::RecoveryTimeWindow;

/// Recovery query filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Inclusive time bound
    pub window: RecoveryTimeWindow,
    /// Transactions to leave out of the result
    pub excluding_tx_ids: BTreeSet<TxId>,
    /// Counterparties to keep; empty means all
    pub peers: BTreeSet<PartyId>,
    /// Timestamp ordering; `None` leaves storage order
    pub order: Option<SortDirection>,
}

impl RecordFilter {
    /// Filter admitting every record inside `window`
    pub fn new(window: RecoveryTimeWindow) -> Self {
        Self {
            window,
            excluding_tx_ids: BTreeSet::new(),
            peers: BTreeSet::new(),
            order: None,
        }
    }

    /// Leave out the given transactions
    pub fn with_excluded(mut self, tx_ids: impl IntoIterator<Item = TxId>) -> Self {
        self.excluding_tx_ids.extend(tx_ids);
        self
    }

    /// Keep only records whose counterparty is one of `peers`
    pub fn with_peers(mut self, peers: impl IntoIterator<Item = PartyId>) -> Self {
        self.peers.extend(peers);
        self
    }

    /// Sort results by timestamp
    pub fn ordered(mut self, order: SortDirection) -> Self {
        self.order = Some(order);
        self
    }

    /// Whether a record with these attributes passes the filter
    pub fn admits(&self, tx_id: &TxId, party_id: PartyId, key: TemporalKey) -> bool {
        self.window.contains(key.timestamp)
            && !self.excluding_tx_ids.contains(tx_id)
            && (self.peers.is_empty() || self.peers.contains(&party_id))
    }

    /// Sort `records` by timestamp according to the filter's ordering.
    ///
    /// The sort is stable, so records sharing a timestamp keep the order in
    /// which storage produced them.
    pub fn apply_order<R>(&self, records: &mut [R], key_of: impl Fn(&R) -> TemporalKey) {
        match self.order {
            Some(SortDirection::Ascending) => {
                records.sort_by_key(|record| key_of(record).timestamp);
            }
            Some(SortDirection::Descending) => {
                records.sort_by_key(|record| std::cmp::Reverse(key_of(record).timestamp));
            }
            None => {}
        }
    }
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self::new(RecoveryTimeWindow::unbounded())
    }
}
