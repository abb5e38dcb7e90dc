//! Distribution record types and result containers.

use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_core::{PartyId, StatesToRecord, TemporalKey, Timestamp, TxId};

/// Opaque encrypted distribution list as produced by the envelope codec
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptedEnvelope(#[serde(with = "serde_bytes")] Vec<u8>);

impl EncryptedEnvelope {
    /// Wrap encrypted bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Envelope size in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the envelope is empty (never true for codec output)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take the raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for EncryptedEnvelope {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for EncryptedEnvelope {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EncryptedEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedEnvelope({} bytes)", self.0.len())
    }
}

/// One peer notified by one send event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderDistributionRecord {
    /// Transaction that was sent
    pub tx_id: TxId,
    /// Peer that received it
    pub peer_party_id: PartyId,
    /// Visibility granted to the peer
    pub states_to_record: StatesToRecord,
    /// Key shared by every record of the same send event
    pub temporal_key: TemporalKey,
}

impl SenderDistributionRecord {
    /// Instant the send was recorded
    pub fn timestamp(&self) -> Timestamp {
        self.temporal_key.timestamp
    }
}

/// One receipt of a transaction from a sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverDistributionRecord {
    /// Transaction that was received
    pub tx_id: TxId,
    /// Party that sent it
    pub sender_party_id: PartyId,
    /// Sender's recording timestamp with a locally drawn discriminator
    pub temporal_key: TemporalKey,
    /// Sender's encrypted distribution list, stored unmodified
    pub envelope: EncryptedEnvelope,
}

impl ReceiverDistributionRecord {
    /// Sender's recording timestamp
    pub fn timestamp(&self) -> Timestamp {
        self.temporal_key.timestamp
    }
}

/// Query selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistributionRecordType {
    /// Sender records only
    Sender,
    /// Receiver records only
    Receiver,
    /// Both record sets, filtered independently
    #[default]
    All,
}

/// Either kind of distribution record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionRecord {
    /// Sender-side record
    Sender(SenderDistributionRecord),
    /// Receiver-side record
    Receiver(ReceiverDistributionRecord),
}

impl DistributionRecord {
    /// Transaction the record describes
    pub fn tx_id(&self) -> &TxId {
        match self {
            Self::Sender(record) => &record.tx_id,
            Self::Receiver(record) => &record.tx_id,
        }
    }

    /// Counterparty: the peer for sender records, the sender for receiver records
    pub fn party_id(&self) -> PartyId {
        match self {
            Self::Sender(record) => record.peer_party_id,
            Self::Receiver(record) => record.sender_party_id,
        }
    }

    /// Temporal key of the distribution event
    pub fn temporal_key(&self) -> TemporalKey {
        match self {
            Self::Sender(record) => record.temporal_key,
            Self::Receiver(record) => record.temporal_key,
        }
    }

    /// Recording timestamp
    pub fn timestamp(&self) -> Timestamp {
        self.temporal_key().timestamp
    }

    /// Which table the record lives in
    pub fn record_type(&self) -> DistributionRecordType {
        match self {
            Self::Sender(_) => DistributionRecordType::Sender,
            Self::Receiver(_) => DistributionRecordType::Receiver,
        }
    }
}

/// Non-empty query result.
///
/// There is deliberately no empty state: a query that matches nothing yields
/// `None` instead, and callers branch on which sets are populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionRecords {
    /// Only sender records matched
    Sender(Vec<SenderDistributionRecord>),
    /// Only receiver records matched
    Receiver(Vec<ReceiverDistributionRecord>),
    /// Both sets matched
    Both {
        /// Matching sender records
        sender: Vec<SenderDistributionRecord>,
        /// Matching receiver records
        receiver: Vec<ReceiverDistributionRecord>,
    },
}

impl DistributionRecords {
    /// Build a result, or `None` if both sets are empty
    pub fn new(
        sender: Vec<SenderDistributionRecord>,
        receiver: Vec<ReceiverDistributionRecord>,
    ) -> Option<Self> {
        match (sender.is_empty(), receiver.is_empty()) {
            (true, true) => None,
            (false, true) => Some(Self::Sender(sender)),
            (true, false) => Some(Self::Receiver(receiver)),
            (false, false) => Some(Self::Both { sender, receiver }),
        }
    }

    /// Sender records (empty slice if none matched)
    pub fn sender_records(&self) -> &[SenderDistributionRecord] {
        match self {
            Self::Sender(sender) | Self::Both { sender, .. } => sender,
            Self::Receiver(_) => &[],
        }
    }

    /// Receiver records (empty slice if none matched)
    pub fn receiver_records(&self) -> &[ReceiverDistributionRecord] {
        match self {
            Self::Receiver(receiver) | Self::Both { receiver, .. } => receiver,
            Self::Sender(_) => &[],
        }
    }

    /// Total number of records; always at least one
    pub fn size(&self) -> usize {
        self.sender_records().len() + self.receiver_records().len()
    }

    /// Iterate over tagged copies of every record, sender records first
    pub fn iter(&self) -> impl Iterator<Item = DistributionRecord> + '_ {
        self.sender_records()
            .iter()
            .cloned()
            .map(DistributionRecord::Sender)
            .chain(
                self.receiver_records()
                    .iter()
                    .cloned()
                    .map(DistributionRecord::Receiver),
            )
    }

    /// Flatten into tagged records, sender records first
    pub fn into_records(self) -> Vec<DistributionRecord> {
        let (sender, receiver) = match self {
            Self::Sender(sender) => (sender, Vec::new()),
            Self::Receiver(receiver) => (Vec::new(), receiver),
            Self::Both { sender, receiver } => (sender, receiver),
        };
        sender
            .into_iter()
            .map(DistributionRecord::Sender)
            .chain(receiver.into_iter().map(DistributionRecord::Receiver))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(tx: u8) -> SenderDistributionRecord {
        SenderDistributionRecord {
            tx_id: TxId::from_bytes([tx; 32]),
            peer_party_id: PartyId::from_raw(1),
            states_to_record: StatesToRecord::OnlyRelevant,
            temporal_key: TemporalKey::new(Timestamp::from_millis(5), 0),
        }
    }

    fn receiver(tx: u8) -> ReceiverDistributionRecord {
        ReceiverDistributionRecord {
            tx_id: TxId::from_bytes([tx; 32]),
            sender_party_id: PartyId::from_raw(2),
            temporal_key: TemporalKey::new(Timestamp::from_millis(6), 1),
            envelope: EncryptedEnvelope::new(vec![1, 2, 3]),
        }
    }

    #[test]
    fn empty_results_are_not_constructible() {
        assert!(DistributionRecords::new(Vec::new(), Vec::new()).is_none());
    }

    #[test]
    fn variant_follows_populated_sets() {
        let only_sender = DistributionRecords::new(vec![sender(1)], Vec::new()).unwrap();
        assert!(matches!(only_sender, DistributionRecords::Sender(_)));
        assert!(only_sender.receiver_records().is_empty());

        let only_receiver = DistributionRecords::new(Vec::new(), vec![receiver(1)]).unwrap();
        assert!(matches!(only_receiver, DistributionRecords::Receiver(_)));

        let both = DistributionRecords::new(vec![sender(1)], vec![receiver(2)]).unwrap();
        assert_eq!(both.size(), 2);
        assert_eq!(both.iter().count(), 2);
        let tagged = both.into_records();
        assert_eq!(tagged[0].record_type(), DistributionRecordType::Sender);
        assert_eq!(tagged[1].party_id(), PartyId::from_raw(2));
        assert_eq!(tagged[1].timestamp(), Timestamp::from_millis(6));
    }

    #[test]
    fn envelope_debug_hides_contents() {
        let envelope = EncryptedEnvelope::new(vec![0xAA; 40]);
        assert_eq!(format!("{envelope:?}"), "EncryptedEnvelope(40 bytes)");
    }
}
