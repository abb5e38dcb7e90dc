//! Recovery metadata coordinator
//!
//! Orchestrates the allocator, the envelope codec and the record store for
//! the three life-cycle events of a transaction's distribution metadata:
//!
//! 1. **Send**: one temporal key for the event, one envelope listing every
//!    peer, one sender record per peer written as a single batch.
//! 2. **Receipt**: the envelope's public header supplies the timestamp, a
//!    fresh discriminator completes the key, one receiver record stores the
//!    envelope unmodified. No decryption happens here.
//! 3. **Resolution**: every record for the transaction is deleted.
//!
//! Identities are resolved before anything is written, so a failed
//! resolution never leaves records behind.

use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::{
    EnvelopeCipher, PartyDirectory, PartyId, PartyName, PhysicalClock, RecoveryConfig,
    RecoveryError, Result, StatesToRecord, TemporalKey, TesseraConfig, TxId,
};
use tessera_store::{
    DeletionOutcome, DistributionRecordStore, DistributionRecordType, DistributionRecords,
    EncryptedEnvelope, PersistenceBoundary, ReceiverDistributionRecord, RecordFilter,
    RecoveryQueryEngine, RecoveryTimeWindow, SenderDistributionRecord,
};

use crate::allocator::TemporalKeyAllocator;
use crate::envelope::{DistributionEnvelopeCodec, HashedDistributionList};

/// Collaborators a coordinator is built from
pub struct CoordinatorParts<P, C, D, K> {
    /// Transactional persistence boundary
    pub persistence: Arc<P>,
    /// Envelope cipher
    pub cipher: Arc<C>,
    /// Party name to id resolution
    pub directory: Arc<D>,
    /// Source of recording timestamps
    pub clock: Arc<K>,
    /// Discriminator counter shared by every coordinator in the process
    pub allocator: Arc<TemporalKeyAllocator>,
}

/// Records, reconstructs and resolves distribution metadata
pub struct RecoveryMetadataCoordinator<P, C, D, K> {
    store: DistributionRecordStore<P>,
    queries: RecoveryQueryEngine<P>,
    codec: DistributionEnvelopeCodec<C>,
    directory: Arc<D>,
    clock: Arc<K>,
    allocator: Arc<TemporalKeyAllocator>,
    config: RecoveryConfig,
}

impl<P, C, D, K> RecoveryMetadataCoordinator<P, C, D, K>
where
    P: PersistenceBoundary,
    C: EnvelopeCipher,
    D: PartyDirectory,
    K: PhysicalClock,
{
    /// Create a coordinator, validating `config`.
    ///
    /// The cipher must be keyed for `config.envelope.context`.
    pub fn new(parts: CoordinatorParts<P, C, D, K>, config: RecoveryConfig) -> Result<Self> {
        config.validate()?;
        let configured = config.envelope.context.as_str();
        if parts.cipher.context() != configured {
            tracing::warn!(
                cipher_context = parts.cipher.context(),
                configured,
                "rejected cipher keyed for another envelope context"
            );
            return Err(RecoveryError::invalid(format!(
                "Cipher is keyed for context '{}', configuration requires '{configured}'",
                parts.cipher.context()
            )));
        }
        Ok(Self {
            store: DistributionRecordStore::new(Arc::clone(&parts.persistence)),
            queries: RecoveryQueryEngine::new(parts.persistence),
            codec: DistributionEnvelopeCodec::new(parts.cipher),
            directory: parts.directory,
            clock: parts.clock,
            allocator: parts.allocator,
            config,
        })
    }

    /// Record store
    pub fn store(&self) -> &DistributionRecordStore<P> {
        &self.store
    }

    /// Query engine
    pub fn queries(&self) -> &RecoveryQueryEngine<P> {
        &self.queries
    }

    /// Envelope codec
    pub fn codec(&self) -> &DistributionEnvelopeCodec<C> {
        &self.codec
    }

    /// Active configuration
    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Record that `tx_id` is being sent to every peer in `peers`.
    ///
    /// Returns the encrypted distribution list for transmission to the peers.
    /// With no peers nothing is written but the envelope is still produced.
    pub async fn record_send(
        &self,
        tx_id: TxId,
        peers: &BTreeMap<PartyName, StatesToRecord>,
        sender_states_to_record: StatesToRecord,
    ) -> Result<EncryptedEnvelope> {
        let limit = self.config.distribution.max_peers_per_send;
        if peers.len() as u64 > limit {
            tracing::warn!(tx_id = %tx_id, peers = peers.len(), limit, "rejected oversized send");
            return Err(RecoveryError::invalid(format!(
                "Send of {tx_id} names {} peers, limit is {limit}",
                peers.len()
            )));
        }

        let resolved = self.resolve_peers(peers).map_err(|err| {
            tracing::warn!(tx_id = %tx_id, error = %err, "could not resolve send peers");
            err
        })?;
        let key = self.allocator.key_at(self.clock.now());
        let envelope = self
            .codec
            .encode_and_encrypt(sender_states_to_record, &resolved, key.timestamp)?;

        let records: Vec<_> = resolved
            .into_iter()
            .map(|(peer_party_id, states_to_record)| SenderDistributionRecord {
                tx_id,
                peer_party_id,
                states_to_record,
                temporal_key: key,
            })
            .collect();
        let peer_count = records.len();
        self.store.insert_sender_records(records).await?;

        tracing::debug!(
            tx_id = %tx_id,
            temporal_key = %key,
            peers = peer_count,
            envelope_bytes = envelope.len(),
            "recorded transaction send"
        );
        Ok(envelope)
    }

    /// Record receipt of `tx_id` from `sender_party_id`.
    ///
    /// Only the public header is read; the envelope is stored unmodified.
    pub async fn record_receipt(
        &self,
        tx_id: TxId,
        sender_party_id: PartyId,
        envelope: EncryptedEnvelope,
    ) -> Result<TemporalKey> {
        let limit = self.config.envelope.max_envelope_bytes;
        if envelope.len() as u64 > limit {
            tracing::warn!(
                tx_id = %tx_id,
                envelope_bytes = envelope.len(),
                limit,
                "rejected oversized envelope"
            );
            return Err(RecoveryError::malformed(format!(
                "Envelope for {tx_id} is {} bytes, limit is {limit}",
                envelope.len()
            )));
        }

        let header = self.codec.read_public_header(envelope.as_bytes())?;
        let key = self.allocator.key_at(header.sender_recorded_timestamp);
        self.store
            .insert_receiver_record(ReceiverDistributionRecord {
                tx_id,
                sender_party_id,
                temporal_key: key,
                envelope,
            })
            .await?;

        tracing::debug!(
            tx_id = %tx_id,
            sender = %sender_party_id,
            temporal_key = %key,
            "recorded transaction receipt"
        );
        Ok(key)
    }

    /// [`record_receipt`](Self::record_receipt) with the sender given by name
    pub async fn record_receipt_from(
        &self,
        tx_id: TxId,
        sender: &PartyName,
        envelope: EncryptedEnvelope,
    ) -> Result<TemporalKey> {
        let sender_party_id = self.directory.resolve(sender)?;
        self.record_receipt(tx_id, sender_party_id, envelope).await
    }

    /// Synthesise the receiver records a peer would hold for `tx_id`.
    ///
    /// Sender records are grouped by temporal key; each group yields one
    /// receiver record whose envelope lists only that group's peers. Each
    /// record gets a fresh discriminator. Nothing is persisted.
    pub fn reconstruct_receiver_records(
        &self,
        tx_id: TxId,
        sender_party_id: PartyId,
        sender_states_to_record: StatesToRecord,
        sender_records: &[SenderDistributionRecord],
    ) -> Result<Vec<ReceiverDistributionRecord>> {
        let mut groups: BTreeMap<TemporalKey, BTreeMap<PartyId, StatesToRecord>> = BTreeMap::new();
        for record in sender_records {
            if record.tx_id != tx_id {
                return Err(RecoveryError::invalid(format!(
                    "Sender record for {} supplied while reconstructing {tx_id}",
                    record.tx_id
                )));
            }
            groups
                .entry(record.temporal_key)
                .or_default()
                .insert(record.peer_party_id, record.states_to_record);
        }

        let reconstructed = groups
            .into_iter()
            .map(|(key, peers)| {
                let list = HashedDistributionList::new(sender_states_to_record, peers, key.timestamp);
                Ok(ReceiverDistributionRecord {
                    tx_id,
                    sender_party_id,
                    temporal_key: self.allocator.key_at(key.timestamp),
                    envelope: self.codec.encrypt_list(&list)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            tx_id = %tx_id,
            events = reconstructed.len(),
            "reconstructed receiver records"
        );
        Ok(reconstructed)
    }

    /// Purge every record for a finalised transaction.
    ///
    /// Safe to call repeatedly; later calls report nothing deleted.
    pub async fn resolve_transaction(&self, tx_id: &TxId) -> Result<DeletionOutcome> {
        let outcome = self.store.delete_all_for_tx(tx_id).await?;
        if outcome.any() {
            tracing::debug!(tx_id = %tx_id, ?outcome, "resolved transaction recovery metadata");
        }
        Ok(outcome)
    }

    /// Authenticate and decode a distribution list envelope
    pub fn decrypt_distribution_list(&self, envelope: &[u8]) -> Result<HashedDistributionList> {
        self.codec.decrypt(envelope)
    }

    /// Recovery query over both tables
    pub async fn query(
        &self,
        filter: &RecordFilter,
        record_type: DistributionRecordType,
    ) -> Result<Option<DistributionRecords>> {
        self.queries.query(filter, record_type).await
    }

    /// Recovery query restricted to counterparties given by name
    pub async fn query_by_peer_names(
        &self,
        window: RecoveryTimeWindow,
        record_type: DistributionRecordType,
        peers: &[PartyName],
    ) -> Result<Option<DistributionRecords>> {
        let ids = self.directory.resolve_all(peers)?;
        let filter = RecordFilter::new(window).with_peers(ids);
        self.queries.query(&filter, record_type).await
    }

    /// Every sender record for `tx_id`, ignoring time
    pub async fn find_sender_records_by_tx(
        &self,
        tx_id: &TxId,
    ) -> Result<Vec<SenderDistributionRecord>> {
        self.queries.find_sender_records_by_tx(tx_id).await
    }

    fn resolve_peers(
        &self,
        peers: &BTreeMap<PartyName, StatesToRecord>,
    ) -> Result<BTreeMap<PartyId, StatesToRecord>> {
        let mut resolved = BTreeMap::new();
        for (name, states_to_record) in peers {
            let id = self.directory.resolve(name)?;
            if resolved.insert(id, *states_to_record).is_some() {
                return Err(RecoveryError::invalid(format!(
                    "Peer {name} resolves to {id}, which another peer already uses"
                )));
            }
        }
        Ok(resolved)
    }
}
