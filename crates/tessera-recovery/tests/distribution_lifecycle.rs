//! Send, receipt and resolution through the coordinator.

mod common;

use assert_matches::assert_matches;
use common::{memory_node, name, node_with, peers, tx};
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::{
    CipherError, EnvelopeCipher, PartyId, PartyName, RecoveryConfig, RecoveryError, StatesToRecord,
};
use tessera_crypto::AeadEnvelopeCipher;
use tessera_recovery::{CoordinatorParts, RecoveryMetadataCoordinator, TemporalKeyAllocator};
use tessera_store::{
    DeletionOutcome, DistributionRecordType, EncryptedEnvelope, MemoryPersistence, RecordFilter,
};
use tessera_testkit::faults::FaultPoint;
use tessera_testkit::{FaultyPersistence, FixedDirectory, ManualClock};

const ALL: StatesToRecord = StatesToRecord::AllVisible;
const RELEVANT: StatesToRecord = StatesToRecord::OnlyRelevant;

#[tokio::test]
async fn send_records_one_row_per_peer_sharing_a_key() {
    let node = memory_node(1);
    let tx_id = tx("send-fan-out");

    node.coordinator
        .record_send(tx_id, &peers(&[(1, ALL), (2, RELEVANT), (3, ALL)]), ALL)
        .await
        .unwrap();

    let records = node.coordinator.find_sender_records_by_tx(&tx_id).await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.temporal_key == records[0].temporal_key));
    assert_eq!(records[0].timestamp(), node.clock_now());
    let by_peer: BTreeMap<_, _> = records
        .iter()
        .map(|r| (r.peer_party_id.value(), r.states_to_record))
        .collect();
    assert_eq!(by_peer, BTreeMap::from([(1, ALL), (2, RELEVANT), (3, ALL)]));
}

#[tokio::test]
async fn failed_commit_leaves_no_sender_records() {
    let persistence = Arc::new(FaultyPersistence::new());
    let node = node_with(
        Arc::clone(&persistence),
        1,
        Arc::new(TemporalKeyAllocator::new()),
        RecoveryConfig::default(),
    );
    let tx_id = tx("atomic-fan-out");
    let fan_out = peers(&[(1, ALL), (2, ALL), (3, RELEVANT), (4, ALL), (5, ALL)]);

    persistence.fail_next_commit();
    let err = node
        .coordinator
        .record_send(tx_id, &fan_out, ALL)
        .await
        .unwrap_err();
    assert!(err.is_persistence());
    assert!(node
        .coordinator
        .find_sender_records_by_tx(&tx_id)
        .await
        .unwrap()
        .is_empty());

    persistence.fail_next(FaultPoint::Begin);
    assert!(node.coordinator.record_send(tx_id, &fan_out, ALL).await.is_err());
    assert_eq!(persistence.inner().stats().total(), 0);

    node.coordinator.record_send(tx_id, &fan_out, ALL).await.unwrap();
    assert_eq!(
        node.coordinator
            .find_sender_records_by_tx(&tx_id)
            .await
            .unwrap()
            .len(),
        5
    );
}

#[tokio::test]
async fn unknown_peer_aborts_before_any_write() {
    let node = memory_node(1);
    let mut fan_out = peers(&[(1, ALL), (2, ALL)]);
    fan_out.insert(PartyName::new("O=Stranger, L=Nowhere, C=ZZ").unwrap(), ALL);

    let err = node
        .coordinator
        .record_send(tx("unknown-peer"), &fan_out, ALL)
        .await
        .unwrap_err();

    assert_matches!(err, RecoveryError::UnknownParty { name } if name.contains("Stranger"));
    assert_eq!(node.persistence.stats().total(), 0);
}

#[tokio::test]
async fn empty_peer_map_writes_nothing_but_returns_envelope() {
    let node = memory_node(1);
    let envelope = node
        .coordinator
        .record_send(tx("no-peers"), &BTreeMap::new(), RELEVANT)
        .await
        .unwrap();

    assert_eq!(node.persistence.stats().total(), 0);
    let list = node
        .coordinator
        .decrypt_distribution_list(envelope.as_bytes())
        .unwrap();
    assert!(list.peer_states_to_record.is_empty());
    assert_eq!(list.sender_states_to_record, RELEVANT);
}

#[tokio::test]
async fn too_many_peers_is_rejected() {
    let mut config = RecoveryConfig::default();
    config.distribution.max_peers_per_send = 2;
    let node = node_with(
        Arc::new(MemoryPersistence::new()),
        1,
        Arc::new(TemporalKeyAllocator::new()),
        config,
    );

    let err = node
        .coordinator
        .record_send(tx("crowd"), &peers(&[(1, ALL), (2, ALL), (3, ALL)]), ALL)
        .await
        .unwrap_err();
    assert_matches!(err, RecoveryError::Invalid { .. });
    assert_eq!(node.persistence.stats().total(), 0);
}

#[tokio::test]
async fn receipt_stores_envelope_for_later_decryption_by_sender() {
    let sender = memory_node(1);
    let receiver = memory_node(2);
    let tx_id = tx("receipt");

    let envelope = sender
        .coordinator
        .record_send(tx_id, &peers(&[(2, RELEVANT), (3, ALL)]), ALL)
        .await
        .unwrap();

    let key = receiver
        .coordinator
        .record_receipt_from(tx_id, &name(1), envelope.clone())
        .await
        .unwrap();
    assert_eq!(key.timestamp, sender.clock_now());

    let stored = receiver
        .coordinator
        .query(&RecordFilter::default(), DistributionRecordType::Receiver)
        .await
        .unwrap()
        .unwrap();
    let record = &stored.receiver_records()[0];
    assert_eq!(record.sender_party_id, PartyId::from_raw(1));
    assert_eq!(record.envelope, envelope);
    assert_eq!(record.temporal_key, key);

    assert_matches!(
        receiver
            .coordinator
            .decrypt_distribution_list(record.envelope.as_bytes()),
        Err(RecoveryError::DecryptionFailure { .. })
    );
    let list = sender
        .coordinator
        .decrypt_distribution_list(record.envelope.as_bytes())
        .unwrap();
    assert_eq!(list.peers().map(|p| p.value()).collect::<Vec<_>>(), vec![2, 3]);
}

#[tokio::test]
async fn receipt_from_unknown_sender_writes_nothing() {
    let sender = memory_node(1);
    let receiver = memory_node(2);
    let envelope = sender
        .coordinator
        .record_send(tx("unknown-sender"), &peers(&[(2, ALL)]), ALL)
        .await
        .unwrap();

    let err = receiver
        .coordinator
        .record_receipt_from(
            tx("unknown-sender"),
            &PartyName::new("O=Ghost, L=Nowhere, C=ZZ").unwrap(),
            envelope,
        )
        .await
        .unwrap_err();
    assert_matches!(err, RecoveryError::UnknownParty { .. });
    assert_eq!(receiver.persistence.stats().total(), 0);
}

#[tokio::test]
async fn oversized_or_malformed_envelopes_are_refused() {
    let mut config = RecoveryConfig::default();
    config.envelope.max_envelope_bytes = 64;
    let node = node_with(
        Arc::new(MemoryPersistence::new()),
        1,
        Arc::new(TemporalKeyAllocator::new()),
        config,
    );

    let oversized = EncryptedEnvelope::new(vec![1; 65]);
    assert_matches!(
        node.coordinator
            .record_receipt(tx("big"), PartyId::from_raw(1), oversized)
            .await,
        Err(RecoveryError::MalformedEnvelope { message }) if message.contains("limit")
    );

    let garbage = EncryptedEnvelope::new(vec![0xEE; 32]);
    assert_matches!(
        node.coordinator
            .record_receipt(tx("garbage"), PartyId::from_raw(1), garbage)
            .await,
        Err(RecoveryError::MalformedEnvelope { .. })
    );
    assert_eq!(node.persistence.stats().total(), 0);
}

#[tokio::test]
async fn configured_context_keys_the_envelope() {
    let mut config = RecoveryConfig::default();
    config.envelope.context = "configured.label".to_string();
    let node = node_with(
        Arc::new(MemoryPersistence::new()),
        4,
        Arc::new(TemporalKeyAllocator::new()),
        config,
    );

    let envelope = node
        .coordinator
        .record_send(tx("configured-context"), &peers(&[(2, ALL)]), ALL)
        .await
        .unwrap();

    let configured = AeadEnvelopeCipher::new([4; 32], "configured.label");
    assert!(configured.decrypt(envelope.as_bytes()).is_ok());
    let default_label = AeadEnvelopeCipher::new([4; 32], RecoveryConfig::default().envelope.context);
    assert_matches!(
        default_label.decrypt(envelope.as_bytes()),
        Err(CipherError::Decryption { .. })
    );
}

#[test]
fn cipher_keyed_for_another_context_is_rejected() {
    let mut config = RecoveryConfig::default();
    config.envelope.context = "configured.label".to_string();

    let built = RecoveryMetadataCoordinator::new(
        CoordinatorParts {
            persistence: Arc::new(MemoryPersistence::new()),
            cipher: Arc::new(AeadEnvelopeCipher::new([4; 32], "some.other.label")),
            directory: Arc::new(FixedDirectory::numbered(1..=2)),
            clock: Arc::new(ManualClock::at_millis(1)),
            allocator: Arc::new(TemporalKeyAllocator::new()),
        },
        config,
    );
    assert_matches!(
        built.err(),
        Some(RecoveryError::Invalid { message }) if message.contains("configured.label")
    );
}

#[tokio::test]
async fn resolution_cascades_and_is_idempotent() {
    let sender = memory_node(1);
    let tx_id = tx("resolve");
    let other = tx("unrelated");

    let envelope = sender
        .coordinator
        .record_send(tx_id, &peers(&[(2, ALL), (3, ALL)]), ALL)
        .await
        .unwrap();
    sender
        .coordinator
        .record_send(other, &peers(&[(2, ALL)]), ALL)
        .await
        .unwrap();
    sender
        .coordinator
        .record_receipt(tx_id, PartyId::from_raw(4), envelope)
        .await
        .unwrap();

    let first = sender.coordinator.resolve_transaction(&tx_id).await.unwrap();
    assert_eq!(
        first,
        DeletionOutcome {
            sender_deleted: true,
            receiver_deleted: true
        }
    );

    assert!(sender
        .coordinator
        .find_sender_records_by_tx(&tx_id)
        .await
        .unwrap()
        .is_empty());
    let receiver_filter = RecordFilter::default().with_excluded([other]);
    assert_eq!(
        sender
            .coordinator
            .query(&receiver_filter, DistributionRecordType::Receiver)
            .await
            .unwrap(),
        None
    );

    let second = sender.coordinator.resolve_transaction(&tx_id).await.unwrap();
    assert_eq!(second, DeletionOutcome::default());

    assert_eq!(
        sender
            .coordinator
            .find_sender_records_by_tx(&other)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn concurrent_double_resolution_deletes_once() {
    let node = Arc::new(memory_node(1));
    let tx_id = tx("double-resolve");
    node.coordinator
        .record_send(tx_id, &peers(&[(2, ALL), (3, ALL)]), ALL)
        .await
        .unwrap();

    let a = {
        let node = Arc::clone(&node);
        tokio::spawn(async move { node.coordinator.resolve_transaction(&tx_id).await })
    };
    let b = {
        let node = Arc::clone(&node);
        tokio::spawn(async move { node.coordinator.resolve_transaction(&tx_id).await })
    };
    let outcomes = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];

    assert_eq!(outcomes.iter().filter(|o| o.sender_deleted).count(), 1);
    assert_eq!(node.persistence.stats().total(), 0);
}
