//! Record store and query engine over the persistence boundary.

use assert_matches::assert_matches;
use proptest::prelude::*;
use std::sync::Arc;
use tessera_core::{PartyId, RecoveryError, StatesToRecord, TemporalKey, Timestamp, TxId};
use tessera_store::{
    DistributionRecordStore, DistributionRecordType, EncryptedEnvelope, MemoryPersistence,
    ReceiverDistributionRecord, RecordFilter, RecoveryQueryEngine, RecoveryTimeWindow,
    SenderDistributionRecord,
};
use tessera_testkit::strategies::{arb_party_id, arb_temporal_key, arb_timestamp, arb_tx_id};
use tessera_testkit::FaultyPersistence;

fn sender(tx_id: TxId, peer: u64, key: TemporalKey) -> SenderDistributionRecord {
    SenderDistributionRecord {
        tx_id,
        peer_party_id: PartyId::from_raw(peer),
        states_to_record: StatesToRecord::AllVisible,
        temporal_key: key,
    }
}

fn key(ms: u64, discriminator: u32) -> TemporalKey {
    TemporalKey::new(Timestamp::from_millis(ms), discriminator)
}

fn tx(byte: u8) -> TxId {
    TxId::from_bytes([byte; 32])
}

#[tokio::test]
async fn injected_commit_failure_hides_whole_batch() {
    tessera_testkit::init_test_tracing();
    let persistence = Arc::new(FaultyPersistence::new());
    let store = DistributionRecordStore::new(Arc::clone(&persistence));
    let batch: Vec<_> = (1..=5).map(|peer| sender(tx(1), peer, key(10, 0))).collect();

    persistence.fail_next_commit();
    let err = store.insert_sender_records(batch.clone()).await.unwrap_err();
    assert!(err.is_persistence());
    assert!(store.find_sender_records_by_tx(&tx(1)).await.unwrap().is_empty());

    store.insert_sender_records(batch).await.unwrap();
    assert_eq!(store.find_sender_records_by_tx(&tx(1)).await.unwrap().len(), 5);
    assert_eq!(persistence.transactions_attempted(), 2);
}

#[tokio::test]
async fn duplicate_within_batch_rolls_back_everything() {
    let store = DistributionRecordStore::new(Arc::new(MemoryPersistence::new()));
    let err = store
        .insert_sender_records(vec![
            sender(tx(1), 1, key(10, 0)),
            sender(tx(1), 2, key(10, 0)),
            sender(tx(1), 1, key(10, 0)),
        ])
        .await
        .unwrap_err();

    assert_matches!(err, RecoveryError::Persistence { ref message } if message.contains("Constraint violation"));
    assert_eq!(store.stats().await.unwrap().total(), 0);
}

#[tokio::test]
async fn receiver_batch_is_atomic_too() {
    let persistence = Arc::new(FaultyPersistence::new());
    let store = DistributionRecordStore::new(Arc::clone(&persistence));
    let receiver = |discriminator| ReceiverDistributionRecord {
        tx_id: tx(3),
        sender_party_id: PartyId::from_raw(4),
        temporal_key: key(50, discriminator),
        envelope: EncryptedEnvelope::new(vec![9; 40]),
    };

    persistence.fail_next_commit();
    assert!(store
        .insert_receiver_records(vec![receiver(0), receiver(1)])
        .await
        .is_err());
    assert!(store.find_receiver_records_by_tx(&tx(3)).await.unwrap().is_empty());
}

#[tokio::test]
async fn queries_see_committed_state_only() {
    let persistence = Arc::new(FaultyPersistence::new());
    let store = DistributionRecordStore::new(Arc::clone(&persistence));
    let engine = RecoveryQueryEngine::new(Arc::clone(&persistence));

    store.insert_sender_record(sender(tx(1), 1, key(5, 0))).await.unwrap();
    persistence.fail_next_commit();
    let _ = store.delete_all_for_tx(&tx(1)).await;

    let found = engine
        .query(&RecordFilter::default(), DistributionRecordType::Sender)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.size(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn window_filter_is_exact_and_inclusive(
        keys in prop::collection::btree_set(arb_temporal_key(), 1..24),
        peers in prop::collection::vec(arb_party_id(), 24),
        tx_ids in prop::collection::vec(arb_tx_id(), 24),
        a in arb_timestamp(),
        b in arb_timestamp(),
    ) {
        let (from, until) = if a <= b { (a, b) } else { (b, a) };
        let records: Vec<_> = keys
            .iter()
            .zip(peers.iter().zip(&tx_ids))
            .map(|(key, (peer, tx_id))| SenderDistributionRecord {
                tx_id: *tx_id,
                peer_party_id: *peer,
                states_to_record: StatesToRecord::OnlyRelevant,
                temporal_key: *key,
            })
            .collect();

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let found = runtime.block_on(async {
            let persistence = Arc::new(MemoryPersistence::new());
            let store = DistributionRecordStore::new(Arc::clone(&persistence));
            store.insert_sender_records(records.clone()).await.unwrap();
            let window = RecoveryTimeWindow::between(from, until).unwrap();
            RecoveryQueryEngine::new(persistence)
                .query_sender_records(&RecordFilter::new(window))
                .await
                .unwrap()
        });

        let mut expected: Vec<_> = records
            .into_iter()
            .filter(|r| from <= r.timestamp() && r.timestamp() <= until)
            .collect();
        let mut found = found;
        expected.sort_by_key(|r| (r.peer_party_id, r.temporal_key));
        found.sort_by_key(|r| (r.peer_party_id, r.temporal_key));
        prop_assert_eq!(found, expected);
    }
}
