//! Shared fixtures for coordinator tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::{PartyName, PhysicalClock, RecoveryConfig, StatesToRecord, Timestamp, TxId};
use tessera_crypto::AeadEnvelopeCipher;
use tessera_recovery::{CoordinatorParts, RecoveryMetadataCoordinator, TemporalKeyAllocator};
use tessera_store::{MemoryPersistence, PersistenceBoundary};
use tessera_testkit::directory::party_name;
use tessera_testkit::{init_test_tracing, FixedDirectory, ManualClock};

pub type TestCoordinator<P> =
    RecoveryMetadataCoordinator<P, AeadEnvelopeCipher, FixedDirectory, ManualClock>;

/// Collaborators of one simulated node
pub struct Node<P> {
    pub coordinator: TestCoordinator<P>,
    pub persistence: Arc<P>,
    pub clock: Arc<ManualClock>,
}

impl<P> Node<P> {
    /// Current reading of the node's clock
    pub fn clock_now(&self) -> Timestamp {
        self.clock.now()
    }
}

pub fn node_with<P: PersistenceBoundary>(
    persistence: Arc<P>,
    secret: u8,
    allocator: Arc<TemporalKeyAllocator>,
    config: RecoveryConfig,
) -> Node<P> {
    init_test_tracing();
    let clock = Arc::new(ManualClock::at_millis(1_700_000_000_000));
    let cipher = Arc::new(AeadEnvelopeCipher::from_settings([secret; 32], &config.envelope));
    let coordinator = RecoveryMetadataCoordinator::new(
        CoordinatorParts {
            persistence: Arc::clone(&persistence),
            cipher,
            directory: Arc::new(FixedDirectory::numbered(1..=8)),
            clock: Arc::clone(&clock),
            allocator,
        },
        config,
    )
    .unwrap();
    Node {
        coordinator,
        persistence,
        clock,
    }
}

pub fn memory_node(secret: u8) -> Node<MemoryPersistence> {
    node_with(
        Arc::new(MemoryPersistence::new()),
        secret,
        Arc::new(TemporalKeyAllocator::new()),
        RecoveryConfig::default(),
    )
}

pub fn name(id: u64) -> PartyName {
    PartyName::new(party_name(id)).unwrap()
}

pub fn peers(entries: &[(u64, StatesToRecord)]) -> BTreeMap<PartyName, StatesToRecord> {
    entries
        .iter()
        .map(|(id, states)| (name(*id), *states))
        .collect()
}

pub fn tx(label: &str) -> TxId {
    TxId::from_content(label.as_bytes())
}
