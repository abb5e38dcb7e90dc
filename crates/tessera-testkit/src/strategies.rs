//! Property test strategies for Tessera types
//!
//! Strategies draw from small value ranges so that collisions (same party,
//! same timestamp) actually occur in generated cases.

use proptest::prelude::*;
use std::collections::BTreeMap;

// Re-export proptest for convenience
pub use proptest;

use tessera_core::{PartyId, StatesToRecord, TemporalKey, Timestamp, TxId};

/// Strategy for transaction ids derived from a small seed space
pub fn arb_tx_id() -> impl Strategy<Value = TxId> {
    (0u16..512).prop_map(|seed| TxId::from_content(format!("tx-{seed}").as_bytes()))
}

/// Strategy for party ids in `1..=64`
pub fn arb_party_id() -> impl Strategy<Value = PartyId> {
    (1u64..=64).prop_map(PartyId::from_raw)
}

/// Strategy for any visibility policy
pub fn arb_states_to_record() -> impl Strategy<Value = StatesToRecord> {
    prop_oneof![
        Just(StatesToRecord::None),
        Just(StatesToRecord::AllVisible),
        Just(StatesToRecord::OnlyRelevant),
    ]
}

/// Strategy for timestamps within one simulated day
pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
    (0u64..86_400_000).prop_map(Timestamp::from_millis)
}

/// Strategy for temporal keys with few distinct discriminators
pub fn arb_temporal_key() -> impl Strategy<Value = TemporalKey> {
    (arb_timestamp(), 0u32..16).prop_map(|(timestamp, discriminator)| {
        TemporalKey::new(timestamp, discriminator)
    })
}

/// Strategy for peer visibility maps of up to `max_peers` entries
pub fn arb_peer_map(max_peers: usize) -> impl Strategy<Value = BTreeMap<PartyId, StatesToRecord>> {
    prop::collection::btree_map(arb_party_id(), arb_states_to_record(), 0..=max_peers)
}
