//! In-memory party directory.
//!
//! Party ids are derived from the normalised distinguished name with BLAKE3,
//! so the same name maps to the same id in every process. A name must be
//! registered before it resolves.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tessera_core::{PartyDirectory, PartyId, PartyName, RecoveryError, Result};

const PARTY_ID_CONTEXT: &str = "tessera party id v1";

/// Registered parties, indexed both ways
#[derive(Debug, Default)]
struct Registry {
    by_name: HashMap<PartyName, PartyId>,
    by_id: BTreeMap<PartyId, PartyName>,
}

/// Party id cache backing [`PartyDirectory`]
#[derive(Debug, Default)]
pub struct PartyInfoCache {
    registry: RwLock<Registry>,
}

impl PartyInfoCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, returning its id.
    ///
    /// Registering the same name twice returns the same id. Two names whose
    /// derived ids collide are rejected.
    pub fn register(&self, name: &PartyName) -> Result<PartyId> {
        let id = derive_party_id(name);
        let mut registry = self.registry.write();
        if let Some(existing) = registry.by_id.get(&id) {
            if existing != name {
                return Err(RecoveryError::invalid(format!(
                    "Party id {id} already assigned to {existing}, cannot assign to {name}"
                )));
            }
            return Ok(id);
        }
        registry.by_name.insert(name.clone(), id);
        registry.by_id.insert(id, name.clone());
        tracing::debug!(party = %name, party_id = %id, "registered party");
        Ok(id)
    }

    /// Number of registered parties
    pub fn len(&self) -> usize {
        self.registry.read().by_id.len()
    }

    /// Whether no party is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stable id for a party name
pub fn derive_party_id(name: &PartyName) -> PartyId {
    let digest = blake3::derive_key(PARTY_ID_CONTEXT, name.as_str().as_bytes());
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&digest[..8]);
    PartyId::from_raw(u64::from_be_bytes(raw))
}

impl PartyDirectory for PartyInfoCache {
    fn resolve(&self, name: &PartyName) -> Result<PartyId> {
        self.registry
            .read()
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| RecoveryError::unknown_party(name.as_str()))
    }

    fn name_of(&self, id: PartyId) -> Option<PartyName> {
        self.registry.read().by_id.get(&id).cloned()
    }
}
