//! Fixed party directory for tests.

use std::collections::BTreeMap;
use tessera_core::{PartyDirectory, PartyId, PartyName, RecoveryError, Result};

/// Directory over a fixed name-to-id table
#[derive(Debug, Clone, Default)]
pub struct FixedDirectory {
    by_name: BTreeMap<PartyName, PartyId>,
}

impl FixedDirectory {
    /// Empty directory; every lookup fails
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name` with the given raw id
    pub fn with_party(mut self, name: &str, id: u64) -> Self {
        let name = PartyName::new(name).expect("test party names are non-empty");
        self.by_name.insert(name, PartyId::from_raw(id));
        self
    }

    /// Directory holding `O=Party N, L=London, C=GB` for each id
    pub fn numbered(ids: impl IntoIterator<Item = u64>) -> Self {
        ids.into_iter().fold(Self::new(), |directory, id| {
            directory.with_party(&party_name(id), id)
        })
    }
}

/// Distinguished name used by [`FixedDirectory::numbered`]
pub fn party_name(id: u64) -> String {
    format!("O=Party {id}, L=London, C=GB")
}

impl PartyDirectory for FixedDirectory {
    fn resolve(&self, name: &PartyName) -> Result<PartyId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| RecoveryError::unknown_party(name.as_str()))
    }

    fn name_of(&self, id: PartyId) -> Option<PartyName> {
        self.by_name
            .iter()
            .find(|(_, candidate)| **candidate == id)
            .map(|(name, _)| name.clone())
    }
}
