//! Party name to party id resolution.

use crate::errors::Result;
use crate::identifiers::{PartyId, PartyName};
use std::sync::Arc;

/// Stable, injective mapping between party names and party ids.
///
/// Implementations must return the same id for the same name for the whole
/// process lifetime.
pub trait PartyDirectory: Send + Sync {
    /// Resolve a name, failing with `RecoveryError::UnknownParty` if the
    /// directory has never seen it
    fn resolve(&self, name: &PartyName) -> Result<PartyId>;

    /// Reverse lookup
    fn name_of(&self, id: PartyId) -> Option<PartyName>;

    /// Resolve every name, failing on the first unknown one
    fn resolve_all<'a, I>(&self, names: I) -> Result<Vec<PartyId>>
    where
        I: IntoIterator<Item = &'a PartyName>,
        Self: Sized,
    {
        names.into_iter().map(|name| self.resolve(name)).collect()
    }
}

/// Blanket implementation for Arc<T> where T: PartyDirectory
impl<T: PartyDirectory + ?Sized> PartyDirectory for Arc<T> {
    fn resolve(&self, name: &PartyName) -> Result<PartyId> {
        (**self).resolve(name)
    }

    fn name_of(&self, id: PartyId) -> Option<PartyName> {
        (**self).name_of(id)
    }
}
