//! Fault injection at the persistence boundary.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tessera_core::{RecoveryError, Result};
use tessera_store::{DistributionTables, MemoryPersistence, PersistenceBoundary};

/// When an armed transaction fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// Before the unit of work runs
    Begin,
    /// After the unit of work succeeded, at commit
    Commit,
}

/// [`MemoryPersistence`] wrapper that fails transactions on demand.
///
/// Reads always succeed. Armed faults are consumed one transaction at a time.
#[derive(Debug, Default)]
pub struct FaultyPersistence {
    inner: Arc<MemoryPersistence>,
    armed: Mutex<Vec<FaultPoint>>,
    attempted: AtomicUsize,
}

impl FaultyPersistence {
    /// Wrap fresh, empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing tables
    pub fn wrapping(inner: Arc<MemoryPersistence>) -> Self {
        Self {
            inner,
            armed: Mutex::new(Vec::new()),
            attempted: AtomicUsize::new(0),
        }
    }

    /// Fail the next transaction at `point`
    pub fn fail_next(&self, point: FaultPoint) {
        self.armed.lock().insert(0, point);
    }

    /// Fail the next transaction at commit, after its work has run
    pub fn fail_next_commit(&self) {
        self.fail_next(FaultPoint::Commit);
    }

    /// Wrapped tables
    pub fn inner(&self) -> &Arc<MemoryPersistence> {
        &self.inner
    }

    /// Transactions attempted so far, failed ones included
    pub fn transactions_attempted(&self) -> usize {
        self.attempted.load(Ordering::SeqCst)
    }

    fn take_fault(&self) -> Option<FaultPoint> {
        let fault = self.armed.lock().pop();
        if let Some(point) = fault {
            tracing::debug!(?point, "injecting persistence fault");
        }
        fault
    }
}

fn injected(point: FaultPoint) -> RecoveryError {
    RecoveryError::persistence(format!("injected failure at {point:?}"))
}

#[async_trait]
impl PersistenceBoundary for FaultyPersistence {
    async fn read<T, F>(&self, query: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DistributionTables) -> T + Send + 'static,
    {
        self.inner.read(query).await
    }

    async fn run_in_transaction<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut DistributionTables) -> Result<T> + Send + 'static,
    {
        self.attempted.fetch_add(1, Ordering::SeqCst);
        match self.take_fault() {
            None => self.inner.run_in_transaction(work).await,
            Some(FaultPoint::Begin) => Err(injected(FaultPoint::Begin)),
            Some(FaultPoint::Commit) => {
                self.inner
                    .run_in_transaction(move |tables| {
                        work(tables)?;
                        Err(injected(FaultPoint::Commit))
                    })
                    .await
            }
        }
    }
}
