//! Temporal key allocation.
//!
//! A discriminator is drawn once per distribution event and shared by every
//! record that event produces. Two events in the same clock tick therefore
//! get distinct, orderable keys, while records of one event stay
//! co-indexable.

use std::sync::atomic::{AtomicU32, Ordering};
use tessera_core::{TemporalKey, Timestamp};

/// Monotonic discriminator counter.
///
/// Share one allocator per process by `Arc`; separate instances are
/// independent, which keeps tests isolated. The counter wraps on overflow.
#[derive(Debug, Default)]
pub struct TemporalKeyAllocator {
    next: AtomicU32,
}

impl TemporalKeyAllocator {
    /// Allocator starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator starting at `first`
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// Draw the next discriminator
    pub fn next(&self) -> u32 {
        // Uniqueness needs atomicity only, not ordering with other memory.
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Discriminator the next call to [`next`](Self::next) would return
    pub fn peek(&self) -> u32 {
        self.next.load(Ordering::Relaxed)
    }

    /// Draw one discriminator and pair it with `timestamp`
    pub fn key_at(&self, timestamp: Timestamp) -> TemporalKey {
        TemporalKey::new(timestamp, self.next())
    }
}
