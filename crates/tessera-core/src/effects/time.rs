//! Injected wall clock.
//!
//! Temporal keys are derived from this clock rather than from ambient global
//! time so tests can pin every event to the same tick.

use crate::time::Timestamp;
use std::sync::Arc;
use std::time::SystemTime;

/// Wall-clock time source
pub trait PhysicalClock: Send + Sync {
    /// Current instant
    fn now(&self) -> Timestamp;
}

/// Clock backed by the operating system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl PhysicalClock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_system_time(SystemTime::now())
    }
}

/// Blanket implementation for Arc<T> where T: PhysicalClock
impl<T: PhysicalClock + ?Sized> PhysicalClock for Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
