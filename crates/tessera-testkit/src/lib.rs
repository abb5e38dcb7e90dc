//! # Tessera Testkit
//!
//! Shared utilities for testing the recovery metadata crates:
//!
//! - [`time`]: a manually driven clock
//! - [`directory`]: a fixed party directory
//! - [`faults`]: a persistence boundary that fails on demand
//! - [`strategies`]: proptest strategies for core types
//! - [`logging`]: idempotent test log initialisation
//!
//! Only used from `[dev-dependencies]`.

#![forbid(unsafe_code)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

pub mod directory;
pub mod faults;
pub mod logging;
pub mod strategies;
pub mod time;

pub use directory::FixedDirectory;
pub use faults::FaultyPersistence;
pub use logging::init_test_tracing;
pub use time::ManualClock;
