//! Configuration for the recovery metadata subsystem.
//!
//! Values come from defaults, then an optional TOML file, then `TESSERA_*`
//! environment overrides, and are validated once after merging.

mod recovery;
mod traits;
mod validation;

pub use recovery::{DistributionSettings, EnvelopeSettings, RecoveryConfig, ENV_PREFIX};
pub use traits::TesseraConfig;
pub use validation::{ConfigValidator, ValidationError};
