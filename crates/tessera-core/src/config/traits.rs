//! Core configuration trait

use crate::RecoveryError;
use std::path::Path;

/// Core trait for Tessera configuration types
pub trait TesseraConfig: Clone + Default + Send + Sync + 'static {
    /// Get default configuration values
    fn defaults() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    fn load_from_file(path: &Path) -> Result<Self, RecoveryError>;

    /// Apply environment variable overrides
    fn merge_with_env(&mut self) -> Result<(), RecoveryError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from an explicit set of variables
    fn merge_with_vars<I>(&mut self, vars: I) -> Result<(), RecoveryError>
    where
        I: IntoIterator<Item = (String, String)>;

    /// Merge non-default values from another configuration
    fn merge_with(&mut self, other: &Self);

    /// Validate the configuration
    fn validate(&self) -> Result<(), RecoveryError>;

    /// Defaults, overlaid with `path` if given, then the environment, then validated
    fn load(path: Option<&Path>) -> Result<Self, RecoveryError> {
        let mut config = Self::defaults();
        if let Some(path) = path {
            let from_file = Self::load_from_file(path)?;
            config.merge_with(&from_file);
        }
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }
}
