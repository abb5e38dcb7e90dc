use serde::{Deserialize, Serialize};
use std::path::Path;

use super::traits::TesseraConfig;
use super::validation::ConfigValidator;
use crate::RecoveryError;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "TESSERA_";

/// Envelope encryption settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeSettings {
    /// Key-derivation label binding envelope keys to this use
    pub context: String,
    /// Largest envelope accepted at receipt time
    pub max_envelope_bytes: u64,
}

impl Default for EnvelopeSettings {
    fn default() -> Self {
        Self {
            context: "tessera.distribution-list.v1".to_string(),
            max_envelope_bytes: 1024 * 1024,
        }
    }
}

/// Fan-out limits for send events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionSettings {
    /// Largest peer map a single send may record
    pub max_peers_per_send: u64,
}

impl Default for DistributionSettings {
    fn default() -> Self {
        Self {
            max_peers_per_send: 1024,
        }
    }
}

/// Top-level recovery metadata configuration
///
/// ```toml
/// [envelope]
/// context = "tessera.distribution-list.v1"
/// max_envelope_bytes = 1048576
///
/// [distribution]
/// max_peers_per_send = 1024
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Envelope encryption settings
    pub envelope: EnvelopeSettings,
    /// Fan-out limits
    pub distribution: DistributionSettings,
}

fn parse_u64(key: &str, value: &str) -> Result<u64, RecoveryError> {
    value
        .trim()
        .parse()
        .map_err(|_| RecoveryError::invalid(format!("Invalid integer in {key}: {value}")))
}

impl TesseraConfig for RecoveryConfig {
    fn load_from_file(path: &Path) -> Result<Self, RecoveryError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RecoveryError::invalid(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        toml::from_str(&content).map_err(|e| RecoveryError::invalid(format!("Invalid TOML: {e}")))
    }

    fn merge_with_vars<I>(&mut self, vars: I) -> Result<(), RecoveryError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "ENVELOPE_CONTEXT" => self.envelope.context = value,
                "ENVELOPE_MAX_ENVELOPE_BYTES" => {
                    self.envelope.max_envelope_bytes = parse_u64(&key, &value)?;
                }
                "DISTRIBUTION_MAX_PEERS_PER_SEND" => {
                    self.distribution.max_peers_per_send = parse_u64(&key, &value)?;
                }
                _ => tracing::debug!(key = %key, "ignoring unrecognised configuration variable"),
            }
        }
        Ok(())
    }

    fn merge_with(&mut self, other: &Self) {
        let defaults = Self::default();
        if other.envelope.context != defaults.envelope.context {
            self.envelope.context = other.envelope.context.clone();
        }
        if other.envelope.max_envelope_bytes != defaults.envelope.max_envelope_bytes {
            self.envelope.max_envelope_bytes = other.envelope.max_envelope_bytes;
        }
        if other.distribution.max_peers_per_send != defaults.distribution.max_peers_per_send {
            self.distribution.max_peers_per_send = other.distribution.max_peers_per_send;
        }
    }

    fn validate(&self) -> Result<(), RecoveryError> {
        let root = ConfigValidator::new();

        let mut envelope = root.for_field("envelope");
        envelope
            .non_empty("context", &self.envelope.context)
            .at_least("max_envelope_bytes", self.envelope.max_envelope_bytes, 1);

        let mut distribution = root.for_field("distribution");
        distribution.at_least(
            "max_peers_per_send",
            self.distribution.max_peers_per_send,
            1,
        );

        let mut all = root;
        all.merge(envelope);
        all.merge(distribution);
        all.into_result()
    }
}
