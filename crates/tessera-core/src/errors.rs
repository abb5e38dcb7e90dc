//! Unified error system for Tessera
//!
//! One error type covers every operation in the workspace. Each variant maps
//! to a failure class callers are expected to branch on; none are retried
//! internally.

use serde::{Deserialize, Serialize};

/// Unified error type for all recovery metadata operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum RecoveryError {
    /// A party identity could not be resolved to a `PartyId`
    #[error("Unknown party: {name}")]
    UnknownParty {
        /// Distinguished name (or id) that failed to resolve
        name: String,
    },

    /// Envelope payload could not be authenticated or decrypted
    #[error("Decryption failed: {message}")]
    DecryptionFailure {
        /// Error message describing the cryptographic failure
        message: String,
    },

    /// Envelope header or payload does not have the expected structure
    #[error("Malformed envelope: {message}")]
    MalformedEnvelope {
        /// Error message describing the structural failure
        message: String,
    },

    /// Failure reported by the transactional persistence boundary
    #[error("Persistence failure: {message}")]
    Persistence {
        /// Error message describing the storage failure
        message: String,
    },

    /// Invalid argument or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },
}

impl RecoveryError {
    /// Create an unknown party error
    pub fn unknown_party(name: impl Into<String>) -> Self {
        Self::UnknownParty { name: name.into() }
    }

    /// Create a decryption failure
    pub fn decryption(message: impl Into<String>) -> Self {
        Self::DecryptionFailure {
            message: message.into(),
        }
    }

    /// Create a malformed envelope error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            message: message.into(),
        }
    }

    /// Create a persistence failure
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create a constraint violation (reported as a persistence failure)
    pub fn constraint_violation(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: format!("Constraint violation: {}", message.into()),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Whether this failure originated in the persistence layer
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

/// Standard Result type for recovery metadata operations
pub type Result<T> = std::result::Result<T, RecoveryError>;

impl From<std::io::Error> for RecoveryError {
    fn from(err: std::io::Error) -> Self {
        Self::persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RecoveryError::unknown_party("O=Bank A, L=London, C=GB");
        assert_eq!(err.to_string(), "Unknown party: O=Bank A, L=London, C=GB");

        let err = RecoveryError::constraint_violation("duplicate key");
        assert!(err.is_persistence());
        assert_eq!(
            err.to_string(),
            "Persistence failure: Constraint violation: duplicate key"
        );
    }

    #[test]
    fn test_io_error_is_persistence() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert!(RecoveryError::from(io_err).is_persistence());
    }
}
