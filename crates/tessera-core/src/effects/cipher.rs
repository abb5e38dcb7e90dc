//! Envelope encryption interface.
//!
//! An envelope carries two sections: associated data that travels in clear
//! and is covered by the authentication tag, and an encrypted payload. Any
//! holder of the envelope can read the associated data without key material;
//! only a holder of the right key can open the payload.

use crate::errors::RecoveryError;
use std::sync::Arc;

/// Failures raised by an [`EnvelopeCipher`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    /// The byte layout could not be parsed
    #[error("Malformed ciphertext: {message}")]
    Malformed {
        /// What was wrong with the layout
        message: String,
    },

    /// Authentication failed: wrong key, corruption or tampering
    #[error("Decryption failed: {message}")]
    Decryption {
        /// Underlying cipher failure
        message: String,
    },

    /// The cipher refused to encrypt the input
    #[error("Encryption failed: {message}")]
    Encryption {
        /// Underlying cipher failure
        message: String,
    },
}

impl From<CipherError> for RecoveryError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::Malformed { message } => RecoveryError::malformed(message),
            CipherError::Decryption { message } => RecoveryError::decryption(message),
            CipherError::Encryption { message } => {
                RecoveryError::invalid(format!("Encryption failed: {message}"))
            }
        }
    }
}

/// Result of a successful authenticated decryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedEnvelope {
    /// Decrypted payload
    pub plaintext: Vec<u8>,
    /// Associated data, now known to be authentic
    pub associated_data: Vec<u8>,
}

/// Authenticated encryption with clear-text associated data
pub trait EnvelopeCipher: Send + Sync {
    /// Encrypt `plaintext`, embedding `associated_data` in clear
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, CipherError>;

    /// Authenticate and decrypt an envelope
    fn decrypt(&self, ciphertext: &[u8]) -> Result<OpenedEnvelope, CipherError>;

    /// Read the associated data without authenticating it.
    ///
    /// Never fails with [`CipherError::Decryption`]; only a broken layout is an error.
    fn peek_associated_data<'a>(&self, ciphertext: &'a [u8]) -> Result<&'a [u8], CipherError>;

    /// Key-derivation label the cipher was keyed for
    fn context(&self) -> &str;
}

/// Blanket implementation for Arc<T> where T: EnvelopeCipher
impl<T: EnvelopeCipher + ?Sized> EnvelopeCipher for Arc<T> {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, CipherError> {
        (**self).encrypt(plaintext, associated_data)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<OpenedEnvelope, CipherError> {
        (**self).decrypt(ciphertext)
    }

    fn peek_associated_data<'a>(&self, ciphertext: &'a [u8]) -> Result<&'a [u8], CipherError> {
        (**self).peek_associated_data(ciphertext)
    }

    fn context(&self) -> &str {
        (**self).context()
    }
}
