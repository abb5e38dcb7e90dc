//! AES-256-GCM envelope cipher
//!
//! Byte layout of an envelope:
//!
//! ```text
//! +---------+--------------+-----------------+-----------+---------------------+
//! | version | aad_len (BE) | associated data | nonce     | ciphertext + tag    |
//! | 1 byte  | 4 bytes      | aad_len bytes   | 12 bytes  | >= 16 bytes         |
//! +---------+--------------+-----------------+-----------+---------------------+
//! ```
//!
//! Everything before the nonce is authenticated as GCM associated data, so
//! the version and length prefix cannot be altered without failing
//! decryption. The associated data itself is readable by anyone.
//!
//! Keys are derived from a 32-byte node secret and a context label with
//! BLAKE3, so the same secret can serve several envelope formats without key
//! reuse across them.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use blake3::Hasher;
use rand::RngCore;
use std::fmt;
use tessera_core::config::EnvelopeSettings;
use tessera_core::{CipherError, EnvelopeCipher, OpenedEnvelope};
use zeroize::Zeroize;

/// Current envelope layout version
pub const ENVELOPE_FORMAT_VERSION: u8 = 1;
/// GCM nonce length
pub const NONCE_LEN: usize = 12;
/// GCM authentication tag length
pub const TAG_LEN: usize = 16;

const PREFIX_LEN: usize = 1 + 4;

/// Envelope cipher keyed by a node secret and a context label
pub struct AeadEnvelopeCipher {
    cipher: Aes256Gcm,
    context: String,
}

impl AeadEnvelopeCipher {
    /// Create a cipher from a 32-byte secret.
    ///
    /// The caller's copy of the secret is zeroized once the key is derived.
    pub fn new(mut secret: [u8; 32], context: impl Into<String>) -> Self {
        let context = context.into();
        let mut derived = derive_key(&secret, &context);
        let key: Key<Aes256Gcm> = derived.into();
        let cipher = Aes256Gcm::new(&key);
        derived.zeroize();
        secret.zeroize();
        Self { cipher, context }
    }

    /// Create a cipher keyed for the configured envelope context
    pub fn from_settings(secret: [u8; 32], settings: &EnvelopeSettings) -> Self {
        Self::new(secret, settings.context.as_str())
    }

    /// Create a cipher with a freshly generated secret
    pub fn generate(context: impl Into<String>) -> Self {
        let mut secret = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        Self::new(secret, context)
    }
}

impl fmt::Debug for AeadEnvelopeCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AeadEnvelopeCipher")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Derive an AES-256 key from a node secret and context using BLAKE3
fn derive_key(secret: &[u8; 32], context: &str) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(b"tessera-envelope-v1:");
    hasher.update(secret);
    hasher.update(b":");
    hasher.update(context.as_bytes());
    hasher.finalize().into()
}

/// Borrowed view of a parsed envelope
struct EnvelopeParts<'a> {
    /// Version byte, length prefix and associated data
    authenticated_prefix: &'a [u8],
    associated_data: &'a [u8],
    nonce: &'a [u8],
    sealed: &'a [u8],
}

fn malformed(message: impl Into<String>) -> CipherError {
    CipherError::Malformed {
        message: message.into(),
    }
}

fn split_envelope(bytes: &[u8]) -> Result<EnvelopeParts<'_>, CipherError> {
    if bytes.len() < PREFIX_LEN {
        return Err(malformed(format!(
            "envelope is {} bytes, shorter than its {PREFIX_LEN}-byte prefix",
            bytes.len()
        )));
    }
    if bytes[0] != ENVELOPE_FORMAT_VERSION {
        return Err(malformed(format!(
            "unsupported envelope version {}, expected {ENVELOPE_FORMAT_VERSION}",
            bytes[0]
        )));
    }
    let aad_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    let aad_end = PREFIX_LEN
        .checked_add(aad_len)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| malformed("associated data length exceeds envelope"))?;
    let nonce_end = aad_end + NONCE_LEN;
    if bytes.len() < nonce_end + TAG_LEN {
        return Err(malformed("envelope truncated before authentication tag"));
    }
    Ok(EnvelopeParts {
        authenticated_prefix: &bytes[..aad_end],
        associated_data: &bytes[PREFIX_LEN..aad_end],
        nonce: &bytes[aad_end..nonce_end],
        sealed: &bytes[nonce_end..],
    })
}

impl EnvelopeCipher for AeadEnvelopeCipher {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, CipherError> {
        let aad_len = u32::try_from(associated_data.len()).map_err(|_| CipherError::Encryption {
            message: format!("associated data too large: {} bytes", associated_data.len()),
        })?;

        let mut envelope =
            Vec::with_capacity(PREFIX_LEN + associated_data.len() + NONCE_LEN + plaintext.len() + TAG_LEN);
        envelope.push(ENVELOPE_FORMAT_VERSION);
        envelope.extend_from_slice(&aad_len.to_be_bytes());
        envelope.extend_from_slice(associated_data);

        let mut nonce = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let sealed = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &envelope,
                },
            )
            .map_err(|e| CipherError::Encryption {
                message: format!("AES-GCM encryption failed: {e}"),
            })?;

        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&sealed);
        Ok(envelope)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<OpenedEnvelope, CipherError> {
        let parts = split_envelope(ciphertext)?;
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(parts.nonce),
                Payload {
                    msg: parts.sealed,
                    aad: parts.authenticated_prefix,
                },
            )
            .map_err(|e| CipherError::Decryption {
                message: format!("AES-GCM decryption failed: {e}"),
            })?;
        Ok(OpenedEnvelope {
            plaintext,
            associated_data: parts.associated_data.to_vec(),
        })
    }

    fn peek_associated_data<'a>(&self, ciphertext: &'a [u8]) -> Result<&'a [u8], CipherError> {
        split_envelope(ciphertext).map(|parts| parts.associated_data)
    }

    fn context(&self) -> &str {
        &self.context
    }
}
