//! Tessera Crypto: envelope encryption for distribution lists
//!
//! Provides [`AeadEnvelopeCipher`], the production implementation of
//! [`tessera_core::EnvelopeCipher`]. Envelopes carry their associated data in
//! clear so a receiver can index an envelope it cannot open.

#![forbid(unsafe_code)]

/// AES-256-GCM envelope cipher
pub mod envelope_cipher;

pub use envelope_cipher::{AeadEnvelopeCipher, ENVELOPE_FORMAT_VERSION, NONCE_LEN, TAG_LEN};
