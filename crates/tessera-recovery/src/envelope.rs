//! Distribution list envelopes.
//!
//! A send event's peer visibility map travels to every peer inside one
//! envelope. The envelope has two sections:
//!
//! - **public header**: the sender's recording timestamp. Carried as the
//!   cipher's associated data, so any receiver can index the envelope without
//!   the key.
//! - **private payload**: sender visibility and the peer map, encrypted.
//!
//! Both sections are bincode with fixed-width big-endian integers and no
//! trailing bytes.

use bincode::Options;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::{EnvelopeCipher, PartyId, RecoveryError, Result, StatesToRecord, Timestamp};
use tessera_store::EncryptedEnvelope;

/// Section of an envelope readable without key material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicHeader {
    /// Instant the sender recorded the send event
    pub sender_recorded_timestamp: Timestamp,
}

/// Peer visibility of one send event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedDistributionList {
    /// Visibility the sender recorded for itself
    pub sender_states_to_record: StatesToRecord,
    /// Visibility granted to each peer
    pub peer_states_to_record: BTreeMap<PartyId, StatesToRecord>,
    /// Clear-text header
    pub public_header: PublicHeader,
}

impl HashedDistributionList {
    /// Assemble a list stamped with `timestamp`
    pub fn new(
        sender_states_to_record: StatesToRecord,
        peer_states_to_record: BTreeMap<PartyId, StatesToRecord>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            sender_states_to_record,
            peer_states_to_record,
            public_header: PublicHeader {
                sender_recorded_timestamp: timestamp,
            },
        }
    }

    /// Sender's recording timestamp
    pub fn timestamp(&self) -> Timestamp {
        self.public_header.sender_recorded_timestamp
    }

    /// Peers named in the list
    pub fn peers(&self) -> impl Iterator<Item = PartyId> + '_ {
        self.peer_states_to_record.keys().copied()
    }
}

/// Encrypted section of the envelope
#[derive(Serialize, Deserialize)]
struct PrivatePayload {
    sender_states_to_record: StatesToRecord,
    peer_states_to_record: BTreeMap<PartyId, StatesToRecord>,
}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
        .reject_trailing_bytes()
}

fn to_wire<T: Serialize>(value: &T, section: &str) -> Result<Vec<u8>> {
    wire_options()
        .serialize(value)
        .map_err(|e| RecoveryError::invalid(format!("Failed to encode envelope {section}: {e}")))
}

fn from_wire<'a, T: Deserialize<'a>>(bytes: &'a [u8], section: &str) -> Result<T> {
    wire_options()
        .deserialize(bytes)
        .map_err(|e| RecoveryError::malformed(format!("Undecodable envelope {section}: {e}")))
}

/// Builds, encrypts and opens distribution list envelopes.
///
/// Cryptography is delegated to the injected [`EnvelopeCipher`]; the codec
/// owns only the header/payload split and their encoding.
#[derive(Debug)]
pub struct DistributionEnvelopeCodec<C> {
    cipher: Arc<C>,
}

impl<C> Clone for DistributionEnvelopeCodec<C> {
    fn clone(&self) -> Self {
        Self {
            cipher: Arc::clone(&self.cipher),
        }
    }
}

impl<C: EnvelopeCipher> DistributionEnvelopeCodec<C> {
    /// Create a codec over a shared cipher
    pub fn new(cipher: Arc<C>) -> Self {
        Self { cipher }
    }

    /// Cipher used for envelopes
    pub fn cipher(&self) -> &Arc<C> {
        &self.cipher
    }

    /// Build and encrypt the list for one send event
    pub fn encode_and_encrypt(
        &self,
        sender_states_to_record: StatesToRecord,
        peer_states_to_record: &BTreeMap<PartyId, StatesToRecord>,
        timestamp: Timestamp,
    ) -> Result<EncryptedEnvelope> {
        self.encrypt_list(&HashedDistributionList::new(
            sender_states_to_record,
            peer_states_to_record.clone(),
            timestamp,
        ))
    }

    /// Encrypt an assembled list
    pub fn encrypt_list(&self, list: &HashedDistributionList) -> Result<EncryptedEnvelope> {
        let header = to_wire(&list.public_header, "header")?;
        let payload = to_wire(
            &PrivatePayload {
                sender_states_to_record: list.sender_states_to_record,
                peer_states_to_record: list.peer_states_to_record.clone(),
            },
            "payload",
        )?;
        let bytes = self.cipher.encrypt(&payload, &header)?;
        Ok(EncryptedEnvelope::new(bytes))
    }

    /// Read the public header without authenticating or decrypting.
    ///
    /// Never fails with `DecryptionFailure`.
    pub fn read_public_header(&self, envelope: &[u8]) -> Result<PublicHeader> {
        let header = self.cipher.peek_associated_data(envelope)?;
        from_wire(header, "header")
    }

    /// Authenticate and decode the full list
    pub fn decrypt(&self, envelope: &[u8]) -> Result<HashedDistributionList> {
        let opened = self.cipher.decrypt(envelope)?;
        let public_header: PublicHeader = from_wire(&opened.associated_data, "header")?;
        let payload: PrivatePayload = from_wire(&opened.plaintext, "payload")?;
        Ok(HashedDistributionList {
            sender_states_to_record: payload.sender_states_to_record,
            peer_states_to_record: payload.peer_states_to_record,
            public_header,
        })
    }
}
