// Relay bundle - a frozen message plus its collected signatures, assembled
// off-chain for submission to the counterpart chain

use crate::identity::Address;
use crate::relay::{MessageHash, OutboundMessage, ReleaseMessage, MessageError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Failed to decode bundle: {0}")]
    DecodeError(String),

    #[error("Invalid base64 string: {0}")]
    InvalidBase64(String),
}

/// Everything the counterpart chain needs to verify a release
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayBundle {
    message_hash: MessageHash,
    message: Vec<u8>,
    signatures: Vec<Vec<u8>>,
    /// Validator whose signature crossed the threshold, if known
    responsible: Option<Address>,
}

impl RelayBundle {
    pub fn new(
        message_hash: MessageHash,
        message: Vec<u8>,
        signatures: Vec<Vec<u8>>,
        responsible: Option<Address>,
    ) -> Self {
        Self {
            message_hash,
            message,
            signatures,
            responsible,
        }
    }

    /// Assemble from a ledger entry
    pub fn from_message(message: &OutboundMessage) -> Self {
        Self::new(
            *message.hash(),
            message.raw().to_vec(),
            message.signatures().to_vec(),
            message.responsible().copied(),
        )
    }

    pub fn message_hash(&self) -> &MessageHash {
        &self.message_hash
    }

    pub fn message(&self) -> &[u8] {
        &self.message
    }

    pub fn signatures(&self) -> &[Vec<u8>] {
        &self.signatures
    }

    pub fn responsible(&self) -> Option<&Address> {
        self.responsible.as_ref()
    }

    /// Decode the release message the bundle carries
    pub fn release(&self) -> Result<ReleaseMessage, MessageError> {
        ReleaseMessage::decode(&self.message)
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BundleError> {
        postcard::from_bytes(bytes).map_err(|e| BundleError::DecodeError(e.to_string()))
    }

    /// Encode to base64 string (URL-safe, no padding)
    pub fn encode_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_bytes())
    }

    /// Decode from base64 string
    pub fn decode_base64(b64_str: &str) -> Result<Self, BundleError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(b64_str)
            .map_err(|e| BundleError::InvalidBase64(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}
