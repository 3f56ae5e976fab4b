// Request ledger - collects validator signatures over outbound release
// messages, keyed by message hash

use crate::bridge::BridgeError;
use crate::consensus::{RawCounter, VoteCounter};
use crate::identity::{Address, SignerRecovery};
use crate::relay::{MessageHash, ReleaseMessage, TransferId, MESSAGE_LENGTH};
use crate::validators::ValidatorGate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageStatus {
    Open,
    Processed,
}

/// A stored release message with the signatures collected so far
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    hash: MessageHash,
    raw: Vec<u8>,
    signatures: Vec<Vec<u8>>,
    counter: VoteCounter,
    /// Submitter of the quorum-crossing signature
    responsible: Option<Address>,
}

impl OutboundMessage {
    pub fn hash(&self) -> &MessageHash {
        &self.hash
    }

    /// The raw message exactly as first submitted
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Signatures in submission order
    pub fn signatures(&self) -> &[Vec<u8>] {
        &self.signatures
    }

    pub fn counter(&self) -> &VoteCounter {
        &self.counter
    }

    /// Validator nominally responsible for relaying, once collected
    pub fn responsible(&self) -> Option<&Address> {
        self.responsible.as_ref()
    }

    pub fn status(&self) -> MessageStatus {
        if self.counter.is_processed() {
            MessageStatus::Processed
        } else {
            MessageStatus::Open
        }
    }
}

/// Result of accepting one signature
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureVote {
    /// Signature stored, quorum not yet reached
    Recorded { hash: MessageHash, signatures: u32 },
    /// This signature crossed the threshold; `responsible` should relay
    Collected {
        hash: MessageHash,
        signatures: u32,
        responsible: Address,
    },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RequestLedger {
    messages: HashMap<MessageHash, OutboundMessage>,
    votes: HashSet<(Address, MessageHash)>,
    /// Number of release messages raised so far; seeds transfer ids
    nonce: u64,
}

impl RequestLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the release message for an outbound transfer.
    ///
    /// Only the transfer nonce advances; no ledger entry exists until the
    /// first signature arrives.
    pub fn on_transfer_received(
        &mut self,
        recipient: Address,
        amount: u128,
        bridge_id: Address,
    ) -> ReleaseMessage {
        let transfer_id = TransferId::derive(&bridge_id, self.nonce);
        self.nonce += 1;
        ReleaseMessage::new(recipient, amount, transfer_id, bridge_id)
    }

    /// Accept `caller`'s signature over `raw_message`.
    pub fn submit_signature(
        &mut self,
        gate: &ValidatorGate,
        recovery: &dyn SignerRecovery,
        caller: Address,
        signature: &[u8],
        raw_message: &[u8],
    ) -> Result<SignatureVote, BridgeError> {
        if raw_message.len() != MESSAGE_LENGTH {
            return Err(BridgeError::Validation(format!(
                "message must be {} bytes, got {}",
                MESSAGE_LENGTH,
                raw_message.len()
            )));
        }

        let signer = recovery
            .recover_signer(signature, raw_message)
            .map_err(|e| BridgeError::Authorization(format!("signature rejected: {}", e)))?;
        if signer != caller {
            return Err(BridgeError::Authorization(format!(
                "recovered signer {} does not match caller {}",
                signer, caller
            )));
        }
        gate.ensure_validator(&signer)?;

        let hash = MessageHash::of(raw_message);
        if self.is_processed(&hash) {
            return Err(BridgeError::AlreadyProcessed);
        }
        if self.votes.contains(&(signer, hash)) {
            return Err(BridgeError::DuplicateVote(signer));
        }

        self.votes.insert((signer, hash));
        let message = self.messages.entry(hash).or_insert_with(|| OutboundMessage {
            hash,
            raw: raw_message.to_vec(),
            signatures: Vec::new(),
            counter: VoteCounter::default(),
            responsible: None,
        });
        message.signatures.push(signature.to_vec());
        let signatures = message.counter.increment();

        debug!(%signer, ?hash, signatures, "release signature recorded");

        if gate.quorum_reached(signatures) {
            message.counter.mark_processed();
            message.responsible = Some(signer);
            Ok(SignatureVote::Collected {
                hash,
                signatures,
                responsible: signer,
            })
        } else {
            Ok(SignatureVote::Recorded { hash, signatures })
        }
    }

    pub fn get(&self, hash: &MessageHash) -> Option<&OutboundMessage> {
        self.messages.get(hash)
    }

    /// Raw message for `hash`, as first submitted
    pub fn message(&self, hash: &MessageHash) -> Option<&[u8]> {
        self.messages.get(hash).map(|m| m.raw.as_slice())
    }

    /// The `index`-th signature collected for `hash`
    pub fn signature(&self, hash: &MessageHash, index: usize) -> Option<&[u8]> {
        self.messages
            .get(hash)
            .and_then(|m| m.signatures.get(index))
            .map(Vec::as_slice)
    }

    pub fn is_processed(&self, hash: &MessageHash) -> bool {
        self.messages
            .get(hash)
            .is_some_and(|m| m.counter.is_processed())
    }

    /// Packed (count, processed) counter for a message; zero if unknown
    pub fn raw_counter(&self, hash: &MessageHash) -> RawCounter {
        self.messages
            .get(hash)
            .map(|m| m.counter.to_raw())
            .unwrap_or(0)
    }

    /// Whether `validator` has signed `hash`
    pub fn message_signed_by(&self, validator: &Address, hash: &MessageHash) -> bool {
        self.votes.contains(&(*validator, *hash))
    }

    /// Number of release messages raised so far
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}
