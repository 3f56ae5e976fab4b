// Release message - the canonical 104-byte payload validators sign to
// authorize a release on the counterpart chain

use crate::identity::{hash32, keccak256, keccak256_concat, Address, ADDRESS_LENGTH};
use thiserror::Error;

/// Total encoded length: recipient (20) ‖ amount (32) ‖ transfer id (32) ‖ bridge id (20)
pub const MESSAGE_LENGTH: usize = 104;

const RECIPIENT: std::ops::Range<usize> = 0..20;
const AMOUNT: std::ops::Range<usize> = 20..52;
const TRANSFER_ID: std::ops::Range<usize> = 52..84;
const BRIDGE_ID: std::ops::Range<usize> = 84..104;

hash32!(
    /// Keccak-256 of a raw release message
    MessageHash,
    "MessageHash"
);

hash32!(
    /// Unique identifier of one outbound transfer
    TransferId,
    "TransferId"
);

impl MessageHash {
    pub fn of(raw: &[u8]) -> Self {
        Self(keccak256(raw))
    }
}

impl TransferId {
    /// Derive the id of the `nonce`-th transfer raised by `bridge_id`
    pub fn derive(bridge_id: &Address, nonce: u64) -> Self {
        Self(keccak256_concat(&[
            b"transfer:".as_slice(),
            bridge_id.as_bytes().as_slice(),
            nonce.to_be_bytes().as_slice(),
        ]))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Invalid message length: expected 104, got {0}")]
    InvalidLength(usize),

    #[error("Amount does not fit in 128 bits")]
    AmountOverflow,
}

/// Decoded release message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseMessage {
    recipient: Address,
    amount: u128,
    transfer_id: TransferId,
    bridge_id: Address,
}

impl ReleaseMessage {
    pub fn new(recipient: Address, amount: u128, transfer_id: TransferId, bridge_id: Address) -> Self {
        Self {
            recipient,
            amount,
            transfer_id,
            bridge_id,
        }
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    pub fn amount(&self) -> u128 {
        self.amount
    }

    pub fn transfer_id(&self) -> &TransferId {
        &self.transfer_id
    }

    /// Identity of the bridge instance the message is bound to
    pub fn bridge_id(&self) -> &Address {
        &self.bridge_id
    }

    /// Flat big-endian encoding
    pub fn encode(&self) -> [u8; MESSAGE_LENGTH] {
        let mut raw = [0u8; MESSAGE_LENGTH];
        raw[RECIPIENT].copy_from_slice(self.recipient.as_bytes());
        raw[AMOUNT][16..].copy_from_slice(&self.amount.to_be_bytes());
        raw[TRANSFER_ID].copy_from_slice(self.transfer_id.as_bytes());
        raw[BRIDGE_ID].copy_from_slice(self.bridge_id.as_bytes());
        raw
    }

    /// Decode a raw message; fails on wrong length or an amount above u128
    pub fn decode(raw: &[u8]) -> Result<Self, MessageError> {
        if raw.len() != MESSAGE_LENGTH {
            return Err(MessageError::InvalidLength(raw.len()));
        }

        let amount_field = &raw[AMOUNT];
        if amount_field[..16].iter().any(|&b| b != 0) {
            return Err(MessageError::AmountOverflow);
        }
        let mut amount = [0u8; 16];
        amount.copy_from_slice(&amount_field[16..]);

        let mut transfer_id = [0u8; 32];
        transfer_id.copy_from_slice(&raw[TRANSFER_ID]);

        let mut recipient = [0u8; ADDRESS_LENGTH];
        recipient.copy_from_slice(&raw[RECIPIENT]);
        let mut bridge_id = [0u8; ADDRESS_LENGTH];
        bridge_id.copy_from_slice(&raw[BRIDGE_ID]);

        Ok(Self {
            recipient: Address::from_bytes(recipient),
            amount: u128::from_be_bytes(amount),
            transfer_id: TransferId::from_bytes(transfer_id),
            bridge_id: Address::from_bytes(bridge_id),
        })
    }

    pub fn hash(&self) -> MessageHash {
        MessageHash::of(&self.encode())
    }
}
