// Claim - one asserted counterpart-chain deposit awaiting quorum

use crate::consensus::VoteCounter;
use crate::identity::{hash32, keccak256_concat, Address};
use serde::{Deserialize, Serialize};

hash32!(
    /// Transaction identifier of the deposit on the counterpart chain
    TxHash,
    "TxHash"
);

hash32!(
    /// Identity of a claim: hash of (recipient, amount, external tx id)
    ClaimKey,
    "ClaimKey"
);

impl ClaimKey {
    /// Derive the claim key.
    ///
    /// The amount is encoded as a 32-byte big-endian integer, so the preimage
    /// is recipient (20) ‖ amount (32) ‖ tx id (32). Distinct (recipient,
    /// amount) reports under one tx id yield distinct keys.
    pub fn derive(recipient: &Address, amount: u128, external_tx_id: &TxHash) -> Self {
        let mut amount_bytes = [0u8; 32];
        amount_bytes[16..].copy_from_slice(&amount.to_be_bytes());
        Self(keccak256_concat(&[
            recipient.as_bytes().as_slice(),
            amount_bytes.as_slice(),
            external_tx_id.as_bytes().as_slice(),
        ]))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    Open,
    Processed,
}

/// A claim and its vote counter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    external_tx_id: TxHash,
    recipient: Address,
    amount: u128,
    counter: VoteCounter,
}

impl Claim {
    pub(crate) fn new(recipient: Address, amount: u128, external_tx_id: TxHash) -> Self {
        Self {
            external_tx_id,
            recipient,
            amount,
            counter: VoteCounter::default(),
        }
    }

    pub fn key(&self) -> ClaimKey {
        ClaimKey::derive(&self.recipient, self.amount, &self.external_tx_id)
    }

    pub fn external_tx_id(&self) -> &TxHash {
        &self.external_tx_id
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    pub fn amount(&self) -> u128 {
        self.amount
    }

    pub fn votes(&self) -> u32 {
        self.counter.count()
    }

    pub fn counter(&self) -> &VoteCounter {
        &self.counter
    }

    pub fn status(&self) -> ClaimStatus {
        if self.counter.is_processed() {
            ClaimStatus::Processed
        } else {
            ClaimStatus::Open
        }
    }

    pub(crate) fn counter_mut(&mut self) -> &mut VoteCounter {
        &mut self.counter
    }
}
