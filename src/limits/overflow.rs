// Overflow pool - amounts that passed claim quorum but exceeded the
// inbound limits, held until the administrator reconciles them

use crate::bridge::BridgeError;
use crate::consensus::TxHash;
use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Deferred amount remaining for one external transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverflowEntry {
    /// Recipient of the most recent deferral under this tx id
    pub recipient: Address,
    pub remaining: u128,
}

/// Invariant: `total_out_of_limit` equals the sum of all `remaining`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverflowPool {
    total_out_of_limit: u128,
    entries: HashMap<TxHash, OverflowEntry>,
}

impl OverflowPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a deferred amount under `external_tx_id`
    pub fn defer(&mut self, recipient: Address, amount: u128, external_tx_id: TxHash) {
        self.total_out_of_limit = self.total_out_of_limit.saturating_add(amount);
        let entry = self.entries.entry(external_tx_id).or_insert(OverflowEntry {
            recipient,
            remaining: 0,
        });
        entry.recipient = recipient;
        entry.remaining = entry.remaining.saturating_add(amount);
    }

    /// Release `amount` from the entry for `external_tx_id`.
    ///
    /// Returns the entry as it stands after the reduction.
    pub fn reduce(&mut self, external_tx_id: &TxHash, amount: u128) -> Result<OverflowEntry, BridgeError> {
        let entry = self
            .entries
            .get_mut(external_tx_id)
            .filter(|entry| entry.remaining > 0)
            .ok_or(BridgeError::UnknownOrExhausted(*external_tx_id))?;

        if amount > entry.remaining {
            return Err(BridgeError::ExceedsRemaining {
                requested: amount,
                remaining: entry.remaining,
            });
        }

        entry.remaining -= amount;
        self.total_out_of_limit -= amount;
        Ok(*entry)
    }

    pub fn total_out_of_limit(&self) -> u128 {
        self.total_out_of_limit
    }

    /// Remaining deferred amount for `external_tx_id`; zero if unknown
    pub fn remaining(&self, external_tx_id: &TxHash) -> u128 {
        self.entries
            .get(external_tx_id)
            .map(|entry| entry.remaining)
            .unwrap_or(0)
    }

    pub fn entry(&self, external_tx_id: &TxHash) -> Option<&OverflowEntry> {
        self.entries.get(external_tx_id)
    }
}
