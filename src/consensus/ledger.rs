// Consensus ledger - aggregates validator affirmations for inbound claims

use crate::bridge::BridgeError;
use crate::consensus::{Claim, ClaimKey, RawCounter, TxHash};
use crate::identity::Address;
use crate::validators::ValidatorGate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Result of recording one affirmation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AffirmationVote {
    /// Vote recorded, quorum not yet reached
    Recorded { key: ClaimKey, votes: u32 },
    /// This vote brought the claim to quorum; the claim is now Processed
    Finalized { key: ClaimKey, votes: u32 },
}

/// Claims keyed by claim identity, plus the (validator, claim) votes cast.
///
/// Claims are created on the first vote and never deleted; once processed
/// they stay queryable as an audit trail.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConsensusLedger {
    claims: HashMap<ClaimKey, Claim>,
    votes: HashSet<(Address, ClaimKey)>,
}

impl ConsensusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `validator`'s affirmation of a claim.
    ///
    /// The threshold is read from `gate` on every call. All checks run
    /// before any state is touched.
    pub fn affirm(
        &mut self,
        gate: &ValidatorGate,
        validator: Address,
        recipient: Address,
        amount: u128,
        external_tx_id: TxHash,
    ) -> Result<AffirmationVote, BridgeError> {
        gate.ensure_validator(&validator)?;

        let key = ClaimKey::derive(&recipient, amount, &external_tx_id);
        if self.is_processed(&key) {
            return Err(BridgeError::AlreadyProcessed);
        }
        if self.votes.contains(&(validator, key)) {
            return Err(BridgeError::DuplicateVote(validator));
        }

        self.votes.insert((validator, key));
        let claim = self
            .claims
            .entry(key)
            .or_insert_with(|| Claim::new(recipient, amount, external_tx_id));
        let votes = claim.counter_mut().increment();

        debug!(%validator, ?key, votes, "affirmation recorded");

        if gate.quorum_reached(votes) {
            claim.counter_mut().mark_processed();
            Ok(AffirmationVote::Finalized { key, votes })
        } else {
            Ok(AffirmationVote::Recorded { key, votes })
        }
    }

    /// Get a claim by key
    pub fn claim(&self, key: &ClaimKey) -> Option<&Claim> {
        self.claims.get(key)
    }

    pub fn is_processed(&self, key: &ClaimKey) -> bool {
        self.claims
            .get(key)
            .is_some_and(|claim| claim.counter().is_processed())
    }

    /// Packed (count, processed) counter for a claim; zero if unknown
    pub fn raw_counter(&self, key: &ClaimKey) -> RawCounter {
        self.claims
            .get(key)
            .map(|claim| claim.counter().to_raw())
            .unwrap_or(0)
    }

    /// Whether `validator` has voted for the claim
    pub fn affirmation_signed(&self, validator: &Address, key: &ClaimKey) -> bool {
        self.votes.contains(&(*validator, *key))
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    /// Iterate over all claims
    pub fn claims(&self) -> impl Iterator<Item = &Claim> {
        self.claims.values()
    }
}
