use crate::consensus::ConsensusLedger;
use crate::identity::Address;
use crate::limits::RateLimiter;
use crate::relay::RequestLedger;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to encode snapshot: {0}")]
    EncodeFailed(String),

    #[error("Failed to decode snapshot: {0}")]
    DecodeFailed(String),
}

/// Persistable bridge state: both ledgers, the limiter (windows, overflow
/// pool and bounds) and the administrative settings.
///
/// Collaborator handles are not part of the snapshot; they come from the
/// `BridgeConfig` the bridge is restored with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub bridge_id: Address,
    pub owner: Address,
    pub gas_price: u128,
    pub required_block_confirmations: u32,
    pub forwarding: Option<Address>,
    pub consensus: ConsensusLedger,
    pub requests: RequestLedger,
    pub limiter: RateLimiter,
}

impl LedgerSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        postcard::to_allocvec(self).map_err(|e| SnapshotError::EncodeFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        postcard::from_bytes(bytes).map_err(|e| SnapshotError::DecodeFailed(e.to_string()))
    }
}
