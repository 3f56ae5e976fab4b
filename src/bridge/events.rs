use crate::consensus::TxHash;
use crate::identity::Address;
use crate::limits::ReleaseDecision;
use crate::relay::{MessageHash, TransferId};
use serde::{Deserialize, Serialize};

/// Observable notifications raised by bridge operations.
///
/// Events belong to the operation that raised them: if the operation is
/// reverted, so are its events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeEvent {
    /// A validator affirmed a claim
    SignedForAffirmation {
        signer: Address,
        external_tx_id: TxHash,
    },
    /// A claim reached quorum; fires exactly once per claim
    AffirmationCompleted {
        recipient: Address,
        amount: u128,
        external_tx_id: TxHash,
        decision: ReleaseDecision,
    },
    /// A finalized claim's amount went to the overflow pool
    AmountLimitExceeded {
        recipient: Address,
        amount: u128,
        external_tx_id: TxHash,
    },
    /// Part of a deferred amount was reconciled
    AssetAboveLimitsFixed {
        external_tx_id: TxHash,
        released: u128,
        remaining: u128,
    },
    /// A release message is waiting for validator signatures
    UserRequestForSignature {
        recipient: Address,
        amount: u128,
        transfer_id: TransferId,
        message: Vec<u8>,
    },
    /// A validator signed a release message
    SignedForUserRequest {
        signer: Address,
        message_hash: MessageHash,
    },
    /// A release message reached quorum and is ready to relay
    CollectedSignatures {
        responsible_signer: Address,
        message_hash: MessageHash,
        signatures: u32,
    },
    DailyLimitChanged {
        limit: u128,
    },
    ExecutionDailyLimitChanged {
        limit: u128,
    },
    MaxPerTxChanged {
        max: u128,
    },
    MinPerTxChanged {
        min: u128,
    },
    ExecutionMaxPerTxChanged {
        max: u128,
    },
    GasPriceChanged {
        gas_price: u128,
    },
    RequiredBlockConfirmationChanged {
        confirmations: u32,
    },
    ForwardingAddressChanged {
        forwarding: Option<Address>,
    },
    TokensClaimed {
        asset: Address,
        to: Address,
    },
}
