use crate::consensus::TxHash;
use crate::gateway::TokenError;
use crate::relay::MessageError;
use thiserror::Error;

/// Errors returned by bridge operations.
///
/// Every error aborts the whole operation; no partial state change is ever
/// left behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Caller lacks the required role or validator status, or the recovered
    /// signer does not match the caller
    #[error("Unauthorized: {0}")]
    Authorization(String),

    /// The claim or message has already reached quorum
    #[error("Already processed")]
    AlreadyProcessed,

    /// The same validator voted twice on the same key
    #[error("Duplicate vote from {0}")]
    DuplicateVote(crate::identity::Address),

    /// Malformed configuration, null address, wrong-length message or
    /// invalid bound ordering
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Amount {requested} exceeds remaining {remaining}")]
    ExceedsRemaining { requested: u128, remaining: u128 },

    #[error("No deferred amount remains for {0}")]
    UnknownOrExhausted(TxHash),

    /// A collaborator call failed; the operation was reverted
    #[error("Collaborator call failed: {0}")]
    Collaborator(#[from] TokenError),
}

impl From<MessageError> for BridgeError {
    fn from(err: MessageError) -> Self {
        BridgeError::Validation(err.to_string())
    }
}
