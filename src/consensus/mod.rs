// Consensus module - inbound claims and the quorum that finalizes them

mod claim;
mod counter;
mod ledger;

pub use claim::{Claim, ClaimKey, ClaimStatus, TxHash};
pub use counter::{is_already_processed, RawCounter, VoteCounter, PROCESSED_FLAG};
pub use ledger::{AffirmationVote, ConsensusLedger};
