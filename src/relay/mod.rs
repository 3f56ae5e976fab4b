// Relay module - outbound release messages, signature collection and
// submission of collected bundles to the counterpart chain

mod bundle;
mod ledger;
mod message;
mod relayer;

pub use bundle::{BundleError, RelayBundle};
pub use ledger::{MessageStatus, OutboundMessage, RequestLedger, SignatureVote};
pub use message::{MessageError, MessageHash, ReleaseMessage, TransferId, MESSAGE_LENGTH};
pub use relayer::{
    MockRelayTarget, RelayError, RelayResult, RelayStatus, RelayTarget, Relayer, RelayerConfig,
    RelayerEvent, RelayerStats,
};
