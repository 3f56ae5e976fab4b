// Bridge module - HOME BRIDGE
// Wires validators, both ledgers, the rate limiter and the asset gateway
// into one atomic facade

mod config;
mod error;
mod events;
mod home;
mod snapshot;

pub use config::BridgeConfig;
pub use error::BridgeError;
pub use events::BridgeEvent;
pub use home::{AffirmationStatus, HomeBridge, SignatureStatus};
pub use snapshot::{LedgerSnapshot, SnapshotError};
