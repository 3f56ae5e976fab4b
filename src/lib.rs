//! Home side of a two-chain asset bridge.
//!
//! Validators affirm deposits seen on the counterpart chain; once enough
//! affirmations agree, the amount is credited here (or parked if it breaks
//! the daily limits). In the other direction, deposits arriving here become
//! 104-byte release messages that validators sign; the collected signatures
//! are bundled for relay to the counterpart chain.

pub mod bridge;
pub mod consensus;
pub mod gateway;
pub mod identity;
pub mod limits;
pub mod relay;
pub mod storage;
pub mod validators;

pub use bridge::{
    AffirmationStatus, BridgeConfig, BridgeError, BridgeEvent, HomeBridge, LedgerSnapshot,
    SignatureStatus,
};
pub use identity::{Address, Keypair, Signature, Signer};
