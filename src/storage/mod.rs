// Storage module - PERSISTENCE
// Keeps bridge snapshots and validator keys in sled

mod store;

pub use store::{BridgeStore, StorageStats, StoreError};
