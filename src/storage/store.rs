// BridgeStore - Persistent key-value storage using sled
//
// Holds:
// - The latest ledger snapshot
// - Validator signing keys, by label

use crate::bridge::{LedgerSnapshot, SnapshotError};
use crate::identity::Keypair;
use std::path::Path;
use thiserror::Error;

/// Key prefixes for organizing data
mod keys {
    pub const LEDGER_SNAPSHOT: &[u8] = b"ledger:snapshot";
    pub const VALIDATOR_KEY_PREFIX: &[u8] = b"validator:key:";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    /// Number of keys in the database
    pub key_count: usize,
    /// Approximate disk size in bytes
    pub disk_size_bytes: u64,
}

/// Persistent store for bridge state
///
/// Writes are atomic per key and durable after `flush`.
pub struct BridgeStore {
    db: sled::Db,
}

impl BridgeStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.db.is_empty())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    pub fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            key_count: self.db.len(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }

    // ========================================================================
    // RAW KEY-VALUE OPERATIONS
    // ========================================================================

    pub fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        Ok(())
    }

    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    pub fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.db.remove(key)?;
        Ok(())
    }

    /// List all keys with a given prefix
    pub fn list_keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, StoreError> {
        let mut keys = Vec::new();
        for result in self.db.scan_prefix(prefix) {
            let (key, _) = result?;
            keys.push(key.to_vec());
        }
        Ok(keys)
    }

    /// Delete all keys with a given prefix
    pub fn delete_with_prefix(&self, prefix: &[u8]) -> Result<usize, StoreError> {
        let mut deleted = 0;
        for result in self.db.scan_prefix(prefix) {
            let (key, _) = result?;
            self.db.remove(key)?;
            deleted += 1;
        }
        Ok(deleted)
    }

    // ========================================================================
    // LEDGER SNAPSHOT
    // ========================================================================

    /// Replace the stored snapshot
    pub fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<(), StoreError> {
        let bytes = snapshot
            .to_bytes()
            .map_err(|e: SnapshotError| StoreError::SerializationFailed(e.to_string()))?;
        self.put_raw(keys::LEDGER_SNAPSHOT, &bytes)
    }

    pub fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>, StoreError> {
        match self.get_raw(keys::LEDGER_SNAPSHOT)? {
            Some(bytes) => {
                let snapshot = LedgerSnapshot::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // VALIDATOR KEYS
    // ========================================================================

    /// Save a validator signing key under `label`
    pub fn save_validator_key(&self, label: &str, keypair: &Keypair) -> Result<(), StoreError> {
        let key = [keys::VALIDATOR_KEY_PREFIX, label.as_bytes()].concat();
        self.put_raw(&key, &keypair.to_bytes())
    }

    pub fn load_validator_key(&self, label: &str) -> Result<Option<Keypair>, StoreError> {
        let key = [keys::VALIDATOR_KEY_PREFIX, label.as_bytes()].concat();
        match self.get_raw(&key)? {
            Some(bytes) => {
                let keypair = Keypair::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(keypair))
            }
            None => Ok(None),
        }
    }

    /// Labels of all stored validator keys, in key order
    pub fn list_validator_keys(&self) -> Result<Vec<String>, StoreError> {
        let keys = self.list_keys_with_prefix(keys::VALIDATOR_KEY_PREFIX)?;
        Ok(keys
            .iter()
            .map(|key| {
                String::from_utf8_lossy(&key[keys::VALIDATOR_KEY_PREFIX.len()..]).into_owned()
            })
            .collect())
    }

    /// Remove every stored validator key; returns how many were removed
    pub fn clear_validator_keys(&self) -> Result<usize, StoreError> {
        self.delete_with_prefix(keys::VALIDATOR_KEY_PREFIX)
    }
}
