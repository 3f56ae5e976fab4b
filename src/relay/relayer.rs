// Relayer - pushes collected-signature bundles to the counterpart chain
// Runs off the consensus path; the bridge only names who should relay

use crate::relay::{MessageHash, RelayBundle};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// RELAY TARGET TRAIT
// ============================================================================

/// Submission endpoint on the counterpart chain
#[async_trait]
pub trait RelayTarget: Send + Sync {
    /// Submit a bundle
    /// Returns the counterpart transaction id on success, error message on failure
    async fn relay(&self, bundle: &RelayBundle) -> Result<String, String>;
}

// ============================================================================
// MOCK RELAY TARGET
// ============================================================================

/// Mock implementation of RelayTarget for testing
pub struct MockRelayTarget {
    should_succeed: bool,
    failure_message: Option<String>,
    delay_ms: u64,
    failures_before_success: AtomicUsize,
    call_count: AtomicUsize,
}

impl MockRelayTarget {
    /// Create a new mock target (defaults to failure)
    pub fn new() -> Self {
        Self {
            should_succeed: false,
            failure_message: None,
            delay_ms: 0,
            failures_before_success: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Configure to always succeed
    pub fn with_success(mut self) -> Self {
        self.should_succeed = true;
        self
    }

    /// Configure to always fail with a message
    pub fn with_failure(mut self, message: String) -> Self {
        self.should_succeed = false;
        self.failure_message = Some(message);
        self
    }

    /// Add a delay before responding
    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Fail N times, then succeed
    pub fn with_failures_then_success(mut self, failures: usize) -> Self {
        self.should_succeed = true;
        self.failures_before_success = AtomicUsize::new(failures);
        self
    }

    /// Number of relay calls received
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl Default for MockRelayTarget {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelayTarget for MockRelayTarget {
    async fn relay(&self, bundle: &RelayBundle) -> Result<String, String> {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        let failures_remaining = self.failures_before_success.load(Ordering::SeqCst);

        if failures_remaining > 0 && call_num < failures_remaining {
            return Err(self
                .failure_message
                .clone()
                .unwrap_or_else(|| "Mock failure".to_string()));
        }

        if self.should_succeed {
            Ok(format!("relay-{}-{}", hex::encode(&bundle.message_hash().as_bytes()[..4]), call_num))
        } else {
            Err(self
                .failure_message
                .clone()
                .unwrap_or_else(|| "Mock failure".to_string()))
        }
    }
}

// ============================================================================
// RELAY STATUS / RESULT / EVENTS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayStatus {
    /// Queued but not yet attempted
    Pending,
    /// Submission in progress
    Relaying,
    /// Accepted by the counterpart chain
    Relayed,
    /// All attempts exhausted
    Failed,
}

/// Result of a relay attempt
#[derive(Clone, Debug)]
pub struct RelayResult {
    message_hash: MessageHash,
    transaction_id: Option<String>,
    error_message: Option<String>,
    attempts: u32,
}

impl RelayResult {
    pub fn success(message_hash: MessageHash, transaction_id: String, attempts: u32) -> Self {
        Self {
            message_hash,
            transaction_id: Some(transaction_id),
            error_message: None,
            attempts,
        }
    }

    pub fn failure(message_hash: MessageHash, error_message: String, attempts: u32) -> Self {
        Self {
            message_hash,
            transaction_id: None,
            error_message: Some(error_message),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        self.transaction_id.is_some()
    }

    pub fn message_hash(&self) -> &MessageHash {
        &self.message_hash
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Events emitted by the relayer
#[derive(Clone, Debug)]
pub enum RelayerEvent {
    BundleQueued {
        message_hash: MessageHash,
        signatures: usize,
    },
    BundleRelayed {
        message_hash: MessageHash,
        transaction_id: String,
        attempts: u32,
    },
    RelayFailed {
        message_hash: MessageHash,
        error: String,
        attempts: u32,
    },
}

// ============================================================================
// RELAYER CONFIG
// ============================================================================

/// Configuration for the relayer
#[derive(Clone, Debug)]
pub struct RelayerConfig {
    /// Maximum number of retry attempts after the first
    pub max_retries: u32,
    /// Delay between retries in milliseconds
    pub retry_delay_ms: u64,
    /// Timeout for each submission in milliseconds
    pub timeout_ms: u64,
}

impl RelayerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_delay_ms(mut self, ms: u64) -> Self {
        self.retry_delay_ms = ms;
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.timeout_ms == 0 {
            return Err(RelayError::InvalidConfig(
                "timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1_000,
            timeout_ms: 30_000,
        }
    }
}

/// Statistics about relayer operations
#[derive(Clone, Debug, Default)]
pub struct RelayerStats {
    pub bundles_queued: u64,
    pub bundles_relayed: u64,
    pub bundles_failed: u64,
}

/// Errors that can occur while relaying
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Bundle carries no signatures")]
    NoSignatures,

    #[error("Duplicate bundle: already queued")]
    DuplicateBundle,

    #[error("Bundle not found")]
    BundleNotFound,

    #[error("Bundle already relayed")]
    AlreadyRelayed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// ============================================================================
// RELAYER
// ============================================================================

struct Entry {
    bundle: RelayBundle,
    status: RelayStatus,
}

/// Relayer submitting bundles to a counterpart-chain target with retries
pub struct Relayer {
    config: RelayerConfig,
    target: Box<dyn RelayTarget>,
    entries: HashMap<MessageHash, Entry>,
    events: Vec<RelayerEvent>,
    stats: RelayerStats,
}

impl Relayer {
    pub fn new(config: RelayerConfig, target: Box<dyn RelayTarget>) -> Result<Self, RelayError> {
        config.validate()?;
        Ok(Self {
            config,
            target,
            entries: HashMap::new(),
            events: Vec::new(),
            stats: RelayerStats::default(),
        })
    }

    /// Queue a bundle for relay
    pub fn submit(&mut self, bundle: RelayBundle) -> Result<(), RelayError> {
        if bundle.signatures().is_empty() {
            return Err(RelayError::NoSignatures);
        }
        let hash = *bundle.message_hash();
        if self.entries.contains_key(&hash) {
            return Err(RelayError::DuplicateBundle);
        }

        self.events.push(RelayerEvent::BundleQueued {
            message_hash: hash,
            signatures: bundle.signatures().len(),
        });
        self.stats.bundles_queued += 1;
        self.entries.insert(
            hash,
            Entry {
                bundle,
                status: RelayStatus::Pending,
            },
        );
        Ok(())
    }

    /// Relay a queued bundle, retrying per the configuration
    pub async fn process(&mut self, hash: &MessageHash) -> Result<RelayResult, RelayError> {
        let entry = self.entries.get_mut(hash).ok_or(RelayError::BundleNotFound)?;
        if entry.status == RelayStatus::Relayed {
            return Err(RelayError::AlreadyRelayed);
        }
        entry.status = RelayStatus::Relaying;

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let mut attempts = 0u32;
        let last_error = loop {
            attempts += 1;

            let error = match tokio::time::timeout(timeout, self.target.relay(&entry.bundle)).await {
                Ok(Ok(tx_id)) => {
                    entry.status = RelayStatus::Relayed;
                    self.stats.bundles_relayed += 1;
                    info!(?hash, %tx_id, attempts, "bundle relayed");
                    self.events.push(RelayerEvent::BundleRelayed {
                        message_hash: *hash,
                        transaction_id: tx_id.clone(),
                        attempts,
                    });
                    return Ok(RelayResult::success(*hash, tx_id, attempts));
                }
                Ok(Err(e)) => e,
                Err(_) => "Timeout".to_string(),
            };

            warn!(?hash, attempts, %error, "relay attempt failed");
            if attempts > self.config.max_retries {
                break error;
            }
            if self.config.retry_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
            }
        };

        entry.status = RelayStatus::Failed;
        self.stats.bundles_failed += 1;
        self.events.push(RelayerEvent::RelayFailed {
            message_hash: *hash,
            error: last_error.clone(),
            attempts,
        });
        Ok(RelayResult::failure(*hash, last_error, attempts))
    }

    pub fn status(&self, hash: &MessageHash) -> Option<RelayStatus> {
        self.entries.get(hash).map(|e| e.status.clone())
    }

    /// Number of bundles not yet relayed or failed
    pub fn pending(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e.status, RelayStatus::Pending | RelayStatus::Relaying))
            .count()
    }

    /// Poll for events (clears the event queue)
    pub fn poll_events(&mut self) -> Vec<RelayerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn stats(&self) -> &RelayerStats {
        &self.stats
    }
}
