// Rate limiter - per-transaction and daily bounds in both directions,
// plus the overflow pool for inbound amounts that cannot be released

use crate::bridge::BridgeError;
use crate::consensus::TxHash;
use crate::identity::Address;
use crate::limits::{Clock, DailyWindow, LimitsConfig, OverflowEntry, OverflowPool, SystemClock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// What happened to a finalized claim's amount
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseDecision {
    /// Within limits; counted against today's inbound window and credited
    Released,
    /// Over a limit; parked in the overflow pool
    Deferred,
}

fn default_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimiter {
    config: LimitsConfig,
    inbound: DailyWindow,
    outbound: DailyWindow,
    overflow: OverflowPool,
    #[serde(skip, default = "default_clock")]
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter; the configuration must satisfy its bound ordering
    pub fn new(config: LimitsConfig, clock: Arc<dyn Clock>) -> Result<Self, BridgeError> {
        config.validate()?;
        Ok(Self {
            config,
            inbound: DailyWindow::new(),
            outbound: DailyWindow::new(),
            overflow: OverflowPool::new(),
            clock,
        })
    }

    /// Replace the time source (used after loading a persisted limiter)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &LimitsConfig {
        &self.config
    }

    pub fn today(&self) -> u64 {
        self.clock.day_index()
    }

    // ========================================================================
    // INBOUND
    // ========================================================================

    /// Whether an inbound release of `amount` fits today's bounds.
    ///
    /// A zero amount always fits.
    pub fn is_within_limit(&self, amount: u128) -> bool {
        amount == 0
            || (amount <= self.config.max_per_tx
                && self.inbound.fits(self.today(), amount, self.config.daily_limit))
    }

    /// Decide release-or-defer for a finalized claim.
    ///
    /// On `Released` the amount is counted against today's window and the
    /// caller must credit the recipient. On `Deferred` it is parked in the
    /// overflow pool; nothing retries it automatically.
    pub fn try_release(
        &mut self,
        recipient: Address,
        amount: u128,
        external_tx_id: TxHash,
    ) -> ReleaseDecision {
        if self.is_within_limit(amount) {
            let day = self.today();
            self.inbound.record(day, amount);
            ReleaseDecision::Released
        } else {
            self.overflow.defer(recipient, amount, external_tx_id);
            info!(%recipient, amount, ?external_tx_id, "amount deferred over limit");
            ReleaseDecision::Deferred
        }
    }

    /// Release part of a deferred amount. Returns the entry after reduction.
    pub fn reconcile(
        &mut self,
        external_tx_id: &TxHash,
        amount: u128,
    ) -> Result<OverflowEntry, BridgeError> {
        self.overflow.reduce(external_tx_id, amount)
    }

    pub fn inbound_spent_on(&self, day: u64) -> u128 {
        self.inbound.spent_on(day)
    }

    pub fn out_of_limit_amount(&self) -> u128 {
        self.overflow.total_out_of_limit()
    }

    pub fn remaining_out_of_limit(&self, external_tx_id: &TxHash) -> u128 {
        self.overflow.remaining(external_tx_id)
    }

    pub fn overflow(&self) -> &OverflowPool {
        &self.overflow
    }

    // ========================================================================
    // OUTBOUND
    // ========================================================================

    /// Check an outbound deposit against `min_per_tx`,
    /// `execution_max_per_tx` and today's outbound window
    pub fn check_outbound(&self, amount: u128) -> Result<(), BridgeError> {
        if amount < self.config.min_per_tx {
            return Err(BridgeError::Validation(format!(
                "amount {} below min_per_tx {}",
                amount, self.config.min_per_tx
            )));
        }
        if amount > self.config.execution_max_per_tx {
            return Err(BridgeError::Validation(format!(
                "amount {} above execution_max_per_tx {}",
                amount, self.config.execution_max_per_tx
            )));
        }
        if !self
            .outbound
            .fits(self.today(), amount, self.config.execution_daily_limit)
        {
            return Err(BridgeError::Validation(format!(
                "amount {} exceeds remaining execution_daily_limit",
                amount
            )));
        }
        Ok(())
    }

    /// Count an accepted outbound deposit against today's window
    pub fn record_outbound(&mut self, amount: u128) {
        let day = self.today();
        self.outbound.record(day, amount);
    }

    pub fn outbound_spent_on(&self, day: u64) -> u128 {
        self.outbound.spent_on(day)
    }

    // ========================================================================
    // CONFIGURATION
    // ========================================================================

    fn reconfigure(&mut self, candidate: LimitsConfig) -> Result<(), BridgeError> {
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    pub fn set_daily_limit(&mut self, limit: u128) -> Result<(), BridgeError> {
        self.reconfigure(self.config.with_daily_limit(limit))
    }

    pub fn set_max_per_tx(&mut self, max: u128) -> Result<(), BridgeError> {
        self.reconfigure(self.config.with_max_per_tx(max))
    }

    pub fn set_min_per_tx(&mut self, min: u128) -> Result<(), BridgeError> {
        self.reconfigure(self.config.with_min_per_tx(min))
    }

    pub fn set_execution_daily_limit(&mut self, limit: u128) -> Result<(), BridgeError> {
        self.reconfigure(self.config.with_execution_daily_limit(limit))
    }

    pub fn set_execution_max_per_tx(&mut self, max: u128) -> Result<(), BridgeError> {
        self.reconfigure(self.config.with_execution_max_per_tx(max))
    }
}
