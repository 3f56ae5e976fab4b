use crate::bridge::BridgeError;
use serde::{Deserialize, Serialize};

/// Base units per whole token
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// Per-transaction and daily bounds for both directions.
///
/// Inbound (`daily_limit`, `max_per_tx`, `min_per_tx`) bounds credits
/// released from finalized claims. Outbound (`execution_daily_limit`,
/// `execution_max_per_tx`) bounds deposits raised for relay; outbound
/// deposits are also held to `min_per_tx`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub daily_limit: u128,
    pub max_per_tx: u128,
    pub min_per_tx: u128,
    pub execution_daily_limit: u128,
    pub execution_max_per_tx: u128,
}

impl LimitsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_daily_limit(mut self, limit: u128) -> Self {
        self.daily_limit = limit;
        self
    }

    pub fn with_max_per_tx(mut self, max: u128) -> Self {
        self.max_per_tx = max;
        self
    }

    pub fn with_min_per_tx(mut self, min: u128) -> Self {
        self.min_per_tx = min;
        self
    }

    pub fn with_execution_daily_limit(mut self, limit: u128) -> Self {
        self.execution_daily_limit = limit;
        self
    }

    pub fn with_execution_max_per_tx(mut self, max: u128) -> Self {
        self.execution_max_per_tx = max;
        self
    }

    /// Check `min_per_tx < max_per_tx <= daily_limit` and
    /// `min_per_tx < execution_max_per_tx <= execution_daily_limit`
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.min_per_tx >= self.max_per_tx {
            return Err(BridgeError::Validation(format!(
                "min_per_tx ({}) must be below max_per_tx ({})",
                self.min_per_tx, self.max_per_tx
            )));
        }
        if self.max_per_tx > self.daily_limit {
            return Err(BridgeError::Validation(format!(
                "max_per_tx ({}) must not exceed daily_limit ({})",
                self.max_per_tx, self.daily_limit
            )));
        }
        if self.min_per_tx >= self.execution_max_per_tx {
            return Err(BridgeError::Validation(format!(
                "min_per_tx ({}) must be below execution_max_per_tx ({})",
                self.min_per_tx, self.execution_max_per_tx
            )));
        }
        if self.execution_max_per_tx > self.execution_daily_limit {
            return Err(BridgeError::Validation(format!(
                "execution_max_per_tx ({}) must not exceed execution_daily_limit ({})",
                self.execution_max_per_tx, self.execution_daily_limit
            )));
        }
        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            daily_limit: 10_000 * UNIT,
            max_per_tx: 1_000 * UNIT,
            min_per_tx: UNIT / 100,
            execution_daily_limit: 10_000 * UNIT,
            execution_max_per_tx: 1_000 * UNIT,
        }
    }
}
