use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// Seconds in one accounting day
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Time source for the daily windows
pub trait Clock: Debug + Send + Sync {
    /// Current unix time in seconds
    fn now(&self) -> u64;

    /// Index of the current accounting day
    fn day_index(&self) -> u64 {
        self.now() / SECONDS_PER_DAY
    }
}

/// Wall-clock time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Manually driven clock for deterministic tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: u64) {
        self.advance(days * SECONDS_PER_DAY);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
