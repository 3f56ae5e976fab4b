// Limits module - daily windows, per-transaction bounds and the overflow pool

mod clock;
mod config;
mod limiter;
mod overflow;
mod window;

pub use clock::{Clock, ManualClock, SystemClock, SECONDS_PER_DAY};
pub use config::{LimitsConfig, UNIT};
pub use limiter::{RateLimiter, ReleaseDecision};
pub use overflow::{OverflowEntry, OverflowPool};
pub use window::DailyWindow;
