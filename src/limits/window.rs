use serde::{Deserialize, Serialize};

/// Volume spent during one accounting day.
///
/// Rolls over lazily: any query or record for a later day sees zero spent,
/// and recording for a new day discards the old total. No history is kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyWindow {
    day_index: u64,
    spent: u128,
}

impl DailyWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount spent on `day`
    pub fn spent_on(&self, day: u64) -> u128 {
        if day == self.day_index {
            self.spent
        } else {
            0
        }
    }

    /// Whether `amount` fits under `daily_limit` on `day`
    pub fn fits(&self, day: u64, amount: u128, daily_limit: u128) -> bool {
        self.spent_on(day)
            .checked_add(amount)
            .is_some_and(|total| total <= daily_limit)
    }

    /// Add `amount` to the total for `day`
    pub fn record(&mut self, day: u64, amount: u128) {
        if day != self.day_index {
            self.day_index = day;
            self.spent = 0;
        }
        self.spent = self.spent.saturating_add(amount);
    }

    pub fn day_index(&self) -> u64 {
        self.day_index
    }
}
