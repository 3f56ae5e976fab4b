// Vote counter shared by the affirmation and signature ledgers

use serde::{Deserialize, Serialize};

/// Packed counter as exposed to callers: low bits hold the vote count, the
/// top bit is the processed flag.
pub type RawCounter = u128;

/// The processed flag bit of a `RawCounter`
pub const PROCESSED_FLAG: RawCounter = 1 << 127;

/// Whether a raw counter has its processed flag set.
///
/// Only the flag bit is inspected; the count bits are ignored.
pub fn is_already_processed(raw: RawCounter) -> bool {
    raw & PROCESSED_FLAG == PROCESSED_FLAG
}

/// Vote count and terminal flag for one claim or message
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounter {
    count: u32,
    processed: bool,
}

impl VoteCounter {
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub(crate) fn increment(&mut self) -> u32 {
        self.count += 1;
        self.count
    }

    pub(crate) fn mark_processed(&mut self) {
        self.processed = true;
    }

    /// Packed representation for raw-counter queries
    pub fn to_raw(&self) -> RawCounter {
        let raw = self.count as RawCounter;
        if self.processed {
            raw | PROCESSED_FLAG
        } else {
            raw
        }
    }

    /// Unpack a raw counter
    pub fn from_raw(raw: RawCounter) -> Self {
        Self {
            count: (raw & !PROCESSED_FLAG) as u32,
            processed: is_already_processed(raw),
        }
    }
}
