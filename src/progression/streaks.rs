//! Streak tracking
//!
//! Tracks consecutive days of tutorial activity. The caller decides what a
//! "day" is and passes it in; only [`today`] reads the clock.

use chrono::{Local, NaiveDate};
use serde::Serialize;

/// Consecutive-day engagement streak
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub current: u32,
    pub longest: u32,
    pub last_active_day: Option<NaiveDate>,
}

impl Streak {
    /// Record activity on `day`.
    ///
    /// Returns the new current streak when it changed, `None` when the day was
    /// already counted (or lies before the last counted day).
    pub fn record(&mut self, day: NaiveDate) -> Option<u32> {
        let next = match self.last_active_day {
            Some(last) if day <= last => return None,
            Some(last) if last.succ_opt() == Some(day) => self.current + 1,
            _ => 1,
        };

        self.current = next;
        self.longest = self.longest.max(next);
        self.last_active_day = Some(day);
        Some(next)
    }
}

/// Today's local calendar day
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
