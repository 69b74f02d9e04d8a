//! Daily decision quota policy.
//!
//! The quota window is anchored to a fixed calendar-day cutover at 00:00 UTC,
//! not a sliding 24h window from "now". Every caller derives the same window
//! for the same instant regardless of its local timezone.

use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Decisions an actor may submit within one UTC calendar day.
pub const DAILY_LIMIT: u32 = 12;

/// Start of the quota window containing `now`: midnight UTC of `now`'s date.
#[must_use]
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Start of the next quota window, when the count resets.
#[must_use]
pub fn next_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    window_start(now) + Duration::days(1)
}

/// Decisions left given `used` decisions in the current window. Never negative.
#[must_use]
pub const fn remaining(limit: u32, used: u32) -> u32 {
    limit.saturating_sub(used)
}
