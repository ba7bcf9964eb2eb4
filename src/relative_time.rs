// Luggage Telemetry - Aggregation and status engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Relative time formatting
//!
//! "Last updated ..." strings depend on wall-clock time, so callers re-run
//! [`describe`] on a fixed cadence even when no new data arrived.
//! [`RefreshSchedule`] is the pure half of that policy; the async timer that
//! drives it lives with the host.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;
const MONTH: i64 = 2_592_000; // 30 days

/// Describe how long ago `reference` was, as seen at `now`.
///
/// A reference in the future reads as "Now".
pub fn describe(reference: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - reference).num_seconds();

    if elapsed < MINUTE {
        "Last updated Now".to_string()
    } else if elapsed < HOUR {
        plural(elapsed / MINUTE, "a minute", "minutes")
    } else if elapsed < DAY {
        plural(elapsed / HOUR, "an hour", "hours")
    } else if elapsed < MONTH {
        plural(elapsed / DAY, "a day", "days")
    } else {
        "Last updated a while ago".to_string()
    }
}

fn plural(n: i64, one: &str, many: &str) -> String {
    if n == 1 {
        format!("Last updated {} ago", one)
    } else {
        format!("Last updated {} {} ago", n, many)
    }
}

/// Describe when a stationary item last moved.
///
/// Same calendar day (in `offset`) renders the time of day only, e.g.
/// "Since 3:45 PM"; otherwise the weekday is appended: "Since 3:45 PM Monday".
pub fn describe_stationary_since(
    last_moved: DateTime<Utc>,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> String {
    let moved = last_moved.with_timezone(&offset);
    let today = now.with_timezone(&offset);

    if moved.date_naive() == today.date_naive() {
        format!("Since {}", moved.format("%-I:%M %p"))
    } else {
        format!("Since {}", moved.format("%-I:%M %p %A"))
    }
}

/// When relative-time text must be recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    pub interval: Duration,
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self::from_secs(60)
    }
}

impl RefreshSchedule {
    pub fn from_secs(secs: u32) -> Self {
        Self {
            interval: Duration::from_secs(u64::from(secs)),
        }
    }

    /// Next instant a refresh is needed after `last_refresh`.
    pub fn next_due(&self, last_refresh: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.interval)
            .ok()
            .and_then(|interval| last_refresh.checked_add_signed(interval))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether text rendered at `last_refresh` is stale at `now`.
    pub fn is_due(&self, last_refresh: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now >= self.next_due(last_refresh)
    }
}
