//! Compact relative ages for the conversation list.

use chrono::{DateTime, Duration, Utc};

use crate::inbox::core::message::MessageTime;

/// Shown when the time could not be parsed.
pub const UNKNOWN_AGE: &str = "?";

/// Format the age of `at` relative to `now`.
///
/// `now` under a minute (or in the future), then `Nm`, `Nh`, `Nd`, `Nw`, and a
/// calendar date (`Jan 5`) from eight weeks on.
#[must_use]
pub fn format_relative(at: MessageTime, now: DateTime<Utc>) -> String {
    let Some(at) = at.instant() else {
        return UNKNOWN_AGE.to_string();
    };

    let age = now.signed_duration_since(at);
    if age < Duration::minutes(1) {
        "now".to_string()
    } else if age < Duration::hours(1) {
        format!("{}m", age.num_minutes())
    } else if age < Duration::days(1) {
        format!("{}h", age.num_hours())
    } else if age < Duration::weeks(1) {
        format!("{}d", age.num_days())
    } else if age < Duration::weeks(8) {
        format!("{}w", age.num_weeks())
    } else {
        at.format("%b %-d").to_string()
    }
}
