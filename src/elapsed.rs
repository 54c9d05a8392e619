//! "How long ago" strings for play timestamps.

use time::OffsetDateTime;

const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_DAY: i64 = 86_400;

/// Format the time between `listened_at` and `now` (both Unix seconds, UTC).
///
/// Hours and days are floored, never rounded. A timestamp in the future (clock skew) reads as
/// `"Just now"`.
pub fn format_relative(listened_at: i64, now: i64) -> String {
    let elapsed = now.saturating_sub(listened_at);
    let hours = elapsed.div_euclid(SECS_PER_HOUR);

    match hours {
        h if h < 1 => "Just now".to_owned(),
        1 => "1 hour ago".to_owned(),
        h if h < 24 => format!("{h} hours ago"),
        h if h < 48 => "1 day ago".to_owned(),
        _ => format!("{} days ago", elapsed.div_euclid(SECS_PER_DAY)),
    }
}

/// Current wall-clock time as Unix seconds.
pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
#[path = "../tests/unit/elapsed.rs"]
mod tests;
