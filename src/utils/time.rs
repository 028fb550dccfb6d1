//! Time utilities for status queries and CLI instants

use crate::error::Result;
use crate::ranges::parse_date;
use crate::types::TimeRange;
use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Default look-back when loading status records
pub const LOAD_WINDOW_DAYS: i64 = 7;

/// Default look-back for the start of a time-bounded delete
pub const DELETE_WINDOW_DAYS: i64 = 365;

/// Window ending now and starting `days` ago.
pub fn trailing_window(days: i64) -> TimeRange {
    let now = Utc::now();
    TimeRange::new(now - Duration::days(days), now)
}

/// Fill in missing window bounds: `end` defaults to now, `start` to
/// `default_days` before now.
pub fn window_or_default(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    default_days: i64,
) -> TimeRange {
    let fallback = trailing_window(default_days);
    TimeRange::new(start.unwrap_or(fallback.start), end.unwrap_or(fallback.end))
}

/// Parse an instant given either as RFC 3339 or as `YYYY-MM-DD`
/// (midnight UTC).
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    let day = parse_date(input)?;
    Ok(day.and_time(NaiveTime::MIN).and_utc())
}
