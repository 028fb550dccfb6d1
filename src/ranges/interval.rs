//! How a span is cut: calendar periods or fixed-length windows

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// How a date span is cut into segments.
///
/// Raw inputs are resolved once, at the entry point: the keywords `monthly`,
/// `yearly`, `quarterly`, `weekly` and `daily` (exact, case-sensitive), a
/// string of ASCII digits (a day count), or an integer day count. Anything
/// else becomes [`IntervalSpec::Unrecognized`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalSpec {
    /// Calendar months
    #[default]
    Monthly,
    /// Calendar years
    Yearly,
    /// Calendar quarters (Jan-Mar, Apr-Jun, Jul-Sep, Oct-Dec)
    Quarterly,
    /// Seven-day windows starting at the cursor, not aligned to weekdays
    Weekly,
    /// One segment per day
    Daily,
    /// Windows of `n` days, `n >= 1`
    FixedDays(u64),
    /// Fallback: the whole span as a single, unparsed segment
    Unrecognized,
}

impl IntervalSpec {
    /// Build a fixed-day interval; non-positive counts collapse to one day.
    pub fn fixed_days(days: i64) -> Self {
        IntervalSpec::FixedDays(days.max(1) as u64)
    }

    /// Days added to a segment's first day to reach its last day, for the
    /// windowed intervals. Calendar intervals return `None`.
    pub fn window_days(&self) -> Option<u64> {
        match self {
            IntervalSpec::Weekly => Some(6),
            IntervalSpec::Daily => Some(0),
            IntervalSpec::FixedDays(n) => Some(n.saturating_sub(1)),
            _ => None,
        }
    }

    pub fn is_calendar(&self) -> bool {
        matches!(
            self,
            IntervalSpec::Monthly | IntervalSpec::Yearly | IntervalSpec::Quarterly
        )
    }
}

impl FromStr for IntervalSpec {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = match s {
            "monthly" => IntervalSpec::Monthly,
            "yearly" => IntervalSpec::Yearly,
            "quarterly" => IntervalSpec::Quarterly,
            "weekly" => IntervalSpec::Weekly,
            "daily" => IntervalSpec::Daily,
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                // Only overflow can fail here
                let days = digits.parse::<u64>().unwrap_or(u64::MAX);
                IntervalSpec::FixedDays(days.max(1))
            }
            _ => IntervalSpec::Unrecognized,
        };
        Ok(spec)
    }
}

impl From<&str> for IntervalSpec {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(spec) => spec,
            Err(never) => match never {},
        }
    }
}

impl From<String> for IntervalSpec {
    fn from(s: String) -> Self {
        IntervalSpec::from(s.as_str())
    }
}

impl From<&String> for IntervalSpec {
    fn from(s: &String) -> Self {
        IntervalSpec::from(s.as_str())
    }
}

impl From<i64> for IntervalSpec {
    fn from(days: i64) -> Self {
        IntervalSpec::fixed_days(days)
    }
}

impl From<i32> for IntervalSpec {
    fn from(days: i32) -> Self {
        IntervalSpec::fixed_days(days as i64)
    }
}

impl fmt::Display for IntervalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalSpec::Monthly => write!(f, "monthly"),
            IntervalSpec::Yearly => write!(f, "yearly"),
            IntervalSpec::Quarterly => write!(f, "quarterly"),
            IntervalSpec::Weekly => write!(f, "weekly"),
            IntervalSpec::Daily => write!(f, "daily"),
            IntervalSpec::FixedDays(n) => write!(f, "{}", n),
            IntervalSpec::Unrecognized => write!(f, "unrecognized"),
        }
    }
}
