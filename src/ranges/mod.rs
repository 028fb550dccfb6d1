//! Date range partitioning
//!
//! Cuts an inclusive `[start, end]` date span into ordered, contiguous
//! segments: calendar months, quarters or years, or fixed-length windows.
//! The last segment is always clamped to `end`.

mod calendar;
mod interval;

pub use calendar::{first_day_of_month, last_day_of_month, last_day_of_quarter, last_day_of_year};
pub use interval::IntervalSpec;

use crate::error::{Error, Result};
use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;
use std::fmt;

/// Date format used on both sides of the string API
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Four-digit year; month and day may drop their leading zero
static DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("static regex"));

/// One contiguous chunk of a partition, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Segment {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Segment {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of days covered, counting both ends
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn to_strings(&self) -> (String, String) {
        (
            self.start.format(DATE_FORMAT).to_string(),
            self.end.format(DATE_FORMAT).to_string(),
        )
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "('{}', '{}')",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Lazy iterator over the segments of a partition
#[derive(Debug, Clone)]
pub struct Segments {
    cursor: Option<NaiveDate>,
    end: NaiveDate,
    interval: IntervalSpec,
}

impl Segments {
    /// `Unrecognized` yields `(start, end)` once, whatever their order.
    pub fn new(start: NaiveDate, end: NaiveDate, interval: IntervalSpec) -> Self {
        Self {
            cursor: Some(start),
            end,
            interval,
        }
    }

    /// End of the period containing `day`, before clamping.
    /// `None` means the period runs past the representable dates.
    fn natural_end(&self, day: NaiveDate) -> Option<NaiveDate> {
        match self.interval {
            IntervalSpec::Monthly => Some(last_day_of_month(day)),
            IntervalSpec::Yearly => Some(last_day_of_year(day)),
            IntervalSpec::Quarterly => Some(last_day_of_quarter(day)),
            IntervalSpec::Unrecognized => Some(self.end),
            windowed => {
                let window = windowed.window_days().unwrap_or(0);
                day.checked_add_days(Days::new(window))
            }
        }
    }
}

impl Iterator for Segments {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let cursor = self.cursor?;

        if self.interval == IntervalSpec::Unrecognized {
            self.cursor = None;
            return Some(Segment::new(cursor, self.end));
        }

        if cursor > self.end {
            self.cursor = None;
            return None;
        }

        let segment_end = match self.natural_end(cursor) {
            Some(natural) => natural.min(self.end),
            None => self.end,
        };
        self.cursor = segment_end.succ_opt();

        Some(Segment::new(cursor, segment_end))
    }
}

/// Partition `[start, end]` by `interval`.
///
/// Empty when `start > end`, except for [`IntervalSpec::Unrecognized`],
/// which always returns the single segment `(start, end)`.
pub fn partition_dates(start: NaiveDate, end: NaiveDate, interval: IntervalSpec) -> Vec<Segment> {
    Segments::new(start, end, interval).collect()
}

/// Parse a `YYYY-MM-DD` date.
///
/// Surrounding whitespace, signed years and years beyond four digits are
/// rejected before chrono sees the text.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    if !DATE_SHAPE.is_match(input) {
        return Err(Error::InvalidDate {
            input: input.to_string(),
            source: None,
        });
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|source| Error::InvalidDate {
        input: input.to_string(),
        source: Some(source),
    })
}

/// Partition a span given as `YYYY-MM-DD` strings.
///
/// Both dates are parsed before anything else, so a malformed date fails the
/// whole call. An unrecognized interval returns the inputs verbatim as one
/// pair.
pub fn generate_time_ranges(
    start_date: &str,
    end_date: &str,
    interval: impl Into<IntervalSpec>,
) -> Result<Vec<(String, String)>> {
    let start = parse_date(start_date)?;
    let end = parse_date(end_date)?;
    let interval = interval.into();

    if interval == IntervalSpec::Unrecognized {
        log::debug!("unrecognized interval, returning {}..{} as is", start_date, end_date);
        return Ok(vec![(start_date.to_string(), end_date.to_string())]);
    }

    Ok(Segments::new(start, end, interval)
        .map(|segment| segment.to_strings())
        .collect())
}

/// Same as [`generate_time_ranges`] with [`IntervalSpec::Monthly`].
pub fn split_into_months(start_date: &str, end_date: &str) -> Result<Vec<(String, String)>> {
    generate_time_ranges(start_date, end_date, IntervalSpec::Monthly)
}
