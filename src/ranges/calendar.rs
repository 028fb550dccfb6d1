//! Calendar boundary helpers

use chrono::{Datelike, Days, NaiveDate};

/// First day of the month containing `day`.
pub fn first_day_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Last day of the month containing `day`.
///
/// Day 28 exists in every month and four days later is always in the next
/// month; stepping back by that date's day-of-month lands on the last day
/// of the original month.
pub fn last_day_of_month(day: NaiveDate) -> NaiveDate {
    let day_28 = day.with_day(28).unwrap_or(day);
    match day_28.checked_add_days(Days::new(4)) {
        Some(next_month) => next_month - Days::new(next_month.day() as u64),
        // Only December of the last representable year gets here
        None => NaiveDate::from_ymd_opt(day.year(), 12, 31).unwrap_or(day),
    }
}

/// Last day of the calendar quarter containing `day`.
pub fn last_day_of_quarter(day: NaiveDate) -> NaiveDate {
    let (month, last) = match day.month() {
        1..=3 => (3, 31),
        4..=6 => (6, 30),
        7..=9 => (9, 30),
        _ => (12, 31),
    };
    NaiveDate::from_ymd_opt(day.year(), month, last).unwrap_or(day)
}

/// December 31 of the year containing `day`.
pub fn last_day_of_year(day: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(day.year(), 12, 31).unwrap_or(day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn first_day_of_month_resets_day() {
        assert_eq!(first_day_of_month(d("2020-02-15")), d("2020-02-01"));
        assert_eq!(first_day_of_month(d("2020-02-01")), d("2020-02-01"));
    }

    #[rstest]
    #[case("2024-01-10", "2024-01-31")]
    #[case("2024-02-01", "2024-02-29")]
    #[case("2023-02-14", "2023-02-28")]
    #[case("1900-02-03", "1900-02-28")]
    #[case("2000-02-03", "2000-02-29")]
    #[case("2024-04-30", "2024-04-30")]
    #[case("2024-06-01", "2024-06-30")]
    #[case("2024-12-31", "2024-12-31")]
    fn last_day_of_month_cases(#[case] day: &str, #[case] expected: &str) {
        assert_eq!(last_day_of_month(d(day)), d(expected));
    }

    #[test]
    fn last_day_of_month_at_the_end_of_time() {
        assert_eq!(last_day_of_month(NaiveDate::MAX), NaiveDate::MAX);
    }

    #[rstest]
    #[case("2024-01-10", "2024-03-31")]
    #[case("2024-03-31", "2024-03-31")]
    #[case("2024-04-01", "2024-06-30")]
    #[case("2024-08-15", "2024-09-30")]
    #[case("2024-10-01", "2024-12-31")]
    fn last_day_of_quarter_cases(#[case] day: &str, #[case] expected: &str) {
        assert_eq!(last_day_of_quarter(d(day)), d(expected));
    }

    #[test]
    fn last_day_of_year_is_december_31() {
        assert_eq!(last_day_of_year(d("2023-02-28")), d("2023-12-31"));
    }
}
