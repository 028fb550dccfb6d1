//! Output formatting utilities

use crate::ranges::Segment;
use chrono::NaiveDateTime;
use colored::Colorize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

/// Convert seconds into `HH:MM:SS`
pub fn sec2str(seconds: u64) -> String {
    let (h, m, s) = split_hms(seconds);
    format!("{:02}:{:02}:{:02}", h, m, s)
}

/// Convert seconds into `Hh Mm Ss`
pub fn sec2str_hms(seconds: u64) -> String {
    let (h, m, s) = split_hms(seconds);
    format!("{}h {}m {}s", h, m, s)
}

fn split_hms(seconds: u64) -> (u64, u64, u64) {
    (seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

/// Format an integer with comma thousands separators
pub fn thousands(num: i64) -> String {
    let grouped = thousands_u64(num.unsigned_abs());
    if num < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Comma-grouped unsigned integer
pub fn thousands_u64(num: u64) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Program basename followed by its arguments
pub fn command_line(args: &[String]) -> String {
    let program = args
        .first()
        .map(|p| {
            std::path::Path::new(p)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| p.clone())
        })
        .unwrap_or_default();
    let rest = args.iter().skip(1).cloned().collect::<Vec<_>>().join(" ");
    format!("{} {}", program, rest)
}

/// Header printed at program start: a timestamped rule, the command line,
/// and a closing rule.
pub fn cmd_header(now: NaiveDateTime, args: &[String]) -> String {
    let header = format!("START @ {}", now.format("%Y-%m-%d %H:%M:%S"));
    format!("\n{:-^80}\n {}\n{}", header, command_line(args), "-".repeat(80))
}

/// Print the start header for the running process
pub fn print_cmd() {
    let args: Vec<String> = std::env::args().collect();
    println!("{}", cmd_header(chrono::Local::now().naive_local(), &args));
}

/// Progress marker for `value`: a full line every `step * 100`, `+` every
/// `step * 50`, `:` every `step * 10` and `.` every `step`. A multiple of
/// `step` that does not fit in `u64` never matches.
pub fn progress_marker(value: u64, total: Option<u64>, step: u64, now: NaiveDateTime) -> Option<String> {
    if step == 0 {
        return None;
    }
    let every = |factor: u64| step.checked_mul(factor).is_some_and(|n| value % n == 0);

    let str_total = match total {
        Some(t) if t > 0 => format!("/{}", thousands_u64(t)),
        _ => String::new(),
    };
    let width = str_total.len().max(6);

    if every(100) {
        Some(format!(
            "+ {:>width$}{} @ {}\n",
            thousands_u64(value),
            str_total,
            now.format("%H:%M:%S"),
            width = width
        ))
    } else if every(50) {
        Some("+".to_string())
    } else if every(10) {
        Some(":".to_string())
    } else if value % step == 0 {
        Some(".".to_string())
    } else {
        None
    }
}

/// Print the progress marker for `value`, if any
pub fn print_progress(value: u64, total: Option<u64>, step: u64) {
    use std::io::Write;

    if let Some(marker) = progress_marker(value, total, step, chrono::Local::now().naive_local()) {
        print!("{}", marker);
        let _ = std::io::stdout().flush();
    }
}

/// Table row for display
#[derive(Tabled)]
pub struct SegmentRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Start")]
    pub start: String,
    #[tabled(rename = "End")]
    pub end: String,
    #[tabled(rename = "Days")]
    pub days: i64,
}

/// Table row for a `(start, end)` pair kept as given
#[derive(Tabled)]
pub struct PairRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Start")]
    pub start: String,
    #[tabled(rename = "End")]
    pub end: String,
}

/// Format segments as a table
pub fn format_table(segments: &[Segment]) -> String {
    let rows: Vec<SegmentRow> = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            let (start, end) = segment.to_strings();
            SegmentRow {
                index: i + 1,
                start,
                end,
                days: segment.days(),
            }
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(0)).with(Alignment::right()))
        .to_string()
}

/// Format segments as JSON
pub fn format_json(segments: &[Segment]) -> String {
    serde_json::to_string_pretty(segments).unwrap_or_else(|_| "[]".to_string())
}

/// Format segments as CSV
pub fn format_csv(segments: &[Segment]) -> String {
    let mut output = String::from("start,end,days\n");
    for segment in segments {
        let (start, end) = segment.to_strings();
        output.push_str(&format!("{},{},{}\n", start, end, segment.days()));
    }
    output
}

/// Format raw `(start, end)` pairs as a table
pub fn format_pairs_table(pairs: &[(String, String)]) -> String {
    let rows: Vec<PairRow> = pairs
        .iter()
        .enumerate()
        .map(|(i, (start, end))| PairRow {
            index: i + 1,
            start: start.clone(),
            end: end.clone(),
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(0)).with(Alignment::right()))
        .to_string()
}

/// Format raw pairs as a JSON array of `[start, end]` arrays
pub fn format_pairs_json(pairs: &[(String, String)]) -> String {
    serde_json::to_string_pretty(pairs).unwrap_or_else(|_| "[]".to_string())
}

/// Format raw pairs as CSV
pub fn format_pairs_csv(pairs: &[(String, String)]) -> String {
    let mut output = String::from("start,end\n");
    for (start, end) in pairs {
        output.push_str(&format!("{},{}\n", start, end));
    }
    output
}

/// Print banner
pub fn print_banner() {
    println!();
    println!("{}", "  stool - developer utilities".cyan().bold());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 16).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn seconds_formatting() {
        assert_eq!(sec2str(0), "00:00:00");
        assert_eq!(sec2str(3725), "01:02:05");
        assert_eq!(sec2str(90061), "25:01:01");
        assert_eq!(sec2str_hms(3725), "1h 2m 5s");
        assert_eq!(sec2str_hms(59), "0h 0m 59s");
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
        assert_eq!(thousands(-45000), "-45,000");
        assert_eq!(thousands(i64::MIN), "-9,223,372,036,854,775,808");
        assert_eq!(thousands_u64(u64::MAX), "18,446,744,073,709,551,615");
    }

    #[test]
    fn header_shape() {
        let args = vec!["/usr/bin/stool".to_string(), "ranges".to_string(), "x".to_string()];
        let header = cmd_header(at(0, 51, 24), &args);
        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1].len(), 80);
        assert!(lines[1].contains("START @ 2024-03-16 00:51:24"));
        assert_eq!(lines[2], " stool ranges x");
        assert_eq!(lines[3], "-".repeat(80));
    }

    #[test]
    fn progress_markers() {
        let now = at(12, 0, 0);
        assert_eq!(progress_marker(1000, Some(5000), 10, now), Some("+  1,000/5,000 @ 12:00:00\n".to_string()));
        assert_eq!(progress_marker(2000, None, 10, now), Some("+  2,000 @ 12:00:00\n".to_string()));
        assert_eq!(progress_marker(500, None, 10, now), Some("+".to_string()));
        assert_eq!(progress_marker(100, None, 10, now), Some(":".to_string()));
        assert_eq!(progress_marker(30, None, 10, now), Some(".".to_string()));
        assert_eq!(progress_marker(31, None, 10, now), None);
        assert_eq!(progress_marker(30, None, 0, now), None);
    }

    #[test]
    fn progress_markers_past_i64() {
        let now = at(12, 0, 0);
        let big = u64::MAX - 15;
        assert_eq!(
            progress_marker(big, Some(u64::MAX), 1, now),
            Some("+  18,446,744,073,709,551,600/18,446,744,073,709,551,615 @ 12:00:00\n".to_string())
        );
        // step * 10 does not fit, so only the plain step can match
        assert_eq!(progress_marker(u64::MAX - 1, None, u64::MAX / 2, now), Some(".".to_string()));
        assert_eq!(progress_marker(3, None, u64::MAX / 2, now), None);
    }

    #[test]
    fn raw_pairs_keep_their_text() {
        let pairs = vec![("2024-1-17".to_string(), "2024-1-10".to_string())];
        assert_eq!(format_pairs_csv(&pairs), "start,end\n2024-1-17,2024-1-10\n");
        let parsed: Vec<(String, String)> = serde_json::from_str(&format_pairs_json(&pairs)).unwrap();
        assert_eq!(parsed, pairs);
        assert!(format_pairs_table(&pairs).contains("2024-1-17"));
    }

    #[test]
    fn csv_lists_every_segment() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let segments = vec![
            Segment::new(d("2024-01-10"), d("2024-01-31")),
            Segment::new(d("2024-02-01"), d("2024-02-05")),
        ];
        assert_eq!(
            format_csv(&segments),
            "start,end,days\n2024-01-10,2024-01-31,22\n2024-02-01,2024-02-05,5\n"
        );
        assert!(format_json(&segments).contains("\"2024-02-05\""));
        assert!(format_table(&segments).contains("2024-01-31"));
    }
}
