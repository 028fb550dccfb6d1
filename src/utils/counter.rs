//! Thread-safe named counters with a boxed progress report

use crate::utils::format::{sec2str_hms, thousands};
use crate::utils::logging::printc;
use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct State {
    values: BTreeMap<String, i64>,
    started: Instant,
    last_report: Option<Instant>,
}

/// Named integer counters shared between threads by reference.
///
/// ```
/// use stool::Counter;
///
/// let counter = Counter::new();
/// counter.inc("pages", 1);
/// counter.inc("pages", 2);
/// assert_eq!(counter.get("pages"), 3);
/// ```
#[derive(Debug)]
pub struct Counter {
    state: Mutex<State>,
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                values: BTreeMap::new(),
                started: Instant::now(),
                last_report: None,
            }),
        }
    }

    /// Current value of `key`, 0 when absent
    pub fn get(&self, key: &str) -> i64 {
        self.state.lock().values.get(key).copied().unwrap_or(0)
    }

    pub fn set(&self, key: &str, value: i64) -> i64 {
        self.state.lock().values.insert(key.to_string(), value);
        value
    }

    /// Add `by` to `key` and return the new value
    pub fn inc(&self, key: &str, by: i64) -> i64 {
        let mut state = self.state.lock();
        let value = state.values.entry(key.to_string()).or_insert(0);
        *value += by;
        *value
    }

    #[deprecated(note = "use inc() instead")]
    pub fn incr(&self, key: &str, by: i64) -> i64 {
        self.inc(key, by)
    }

    #[deprecated(note = "use inc() instead")]
    pub fn increment(&self, key: &str, by: i64) -> i64 {
        self.inc(key, by)
    }

    /// Drop all keys and restart the elapsed-time clock
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.values.clear();
        state.started = Instant::now();
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.lock().values.len()
    }

    /// Snapshot of all counters, sorted by key
    pub fn snapshot(&self) -> BTreeMap<String, i64> {
        self.state.lock().values.clone()
    }

    /// Boxed report of every counter; empty string when there are none.
    pub fn to_str(&self, width: usize, title: &str) -> String {
        let (values, elapsed) = {
            let state = self.state.lock();
            (state.values.clone(), state.started.elapsed())
        };
        render(&values, width, title, Local::now().naive_local(), elapsed)
    }

    /// Print the report when more than `interval` elapsed since the last one,
    /// or when `key` is present and its value is a multiple of `modulus`.
    /// Returns whether anything was printed.
    pub fn log_progress(&self, key: Option<&str>, modulus: i64, interval: Duration) -> bool {
        let due = {
            let state = self.state.lock();
            if state.values.is_empty() {
                return false;
            }
            let modulus = modulus.max(1);
            let overdue = state.last_report.map_or(true, |t| t.elapsed() > interval);
            let on_step = key
                .and_then(|k| state.values.get(k))
                .is_some_and(|v| v % modulus == 0);
            overdue || on_step
        };

        if due {
            printc([self.to_string()]);
            self.state.lock().last_report = Some(Instant::now());
        }
        due
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str(60, "Counter"))
    }
}

fn render(
    values: &BTreeMap<String, i64>,
    width: usize,
    title: &str,
    now: NaiveDateTime,
    elapsed: Duration,
) -> String {
    if values.is_empty() {
        return String::new();
    }

    let rows: Vec<(String, String)> = values
        .iter()
        .map(|(k, v)| (format!("{} ", k), format!(" {}", thousands(*v))))
        .collect();

    let max_k = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let max_v = rows.iter().map(|(_, v)| v.chars().count()).max().unwrap_or(0);
    let width = width.max(23).max(max_k + max_v + 6);
    let kw = width - max_v - 4;
    let inner = width - 4;

    let body = rows
        .iter()
        .map(|(k, v)| format!("+ {:.<kw$}{:.>vw$} +", k, v, kw = kw, vw = max_v))
        .collect::<Vec<_>>()
        .join("\n");

    let title = if title.is_empty() {
        String::new()
    } else {
        format!("{} ", title)
    };
    let stamp = format!("{}{}", title, now.format("%Y-%m-%d %H:%M:%S"));
    let escaped = format!("Escaped: {}", sec2str_hms(elapsed.as_secs()));

    format!(
        "\n+ {:-^w$} +\n{}\n+ {:-^w$} +\n",
        stamp,
        body,
        escaped,
        w = inner
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 16).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn get_defaults_to_zero() {
        let counter = Counter::new();
        assert_eq!(counter.get("missing"), 0);
        assert!(counter.is_empty());
    }

    #[test]
    fn set_inc_and_reset() {
        let counter = Counter::new();
        assert_eq!(counter.set("a", 10), 10);
        assert_eq!(counter.inc("a", 5), 15);
        assert_eq!(counter.inc("b", 1), 1);
        assert_eq!(counter.len(), 2);
        counter.reset();
        assert!(counter.is_empty());
    }

    #[test]
    #[allow(deprecated)]
    fn deprecated_aliases_still_count() {
        let counter = Counter::new();
        counter.incr("x", 1);
        counter.increment("x", 2);
        assert_eq!(counter.get("x"), 3);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let counter = Arc::new(Counter::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let counter = Arc::clone(&counter);
                std::thread::Builder::new()
                    .name(format!("worker-{}", i))
                    .spawn(move || {
                        for _ in 0..1000 {
                            counter.inc("total", 1);
                        }
                    })
                    .unwrap()
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.get("total"), 8000);
    }

    #[test]
    fn empty_counter_renders_nothing() {
        assert_eq!(Counter::new().to_str(40, "x"), "");
    }

    #[test]
    fn report_layout() {
        let mut values = BTreeMap::new();
        values.insert("pages".to_string(), 1234);
        values.insert("errors".to_string(), 3);
        let report = render(&values, 40, "Crawl", noon(), Duration::from_secs(3725));

        let expected = [
            "",
            "+ -----Crawl 2024-03-16 12:00:00------ +",
            "+ errors ........................... 3 +",
            "+ pages ........................ 1,234 +",
            "+ ---------Escaped: 1h 2m 5s---------- +",
        ]
        .join("\n")
            + "\n";
        assert_eq!(report, expected);
        for line in report.lines().skip(1) {
            assert_eq!(line.chars().count(), 40);
        }
    }

    #[test]
    fn report_widens_for_long_keys() {
        let mut values = BTreeMap::new();
        values.insert("a-rather-long-counter-name".to_string(), 1);
        let report = render(&values, 10, "", noon(), Duration::ZERO);
        let widest = report.lines().map(|l| l.chars().count()).max().unwrap();
        assert_eq!(widest, "a-rather-long-counter-name ".len() + " 1".len() + 6);
    }

    #[test]
    fn progress_only_reports_when_due() {
        let counter = Counter::new();
        assert!(!counter.log_progress(Some("x"), 1, Duration::from_secs(300)));

        counter.inc("x", 1);
        // First report is always due
        assert!(counter.log_progress(None, 1, Duration::from_secs(300)));
        // Not overdue, and 3 is not a multiple of 2
        counter.inc("x", 2);
        assert!(!counter.log_progress(Some("x"), 2, Duration::from_secs(300)));
        counter.inc("x", 1);
        assert!(counter.log_progress(Some("x"), 2, Duration::from_secs(300)));
        // Missing keys never match the modulus
        assert!(!counter.log_progress(Some("nope"), 1, Duration::from_secs(300)));
    }
}
