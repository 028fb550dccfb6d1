//! Colored console logging
//!
//! Messages are tinted per thread so interleaved output from worker threads
//! stays readable. Threads are told apart by the number at the end of their
//! name (`worker-3`, `pool-7`); unnumbered threads print in white.

use colored::{Color, Colorize};
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::io::Write;

const THREAD_COLORS: [Color; 6] = [
    Color::Blue,
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Red,
    Color::Magenta,
];

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("static regex"));

/// Number parsed from the digits in the last `-`-separated part of a thread
/// name.
pub fn thread_number_of(name: &str) -> Option<u32> {
    let tail = name.rsplit('-').next().unwrap_or(name);
    let digits: String = DIGITS.find_iter(tail).map(|m| m.as_str()).collect();
    digits.parse().ok()
}

/// Number of the current thread, if its name carries one
pub fn thread_number() -> Option<u32> {
    std::thread::current().name().and_then(thread_number_of)
}

/// Color assigned to the current thread
pub fn thread_color() -> Color {
    color_for(thread_number())
}

fn color_for(number: Option<u32>) -> Color {
    match number {
        Some(n) => THREAD_COLORS[n as usize % THREAD_COLORS.len()],
        None => Color::White,
    }
}

/// Print each message on its own line in the current thread's color
pub fn printc<I, S>(messages: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let color = thread_color();
    for message in messages {
        println!("{}", message.as_ref().color(color));
    }
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Cyan,
        Level::Trace => Color::White,
    }
}

/// Install the colored logger.
///
/// `RUST_LOG` takes precedence over `level`. Calling this more than once
/// keeps the first logger.
pub fn init_logger(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_default_env().format(|buf, record| {
        let prefix = format!(
            "{} {} - [{}] -",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            record.level(),
            record.target()
        );
        writeln!(
            buf,
            "{} {}",
            prefix.color(level_color(record.level())),
            record.args().to_string().color(thread_color())
        )
    });

    if builder.try_init().is_err() {
        log::debug!("logger already installed");
    }
}
