//! stool - developer utilities
//!
//! The core is [`ranges`]: cutting a date span into calendar or fixed-length
//! segments. Around it sit small helpers for logging, counting, formatting,
//! JSON and files, push notifications and a SQLite-backed status recorder.

pub mod error;
pub mod notify;
pub mod ranges;
pub mod status;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
pub use ranges::{
    generate_time_ranges, partition_dates, split_into_months, IntervalSpec, Segment, Segments,
};
pub use utils::counter::Counter;
