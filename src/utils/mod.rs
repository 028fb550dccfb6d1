//! Utility modules

pub mod counter;
pub mod db;
pub mod format;
pub mod fs;
pub mod hash;
pub mod json;
pub mod logging;
pub mod paths;
pub mod time;
