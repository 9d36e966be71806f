//! # Telemetry Module
//!
//! Persists solar monitor readings to date-partitioned text logs.
//!
//! This module handles:
//! - Parsing the lenient JSON payload pushed by the ESP32 ([`Reading`])
//! - Formatting a reading as one log line ([`format_entry`])
//! - Appending to the current day's file, header included once ([`DailyLogStore`])
//! - Summarizing a day's file ([`StatusReader`])
//! - Listing every daily file on disk ([`FileCatalog`])
//!
//! All of them work off the same directory and agree on file naming through
//! [`daily_log_name`] and [`is_daily_log_name`].

pub mod catalog;
pub mod clock;
pub mod formatter;
pub mod reading;
pub mod status;
pub mod store;

pub use catalog::{FileCatalog, LogFileInfo};
pub use clock::{Clock, ManualClock, SystemClock};
pub use formatter::format_entry;
pub use reading::Reading;
pub use status::{DayStatus, StatusReader};
pub use store::{AppendReceipt, DailyLogStore};

use chrono::NaiveDate;

/// Prefix shared by every daily log file name
pub const LOG_FILE_PREFIX: &str = "solar_log_";

/// Extension shared by every daily log file name
pub const LOG_FILE_SUFFIX: &str = ".txt";

/// Calendar date format used in file names, headers and status
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// File name of the log for `date`, e.g. `solar_log_2024-06-01.txt`
pub fn daily_log_name(date: NaiveDate) -> String {
    format!("{}{}{}", LOG_FILE_PREFIX, date.format(DATE_FORMAT), LOG_FILE_SUFFIX)
}

/// Whether `name` belongs to the set of daily log files
pub fn is_daily_log_name(name: &str) -> bool {
    name.starts_with(LOG_FILE_PREFIX) && name.ends_with(LOG_FILE_SUFFIX)
}
