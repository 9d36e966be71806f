//! # Status Reader
//!
//! Summarizes a day's log by reading the file back. There is no index: the
//! entry count comes from classifying each line of the file.

use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use super::clock::Clock;
use super::{daily_log_name, DATE_FORMAT};
use crate::error::Result;

/// Number of raw lines returned in `last_entries`
pub const TAIL_LINES: usize = 5;

/// Line prefixes that mark header lines rather than readings
const HEADER_MARKERS: &[&str] = &["=", "-", "Time"];

/// Summary of one day's log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayStatus {
    /// Local calendar date, `YYYY-MM-DD`
    pub date: String,

    /// Basename of the day's file, only when it exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    pub exists: bool,

    /// Number of data lines (header lines excluded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_entries: Option<usize>,

    /// Last [`TAIL_LINES`] non-empty lines of the file as written.
    /// Header lines are kept when they fall inside that window, so this is a
    /// raw tail and not a tail of `total_entries`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_entries: Option<Vec<String>>,
}

impl DayStatus {
    fn missing(date: NaiveDate) -> Self {
        Self {
            date: date.format(DATE_FORMAT).to_string(),
            filename: None,
            exists: false,
            total_entries: None,
            last_entries: None,
        }
    }
}

/// Read-only view over the daily log directory
#[derive(Clone)]
pub struct StatusReader {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for StatusReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReader")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl StatusReader {
    pub fn new(root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: root.into(),
            clock,
        }
    }

    /// Status of today's log
    pub fn status(&self) -> Result<DayStatus> {
        self.status_for(self.clock.today())
    }

    /// Status of the log for `date`
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read
    pub fn status_for(&self, date: NaiveDate) -> Result<DayStatus> {
        let filename = daily_log_name(date);
        let contents = match fs::read_to_string(self.root.join(&filename)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DayStatus::missing(date)),
            Err(e) => return Err(e.into()),
        };

        let lines: Vec<&str> = contents.lines().filter(|l| !l.trim().is_empty()).collect();
        let total_entries = lines.iter().filter(|l| is_data_line(l)).count();
        let last_entries = lines[lines.len().saturating_sub(TAIL_LINES)..]
            .iter()
            .map(|l| l.trim().to_string())
            .collect();

        Ok(DayStatus {
            date: date.format(DATE_FORMAT).to_string(),
            filename: Some(filename),
            exists: true,
            total_entries: Some(total_entries),
            last_entries: Some(last_entries),
        })
    }
}

/// Whether `line` holds a reading rather than part of the header
pub fn is_data_line(line: &str) -> bool {
    !line.trim().is_empty() && !HEADER_MARKERS.iter().any(|marker| line.starts_with(marker))
}
