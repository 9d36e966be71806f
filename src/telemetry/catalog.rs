//! Listing of the daily log files present on disk

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use super::is_daily_log_name;
use crate::error::Result;

/// Format of [`LogFileInfo::modified`]
pub const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One daily log file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogFileInfo {
    pub filename: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification, local time
    pub modified: String,
}

/// Enumerates `solar_log_*.txt` in the log directory
#[derive(Debug, Clone)]
pub struct FileCatalog {
    root: PathBuf,
}

impl FileCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// List daily log files in directory iteration order
    ///
    /// The order is whatever the file system returns; sort the result if a
    /// particular order is needed. Anything not named `solar_log_*.txt`, such
    /// as the background-mode `server.log`, is left out.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or a matching file's metadata cannot be read
    pub fn list_files(&self) -> Result<Vec<LogFileInfo>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            if !is_daily_log_name(&filename) {
                continue;
            }

            let metadata = fs::metadata(entry.path())?;
            if !metadata.is_file() {
                continue;
            }

            let modified: DateTime<Local> = metadata.modified()?.into();
            files.push(LogFileInfo {
                filename,
                size: metadata.len(),
                modified: modified.format(MODIFIED_FORMAT).to_string(),
            });
        }

        Ok(files)
    }
}
