//! # Daily Log Store
//!
//! Appends formatted readings to `solar_log_<YYYY-MM-DD>.txt` under a fixed root.
//!
//! The first write of a file is preceded by a three line header:
//!
//! ```text
//! === Solar Power Monitor Log - 2024-06-01 ===
//! Time     | Device              | WiFi RSSI | Free Heap    | Uptime
//! --------------------------------------------------------------------------------
//! ```
//!
//! Whether a file is new is decided by checking its existence right before it is
//! opened. The check, the header and the entry all happen while the store's
//! writer lock is held, so two requests racing on the first reading of a day
//! cannot both write a header.

use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

use super::clock::Clock;
use super::formatter::format_entry;
use super::reading::Reading;
use super::{daily_log_name, DATE_FORMAT};
use crate::error::Result;

/// Column label line of the header
pub const COLUMN_LABELS: &str =
    "Time     | Device              | WiFi RSSI | Free Heap    | Uptime";

/// Width of the rule line closing the header
pub const RULE_WIDTH: usize = 80;

/// Result of a successful append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReceipt {
    /// Basename of the file written, e.g. `solar_log_2024-06-01.txt`
    pub filename: String,
    /// Line written, without the newline
    pub entry: String,
    /// Whether this append created the file and wrote its header
    pub created: bool,
}

/// File the store is currently appending to
#[derive(Debug)]
struct DayHandle {
    date: NaiveDate,
    filename: String,
    path: PathBuf,
}

impl DayHandle {
    fn new(root: &Path, date: NaiveDate) -> Self {
        let filename = daily_log_name(date);
        let path = root.join(&filename);
        Self { date, filename, path }
    }
}

/// Append-only writer for the daily log files
///
/// Built once at start-up and shared behind an `Arc`; every append goes
/// through one mutex and opens the file only for the duration of the call.
pub struct DailyLogStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
    day: Mutex<DayHandle>,
}

impl std::fmt::Debug for DailyLogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyLogStore")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl DailyLogStore {
    /// Open the store, creating `root` if it does not exist yet
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use solar_log::telemetry::{DailyLogStore, Reading, SystemClock};
    ///
    /// let store = DailyLogStore::open("solar_logs", Arc::new(SystemClock))?;
    /// let receipt = store.append(&Reading::default())?;
    /// println!("wrote {}", receipt.filename);
    /// # Ok::<(), solar_log::error::SolarLogError>(())
    /// ```
    pub fn open(root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        info!("Daily logs stored in {}", root.display());

        let day = DayHandle::new(&root, clock.today());
        Ok(Self {
            root,
            clock,
            day: Mutex::new(day),
        })
    }

    /// Format `reading` and append it to today's file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be checked, opened or written. Nothing
    /// is retried.
    pub fn append(&self, reading: &Reading) -> Result<AppendReceipt> {
        let entry = format_entry(reading);

        // The lock only guards the day handle, which stays valid on panic
        let mut day = self.day.lock().unwrap_or_else(PoisonError::into_inner);

        let today = self.clock.today();
        if day.date != today {
            debug!("Switching daily log from {} to {}", day.date, today);
            *day = DayHandle::new(&self.root, today);
        }

        let created = !day.path.try_exists()?;

        let mut block = String::new();
        if created {
            block.push_str(&header_block(today));
        }
        block.push_str(&entry);
        block.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&day.path)?;
        file.write_all(block.as_bytes())?;
        file.flush()?;

        if created {
            info!("Started new daily log {}", day.filename);
        }

        Ok(AppendReceipt {
            filename: day.filename.clone(),
            entry,
            created,
        })
    }
}

/// Title, column labels and rule for a new file, newline-terminated
pub fn header_block(date: NaiveDate) -> String {
    format!(
        "=== Solar Power Monitor Log - {} ===\n{}\n{}\n",
        date.format(DATE_FORMAT),
        COLUMN_LABELS,
        "-".repeat(RULE_WIDTH)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::ManualClock;
    use serde_json::json;
    use tempfile::tempdir;

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn reading(device: &str) -> Reading {
        Reading {
            device_id: Some(json!(device)),
            wifi_rssi: Some(json!(-61)),
            free_heap: Some(json!(45210)),
            uptime_ms: Some(json!(123456)),
            timestamp: None,
        }
    }

    fn header_count(contents: &str) -> usize {
        contents.lines().filter(|l| l.starts_with("=== ")).count()
    }

    /// Fixed date; notes which writer thread asked for it, in call order
    struct RecordingClock {
        date: NaiveDate,
        calls: Mutex<Vec<String>>,
    }

    impl Clock for RecordingClock {
        fn today(&self) -> NaiveDate {
            if let Some(name) = std::thread::current().name() {
                if name.starts_with("esp32-") {
                    self.calls.lock().unwrap().push(name.to_string());
                }
            }
            self.date
        }
    }

    #[test]
    fn test_header_block_layout() {
        let header = header_block(june(1));
        let lines: Vec<&str> = header.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "=== Solar Power Monitor Log - 2024-06-01 ===");
        assert_eq!(lines[1], COLUMN_LABELS);
        assert_eq!(lines[2], "-".repeat(80));
        assert!(header.ends_with('\n'));
    }

    #[test]
    fn test_open_creates_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("solar_logs");

        let store = DailyLogStore::open(&root, Arc::new(ManualClock::new(june(1)))).unwrap();
        assert!(root.is_dir());
        assert!(store.append(&reading("a")).is_ok());

        // Opening again over an existing directory is fine
        assert!(DailyLogStore::open(&root, Arc::new(ManualClock::new(june(1)))).is_ok());
    }

    #[test]
    fn test_first_append_writes_header() {
        let dir = tempdir().unwrap();
        let store = DailyLogStore::open(dir.path(), Arc::new(ManualClock::new(june(1)))).unwrap();

        let receipt = store.append(&reading("esp32-a")).unwrap();
        assert_eq!(receipt.filename, "solar_log_2024-06-01.txt");
        assert!(receipt.created);

        let contents = fs::read_to_string(dir.path().join(&receipt.filename)).unwrap();
        assert_eq!(
            contents,
            format!("{}{}\n", header_block(june(1)), receipt.entry)
        );
    }

    #[test]
    fn test_later_appends_skip_header() {
        let dir = tempdir().unwrap();
        let store = DailyLogStore::open(dir.path(), Arc::new(ManualClock::new(june(1)))).unwrap();

        store.append(&reading("a")).unwrap();
        let second = store.append(&reading("b")).unwrap();
        let third = store.append(&reading("c")).unwrap();
        assert!(!second.created);
        assert!(!third.created);

        let contents = fs::read_to_string(dir.path().join("solar_log_2024-06-01.txt")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(header_count(&contents), 1);
        assert!(lines[3].contains("Device: a"));
        assert!(lines[4].contains("Device: b"));
        assert!(lines[5].contains("Device: c"));
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn test_existing_file_gets_no_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("solar_log_2024-06-01.txt");
        fs::write(&path, "").unwrap();

        let store = DailyLogStore::open(dir.path(), Arc::new(ManualClock::new(june(1)))).unwrap();
        let receipt = store.append(&reading("a")).unwrap();
        assert!(!receipt.created);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, format!("{}\n", receipt.entry));
    }

    #[test]
    fn test_existing_content_is_never_rewritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("solar_log_2024-06-01.txt");
        fs::write(&path, "legacy line\n").unwrap();

        let store = DailyLogStore::open(dir.path(), Arc::new(ManualClock::new(june(1)))).unwrap();
        store.append(&reading("a")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("legacy line\n"));
        assert_eq!(header_count(&contents), 0);
    }

    #[test]
    fn test_day_rollover_starts_new_file() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(june(1)));
        let store = DailyLogStore::open(dir.path(), clock.clone()).unwrap();

        store.append(&reading("a")).unwrap();
        clock.set(june(2));
        let receipt = store.append(&reading("b")).unwrap();

        assert_eq!(receipt.filename, "solar_log_2024-06-02.txt");
        assert!(receipt.created);

        let first = fs::read_to_string(dir.path().join("solar_log_2024-06-01.txt")).unwrap();
        let second = fs::read_to_string(dir.path().join("solar_log_2024-06-02.txt")).unwrap();
        assert_eq!(first.lines().count(), 4);
        assert_eq!(second.lines().count(), 4);
        assert!(second.starts_with("=== Solar Power Monitor Log - 2024-06-02 ===\n"));
    }

    #[test]
    fn test_file_removed_mid_day_gets_new_header() {
        let dir = tempdir().unwrap();
        let store = DailyLogStore::open(dir.path(), Arc::new(ManualClock::new(june(1)))).unwrap();
        let path = dir.path().join("solar_log_2024-06-01.txt");

        store.append(&reading("a")).unwrap();
        fs::remove_file(&path).unwrap();
        let receipt = store.append(&reading("b")).unwrap();

        assert!(receipt.created);
        assert_eq!(header_count(&fs::read_to_string(&path).unwrap()), 1);
    }

    #[test]
    fn test_concurrent_appends_single_header() {
        let dir = tempdir().unwrap();
        let store = Arc::new(
            DailyLogStore::open(dir.path(), Arc::new(ManualClock::new(june(1)))).unwrap(),
        );

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.append(&reading(&format!("esp32-{}", i))).unwrap())
            })
            .collect();
        let receipts: Vec<AppendReceipt> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(receipts.iter().filter(|r| r.created).count(), 1);

        let contents = fs::read_to_string(dir.path().join("solar_log_2024-06-01.txt")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(header_count(&contents), 1);
        assert_eq!(lines.len(), 23);
        assert!(lines[0].starts_with("=== "));
        assert!(lines[3..].iter().all(|l| l.contains("| Device: esp32-")));
        for i in 0..20 {
            let device = format!("| Device: esp32-{} |", i);
            assert_eq!(lines.iter().filter(|l| l.contains(&device)).count(), 1);
        }
    }

    #[test]
    fn test_concurrent_appends_land_in_lock_order() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(RecordingClock {
            date: june(1),
            calls: Mutex::new(Vec::new()),
        });
        let store = Arc::new(DailyLogStore::open(dir.path(), clock.clone()).unwrap());

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::Builder::new()
                    .name(format!("esp32-{}", i))
                    .spawn(move || {
                        let name = std::thread::current().name().unwrap().to_string();
                        store.append(&reading(&name)).unwrap()
                    })
                    .unwrap()
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // The clock is read once per append while the writer lock is held
        let lock_order = clock.calls.lock().unwrap().clone();
        assert_eq!(lock_order.len(), 20);

        let contents = fs::read_to_string(dir.path().join("solar_log_2024-06-01.txt")).unwrap();
        let file_order: Vec<String> = contents
            .lines()
            .skip(3)
            .map(|line| {
                let device = line.split(" | ").nth(1).unwrap();
                device.trim_start_matches("Device: ").to_string()
            })
            .collect();
        assert_eq!(file_order, lock_order);
    }

    #[test]
    fn test_append_fails_when_root_is_gone() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("solar_logs");
        let store = DailyLogStore::open(&root, Arc::new(ManualClock::new(june(1)))).unwrap();

        fs::remove_dir_all(&root).unwrap();
        assert!(matches!(
            store.append(&reading("a")),
            Err(crate::error::SolarLogError::Io(_))
        ));
    }
}
