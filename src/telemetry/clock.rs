//! Source of the local calendar date used to pick the day's log file

use chrono::{Local, NaiveDate};
use std::sync::{PoisonError, RwLock};

/// Trait for anything that can tell which calendar day it is
pub trait Clock: Send + Sync {
    /// Today's local calendar date
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the host's local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a date until told otherwise
///
/// Used to replay a given day or to step over midnight deterministically.
#[derive(Debug)]
pub struct ManualClock {
    date: RwLock<NaiveDate>,
}

impl ManualClock {
    pub fn new(date: NaiveDate) -> Self {
        Self { date: RwLock::new(date) }
    }

    /// Move the clock to `date`
    pub fn set(&self, date: NaiveDate) {
        *self.date.write().unwrap_or_else(PoisonError::into_inner) = date;
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.date.read().unwrap_or_else(PoisonError::into_inner)
    }
}
