//! Source of "today" for the available-today filter.

use chrono::NaiveDate;
use parking_lot::Mutex;

/// Supplies the current calendar day
///
/// Sampled each time results are read, so a long-lived session rolls over
/// to the next day without a criteria change.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar day of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A settable clock for tests and reproducible command-line runs
#[derive(Debug)]
pub struct FixedClock {
    day: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day: Mutex::new(day),
        }
    }

    pub fn set(&self, day: NaiveDate) {
        *self.day.lock() = day;
    }

    /// Move forward by `days`; saturates at the end of the calendar
    pub fn advance(&self, days: u64) {
        let mut day = self.day.lock();
        *day = day.checked_add_days(chrono::Days::new(days)).unwrap_or(NaiveDate::MAX);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.day.lock()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}
