//! Calendar-day normalization.
//!
//! Availability is recorded per calendar day. Any date-like value used in a
//! query is reduced to the day it falls on, so two instants on the same date
//! compare equal regardless of time-of-day.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

/// A value that falls on a single calendar day
pub trait CalendarDay {
    fn calendar_day(&self) -> NaiveDate;
}

impl CalendarDay for NaiveDate {
    fn calendar_day(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDay for NaiveDateTime {
    fn calendar_day(&self) -> NaiveDate {
        self.date()
    }
}

/// Uses the date in the value's own offset, never converting to UTC.
impl<Tz: TimeZone> CalendarDay for DateTime<Tz> {
    fn calendar_day(&self) -> NaiveDate {
        self.date_naive()
    }
}

impl<T: CalendarDay + ?Sized> CalendarDay for &T {
    fn calendar_day(&self) -> NaiveDate {
        (**self).calendar_day()
    }
}

/// Inclusive day-granular range membership
pub fn is_day_in_range(start: NaiveDate, end: NaiveDate, day: NaiveDate) -> bool {
    start <= day && day <= end
}
