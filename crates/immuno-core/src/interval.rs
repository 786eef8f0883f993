//! Calendar-aware interval arithmetic.
//!
//! Month and year steps keep the day of month where the target month has it
//! and clamp to the month's last day otherwise (Jan 31 + 1 month = Feb 28).

use chrono::{Days, Months, NaiveDate};

use crate::catalog::{DoseInterval, IntervalRule, TimeUnit};

/// `date + interval` in `unit`. Returns `None` if the result falls outside
/// the representable date range.
pub fn add_interval(
  date: NaiveDate,
  interval: u32,
  unit: TimeUnit,
) -> Option<NaiveDate> {
  match unit {
    TimeUnit::Day => date.checked_add_days(Days::new(u64::from(interval))),
    TimeUnit::Week => {
      date.checked_add_days(Days::new(u64::from(interval) * 7))
    }
    TimeUnit::Month => date.checked_add_months(Months::new(interval)),
    TimeUnit::Year => {
      date.checked_add_months(Months::new(interval.checked_mul(12)?))
    }
  }
}

impl IntervalRule {
  pub fn after(&self, date: NaiveDate) -> Option<NaiveDate> {
    add_interval(date, self.interval, self.time_unit)
  }
}

impl DoseInterval {
  pub fn after(&self, date: NaiveDate) -> Option<NaiveDate> {
    add_interval(date, self.interval, self.time_unit)
  }
}
