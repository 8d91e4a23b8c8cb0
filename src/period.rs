//! Calendar periods.
//!
//! Payroll and income are bookkept per calendar month.  A [`MonthYear`]
//! names one such month; it orders chronologically (year first, then
//! month) and can be expanded into inclusive ranges for the month
//! selectors used by the income and backfill flows.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month.  `month` is 1-based (1 = January).
///
/// Field order matters: the derived `Ord` compares `year` before
/// `month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthYear {
    pub year: i32,
    pub month: u32,
}

impl MonthYear {
    pub fn new(month: u32, year: i32) -> Self {
        Self { year, month }
    }

    /// The month containing `date`.  Day-of-month is dropped.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Whether `month` lies in 1..=12.  The core never calls this; the
    /// HTTP boundary does.
    pub fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
    }

    /// The following month, rolling December into January.
    pub fn succ(self) -> Self {
        if self.month >= 12 {
            Self::new(1, self.year + 1)
        } else {
            Self::new(self.month + 1, self.year)
        }
    }

    /// English month name, or `"Unknown"` for an out-of-range month.
    pub fn month_name(&self) -> &'static str {
        self.month
            .checked_sub(1)
            .and_then(|idx| MONTH_NAMES.get(idx as usize))
            .copied()
            .unwrap_or("Unknown")
    }

    /// Every month from `start` to `end`, both inclusive.  Empty when
    /// `start` is after `end`.
    pub fn range_inclusive(start: MonthYear, end: MonthYear) -> Vec<MonthYear> {
        let mut months = Vec::new();
        let mut current = start;
        while current <= end {
            months.push(current);
            current = current.succ();
        }
        months
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

/// Error returned when a `YYYY-MM` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid period `{0}`, expected YYYY-MM")]
pub struct ParsePeriodError(pub String);

impl FromStr for MonthYear {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePeriodError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        let period = MonthYear::new(month, year);
        if !period.is_valid() {
            return Err(err());
        }
        Ok(period)
    }
}
