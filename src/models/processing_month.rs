//! The processing month model.
//!
//! A run covers exactly one calendar month. [`ProcessingMonth`] is the
//! calculation context every working-day computation is bounded by.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar month (year and month number).
///
/// Parses from `MM/YYYY`, `YYYY-MM` or a full `DD/MM/YYYY` date, and displays
/// as `MM/YYYY`.
///
/// # Example
///
/// ```
/// use vr_engine::models::ProcessingMonth;
/// use chrono::NaiveDate;
///
/// let month: ProcessingMonth = "05/2025".parse().unwrap();
/// assert_eq!(month.first_day(), NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
/// assert_eq!(month.last_day(), NaiveDate::from_ymd_opt(2025, 5, 31).unwrap());
/// assert_eq!(month.competence_label(), "01/05/2025");
/// assert_eq!(month.to_string(), "05/2025");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProcessingMonth {
    year: i32,
    month: u32,
}

impl ProcessingMonth {
    /// Creates a processing month, returning `None` for an invalid month number.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Returns the month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Returns the year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Returns the month number (1-12).
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Returns the first day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Returns the last day of the month.
    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// Checks if a date falls within this month.
    ///
    /// # Arguments
    ///
    /// * `date` - The date to check.
    ///
    /// # Returns
    ///
    /// `true` if the date is between the first and last day (inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }

    /// Returns the `Competência` label of the report, `01/MM/YYYY`.
    pub fn competence_label(&self) -> String {
        format!("01/{:02}/{:04}", self.month, self.year)
    }
}

impl fmt::Display for ProcessingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

impl FromStr for ProcessingMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || format!("invalid processing month '{s}', expected MM/YYYY or YYYY-MM");

        let (year, month) = match s.split('/').collect::<Vec<_>>().as_slice() {
            [month, year] => (year.trim(), month.trim()),
            [_day, month, year] => (year.trim(), month.trim()),
            _ => match s.split_once('-') {
                Some((year, month)) => (year.trim(), month.trim()),
                None => return Err(invalid()),
            },
        };

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1900..=9999).contains(&year) {
            return Err(invalid());
        }
        ProcessingMonth::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ProcessingMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProcessingMonth> for String {
    fn from(month: ProcessingMonth) -> Self {
        month.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_slash_form() {
        let month: ProcessingMonth = "05/2025".parse().unwrap();
        assert_eq!((month.year(), month.month()), (2025, 5));
    }

    #[test]
    fn test_parse_iso_form() {
        let month: ProcessingMonth = "2025-05".parse().unwrap();
        assert_eq!((month.year(), month.month()), (2025, 5));
    }

    #[test]
    fn test_parse_full_date_form() {
        let month: ProcessingMonth = "01/05/2025".parse().unwrap();
        assert_eq!((month.year(), month.month()), (2025, 5));
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!("13/2025".parse::<ProcessingMonth>().is_err());
        assert!("may 2025".parse::<ProcessingMonth>().is_err());
        assert!("05/25".parse::<ProcessingMonth>().is_err());
    }

    #[test]
    fn test_last_day_handles_february_and_december() {
        assert_eq!(ProcessingMonth::new(2024, 2).unwrap().last_day(), date(2024, 2, 29));
        assert_eq!(ProcessingMonth::new(2025, 2).unwrap().last_day(), date(2025, 2, 28));
        assert_eq!(ProcessingMonth::new(2025, 12).unwrap().last_day(), date(2025, 12, 31));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let month = ProcessingMonth::new(2025, 5).unwrap();
        assert!(month.contains(date(2025, 5, 1)));
        assert!(month.contains(date(2025, 5, 31)));
        assert!(!month.contains(date(2025, 4, 30)));
        assert!(!month.contains(date(2025, 6, 1)));
    }

    #[test]
    fn test_of_date() {
        assert_eq!(
            ProcessingMonth::of(date(2025, 5, 17)),
            ProcessingMonth::new(2025, 5).unwrap()
        );
    }

    #[test]
    fn test_serde_uses_display_form() {
        let month = ProcessingMonth::new(2025, 5).unwrap();
        assert_eq!(serde_json::to_string(&month).unwrap(), "\"05/2025\"");
        let back: ProcessingMonth = serde_json::from_str("\"2025-05\"").unwrap();
        assert_eq!(back, month);
    }
}
