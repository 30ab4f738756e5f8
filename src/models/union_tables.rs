//! Union reference tables: working-day calendars and daily benefit values.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProcessingMonth;
use crate::error::{EngineError, EngineResult};

/// The working days of one union in the processing month.
///
/// Holidays are already excluded; every date in `days` is payable.
///
/// # Example
///
/// ```
/// use vr_engine::models::{ProcessingMonth, UnionCalendar};
/// use chrono::NaiveDate;
///
/// let month = ProcessingMonth::new(2025, 5).unwrap();
/// let mut calendar = UnionCalendar::new("SINDPD SP", month);
/// calendar.insert(NaiveDate::from_ymd_opt(2025, 5, 2).unwrap());
/// calendar.insert(NaiveDate::from_ymd_opt(2025, 5, 5).unwrap());
///
/// let from = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();
/// let to = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
/// assert_eq!(calendar.count_between(from, to), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionCalendar {
    /// Canonical union code.
    pub union_code: String,
    /// The month the calendar covers.
    pub month: ProcessingMonth,
    /// Working dates, ascending.
    pub days: BTreeSet<NaiveDate>,
}

impl UnionCalendar {
    /// Creates an empty calendar.
    pub fn new(union_code: impl Into<String>, month: ProcessingMonth) -> Self {
        Self {
            union_code: union_code.into(),
            month,
            days: BTreeSet::new(),
        }
    }

    /// Adds a working day. Dates outside the month are ignored; returns whether it was kept.
    pub fn insert(&mut self, date: NaiveDate) -> bool {
        if self.month.contains(date) {
            self.days.insert(date);
            true
        } else {
            false
        }
    }

    /// Returns the number of working days in the month.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Returns true when the calendar has no working day.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Returns the working days between `from` and `to` (inclusive).
    pub fn days_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Iterator<Item = NaiveDate> + '_ {
        let range = if from <= to {
            Some(self.days.range(from..=to))
        } else {
            None
        };
        range.into_iter().flatten().copied()
    }

    /// Counts the working days between `from` and `to` (inclusive).
    pub fn count_between(&self, from: NaiveDate, to: NaiveDate) -> u32 {
        self.days_between(from, to).count() as u32
    }
}

/// Working-day calendars of every union for the processing month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionCalendars {
    month: ProcessingMonth,
    calendars: BTreeMap<String, UnionCalendar>,
}

impl UnionCalendars {
    /// Creates an empty set of calendars for `month`.
    pub fn new(month: ProcessingMonth) -> Self {
        Self {
            month,
            calendars: BTreeMap::new(),
        }
    }

    /// Returns the processing month.
    pub fn month(&self) -> ProcessingMonth {
        self.month
    }

    /// Records a working day for a union. Returns false if the date is outside the month.
    pub fn add_day(&mut self, union_code: &str, date: NaiveDate) -> bool {
        let month = self.month;
        self.calendars
            .entry(union_code.to_string())
            .or_insert_with(|| UnionCalendar::new(union_code, month))
            .insert(date)
    }

    /// Looks up the calendar of a union.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CalendarGapError`] if the union has no working
    /// day in the month.
    pub fn get(&self, union_code: &str) -> EngineResult<&UnionCalendar> {
        self.calendars
            .get(union_code)
            .filter(|calendar| !calendar.is_empty())
            .ok_or_else(|| EngineError::CalendarGapError {
                union: union_code.to_string(),
                month: self.month.to_string(),
            })
    }

    /// Iterates the calendars by union code.
    pub fn iter(&self) -> impl Iterator<Item = &UnionCalendar> {
        self.calendars.values()
    }

    /// Returns the number of unions with a calendar.
    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    /// Returns true when no union has a calendar.
    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }
}

/// Daily benefit value per union.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnionValues(BTreeMap<String, Decimal>);

impl UnionValues {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a value, returning the previous one for the union if any.
    pub fn insert(&mut self, union_code: impl Into<String>, daily_value: Decimal) -> Option<Decimal> {
        self.0.insert(union_code.into(), daily_value)
    }

    /// Looks up the daily value of a union.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingUnionValueError`] if the union has no value.
    pub fn get(&self, union_code: &str) -> EngineResult<Decimal> {
        self.0
            .get(union_code)
            .copied()
            .ok_or_else(|| EngineError::MissingUnionValueError {
                union: union_code.to_string(),
            })
    }

    /// Returns the number of unions with a value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the table is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
