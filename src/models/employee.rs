//! Employee identity and consolidated employee record.
//!
//! This module defines the [`EmployeeKey`] join key, the resolved
//! [`EmployeeStatus`] and the [`ConsolidatedEmployee`] produced by
//! consolidation.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SourceCategory;

/// The registration identifier (matrícula) of an employee.
///
/// Keys are never empty. All-digit keys order numerically, so `"999"` sorts
/// before `"1000"`; any other key orders lexically after the numeric ones.
///
/// # Example
///
/// ```
/// use vr_engine::models::EmployeeKey;
///
/// let key = EmployeeKey::parse(" 34941.0 ").unwrap();
/// assert_eq!(key.as_str(), "34941");
/// assert!(EmployeeKey::parse("   ").is_none());
/// assert!(EmployeeKey::parse("999").unwrap() < EmployeeKey::parse("1000").unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeKey(String);

impl EmployeeKey {
    /// Parses a raw cell into a key.
    ///
    /// Surrounding whitespace is trimmed and spreadsheet float renderings of
    /// integers (`"1234.0"`) collapse to the integer form. Returns `None` when
    /// nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let collapsed = match trimmed.split_once('.') {
            Some((int, frac))
                if !int.is_empty()
                    && int.bytes().all(|b| b.is_ascii_digit())
                    && !frac.is_empty()
                    && frac.bytes().all(|b| b == b'0') =>
            {
                int
            }
            _ => trimmed,
        };

        if collapsed.is_empty() {
            None
        } else {
            Some(Self(collapsed.to_string()))
        }
    }

    /// Returns the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_numeric(&self) -> bool {
        self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl Ord for EmployeeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_numeric(), other.is_numeric()) {
            (true, true) => {
                let a = self.0.trim_start_matches('0');
                let b = other.0.trim_start_matches('0');
                a.len()
                    .cmp(&b.len())
                    .then_with(|| a.cmp(b))
                    .then_with(|| self.0.cmp(&other.0))
            }
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for EmployeeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EmployeeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The single authoritative status of an employee for the processing month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    /// Regular active employee.
    Active,
    /// Admitted during or before the month, listed in the admissions source.
    Admitted,
    /// Terminated; the termination date drives proration or the cutoff void.
    Terminated,
    /// On leave (sick leave, maternity leave and similar).
    OnLeave,
    /// On vacation for part of the month.
    OnVacation,
    /// Working abroad.
    Abroad,
    /// Intern; never entitled.
    ExcludedIntern,
    /// Apprentice; never entitled.
    ExcludedApprentice,
    /// Holds a position excluded from the benefit (directors and similar).
    ExcludedPosition,
}

impl EmployeeStatus {
    /// Returns the precedence rank of this status; the highest rank wins.
    ///
    /// Excluded statuses outrank everything, then
    /// Terminated > OnLeave > OnVacation > Abroad > Admitted > Active.
    pub fn precedence(self) -> u8 {
        match self {
            EmployeeStatus::Active => 0,
            EmployeeStatus::Admitted => 1,
            EmployeeStatus::Abroad => 2,
            EmployeeStatus::OnVacation => 3,
            EmployeeStatus::OnLeave => 4,
            EmployeeStatus::Terminated => 5,
            EmployeeStatus::ExcludedPosition => 6,
            EmployeeStatus::ExcludedApprentice => 7,
            EmployeeStatus::ExcludedIntern => 8,
        }
    }

    /// Returns true for statuses that exclude the employee unconditionally.
    pub fn is_excluded(self) -> bool {
        matches!(
            self,
            EmployeeStatus::ExcludedIntern
                | EmployeeStatus::ExcludedApprentice
                | EmployeeStatus::ExcludedPosition
        )
    }

    /// Returns the snake_case name used in summaries and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Admitted => "admitted",
            EmployeeStatus::Terminated => "terminated",
            EmployeeStatus::OnLeave => "on_leave",
            EmployeeStatus::OnVacation => "on_vacation",
            EmployeeStatus::Abroad => "abroad",
            EmployeeStatus::ExcludedIntern => "excluded_intern",
            EmployeeStatus::ExcludedApprentice => "excluded_apprentice",
            EmployeeStatus::ExcludedPosition => "excluded_position",
        }
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vacation or leave absence folded into the consolidated record.
///
/// Either bound may be missing; `days` is the count reported by the source,
/// used when the dates are not known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    /// Free-text situation (e.g. "Auxílio Doença").
    pub situation: Option<String>,
    /// First absent day (inclusive).
    pub start: Option<NaiveDate>,
    /// Last absent day (inclusive).
    pub end: Option<NaiveDate>,
    /// Number of absent days reported by the source.
    pub days: Option<u32>,
}

impl Absence {
    /// Returns true when the absence is bounded by at least one date.
    pub fn is_dated(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }
}

/// The one authoritative record of an employee for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedEmployee {
    /// The registration identifier.
    pub key: EmployeeKey,
    /// The resolved status.
    pub status: EmployeeStatus,
    /// Employee name, if any source carries it.
    pub name: Option<String>,
    /// Document id (CPF), if any source carries it.
    pub document_id: Option<String>,
    /// Employing company, if any source carries it.
    pub company: Option<String>,
    /// Position title, if any source carries it.
    pub position: Option<String>,
    /// Canonical union code.
    pub union_code: Option<String>,
    /// Admission date.
    pub admission_date: Option<NaiveDate>,
    /// Termination date.
    pub termination_date: Option<NaiveDate>,
    /// Vacation absence.
    pub vacation: Option<Absence>,
    /// Leave absence.
    pub leave: Option<Absence>,
    /// Every source category that mentions the employee.
    pub sources: BTreeSet<SourceCategory>,
}

impl ConsolidatedEmployee {
    /// Returns true when a roster source (Active or Admission) lists the employee.
    pub fn on_roster(&self) -> bool {
        self.sources.iter().any(|c| c.is_roster())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> EmployeeKey {
        EmployeeKey::parse(raw).unwrap()
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(key("  1234 ").as_str(), "1234");
    }

    #[test]
    fn test_parse_collapses_float_rendering() {
        assert_eq!(key("1234.0").as_str(), "1234");
        assert_eq!(key("1234.00").as_str(), "1234");
    }

    #[test]
    fn test_parse_keeps_real_fraction() {
        assert_eq!(key("1234.5").as_str(), "1234.5");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(EmployeeKey::parse("").is_none());
        assert!(EmployeeKey::parse("  \t").is_none());
    }

    #[test]
    fn test_numeric_keys_order_numerically() {
        let mut keys = vec![key("1000"), key("999"), key("35000"), key("0042")];
        keys.sort();
        let ordered: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(ordered, vec!["0042", "999", "1000", "35000"]);
    }

    #[test]
    fn test_alphanumeric_keys_sort_after_numeric() {
        let mut keys = vec![key("A10"), key("20"), key("A02")];
        keys.sort();
        let ordered: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(ordered, vec!["20", "A02", "A10"]);
    }

    #[test]
    fn test_leading_zero_keys_stay_distinct() {
        assert_ne!(key("042"), key("42"));
        assert_ne!(key("042").cmp(&key("42")), Ordering::Equal);
    }

    #[test]
    fn test_precedence_is_total() {
        let all = [
            EmployeeStatus::Active,
            EmployeeStatus::Admitted,
            EmployeeStatus::Terminated,
            EmployeeStatus::OnLeave,
            EmployeeStatus::OnVacation,
            EmployeeStatus::Abroad,
            EmployeeStatus::ExcludedIntern,
            EmployeeStatus::ExcludedApprentice,
            EmployeeStatus::ExcludedPosition,
        ];
        let ranks: BTreeSet<u8> = all.iter().map(|s| s.precedence()).collect();
        assert_eq!(ranks.len(), all.len());
    }

    #[test]
    fn test_excluded_statuses_outrank_terminated() {
        assert!(
            EmployeeStatus::ExcludedPosition.precedence()
                > EmployeeStatus::Terminated.precedence()
        );
        assert!(EmployeeStatus::ExcludedIntern.is_excluded());
        assert!(!EmployeeStatus::Terminated.is_excluded());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&EmployeeStatus::OnVacation).unwrap(),
            "\"on_vacation\""
        );
        assert_eq!(EmployeeStatus::ExcludedIntern.to_string(), "excluded_intern");
    }

    #[test]
    fn test_on_roster_requires_active_or_admission() {
        let mut employee = ConsolidatedEmployee {
            key: key("1"),
            status: EmployeeStatus::Terminated,
            name: None,
            document_id: None,
            company: None,
            position: None,
            union_code: None,
            admission_date: None,
            termination_date: None,
            vacation: None,
            leave: None,
            sources: BTreeSet::from([SourceCategory::Terminated]),
        };
        assert!(!employee.on_roster());

        employee.sources.insert(SourceCategory::Admission);
        assert!(employee.on_roster());
    }
}
