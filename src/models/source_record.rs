//! Source categories and the canonical partial records they produce.
//!
//! Every input table belongs to exactly one [`SourceCategory`]. The normalizer
//! turns each row of a table into a [`SourceRecord`] variant carrying only the
//! fields that category knows about.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EmployeeKey, ProcessingMonth};

/// The category of an input source.
///
/// Declaration order is the fixed order used when carrying attributes during
/// consolidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    /// Active employees roster (ATIVOS).
    Active,
    /// Terminations (DESLIGADOS).
    Terminated,
    /// Admissions of the month (ADMISSÃO).
    Admission,
    /// Leaves of absence (AFASTAMENTOS).
    Leave,
    /// Vacations (FÉRIAS).
    Vacation,
    /// Interns (ESTÁGIO).
    Intern,
    /// Apprentices (APRENDIZ).
    Apprentice,
    /// Employees working abroad (EXTERIOR).
    Abroad,
    /// Daily benefit value per union.
    UnionValue,
    /// Working-day calendar per union.
    UnionCalendar,
    /// Month parameters (VR MENSAL).
    MonthConfig,
}

impl SourceCategory {
    /// All categories, in declaration order.
    pub const ALL: [SourceCategory; 11] = [
        SourceCategory::Active,
        SourceCategory::Terminated,
        SourceCategory::Admission,
        SourceCategory::Leave,
        SourceCategory::Vacation,
        SourceCategory::Intern,
        SourceCategory::Apprentice,
        SourceCategory::Abroad,
        SourceCategory::UnionValue,
        SourceCategory::UnionCalendar,
        SourceCategory::MonthConfig,
    ];

    /// Returns the snake_case name used in errors, logs and configuration keys.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceCategory::Active => "active",
            SourceCategory::Terminated => "terminated",
            SourceCategory::Admission => "admission",
            SourceCategory::Leave => "leave",
            SourceCategory::Vacation => "vacation",
            SourceCategory::Intern => "intern",
            SourceCategory::Apprentice => "apprentice",
            SourceCategory::Abroad => "abroad",
            SourceCategory::UnionValue => "union_value",
            SourceCategory::UnionCalendar => "union_calendar",
            SourceCategory::MonthConfig => "month_config",
        }
    }

    /// Returns true for categories whose rows describe a single employee.
    pub fn is_employee_scoped(self) -> bool {
        !matches!(
            self,
            SourceCategory::UnionValue | SourceCategory::UnionCalendar | SourceCategory::MonthConfig
        )
    }

    /// Returns true for the categories that place an employee on the roster.
    pub fn is_roster(self) -> bool {
        matches!(self, SourceCategory::Active | SourceCategory::Admission)
    }

    /// Returns true when a run cannot proceed without this source.
    pub fn is_required(self) -> bool {
        matches!(
            self,
            SourceCategory::Active | SourceCategory::UnionValue | SourceCategory::UnionCalendar
        )
    }

    /// Returns the file name looked up in the input directory by default.
    pub fn default_file_name(self) -> &'static str {
        match self {
            SourceCategory::Active => "ATIVOS.csv",
            SourceCategory::Terminated => "DESLIGADOS.csv",
            SourceCategory::Admission => "ADMISSAO.csv",
            SourceCategory::Leave => "AFASTAMENTOS.csv",
            SourceCategory::Vacation => "FERIAS.csv",
            SourceCategory::Intern => "ESTAGIO.csv",
            SourceCategory::Apprentice => "APRENDIZ.csv",
            SourceCategory::Abroad => "EXTERIOR.csv",
            SourceCategory::UnionValue => "SINDICATO_VALOR.csv",
            SourceCategory::UnionCalendar => "DIAS_UTEIS.csv",
            SourceCategory::MonthConfig => "VR_MENSAL.csv",
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the active roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRecord {
    /// The registration identifier.
    pub key: EmployeeKey,
    /// Employee name.
    pub name: Option<String>,
    /// Document id (CPF).
    pub document_id: Option<String>,
    /// Employing company.
    pub company: Option<String>,
    /// Position title.
    pub position: Option<String>,
    /// Canonical union code.
    pub union_code: Option<String>,
    /// Free-text situation ("Trabalhando", ...).
    pub situation: Option<String>,
    /// Admission date.
    pub admission_date: Option<NaiveDate>,
}

/// A row of the terminations source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationRecord {
    /// The registration identifier.
    pub key: EmployeeKey,
    /// Last working day.
    pub termination_date: NaiveDate,
    /// Canonical union code.
    pub union_code: Option<String>,
}

/// A row of the admissions source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionRecord {
    /// The registration identifier.
    pub key: EmployeeKey,
    /// First working day.
    pub admission_date: NaiveDate,
    /// Position title.
    pub position: Option<String>,
    /// Canonical union code.
    pub union_code: Option<String>,
    /// Employee name.
    pub name: Option<String>,
}

/// A row of the leave or vacation sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceRecord {
    /// The registration identifier.
    pub key: EmployeeKey,
    /// Free-text situation.
    pub situation: Option<String>,
    /// First absent day.
    pub start: Option<NaiveDate>,
    /// Last absent day.
    pub end: Option<NaiveDate>,
    /// Absent day count.
    pub days: Option<u32>,
}

/// A row of the intern or apprentice sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRecord {
    /// The registration identifier.
    pub key: EmployeeKey,
    /// Position title.
    pub position: Option<String>,
}

/// A row of the abroad source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbroadRecord {
    /// The registration identifier.
    pub key: EmployeeKey,
    /// Canonical union code.
    pub union_code: Option<String>,
}

/// What a union value row is keyed by.
///
/// Exports of the value table name either the union itself or the state the
/// union represents; state rows are translated through the configured
/// state table when the value table is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnionValueKey {
    /// Canonical union code.
    Union(String),
    /// State name as written in the source.
    State(String),
}

/// A row of the union value table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionValueRecord {
    /// The union, or the state standing for it.
    pub key: UnionValueKey,
    /// Daily benefit value, two decimal places.
    pub daily_value: Decimal,
}

/// A row of the working-day calendar: one working day of one union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDayRecord {
    /// Canonical union code.
    pub union_code: String,
    /// The working day.
    pub date: NaiveDate,
}

/// A row of the month configuration source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "parameter", content = "value", rename_all = "snake_case")]
pub enum MonthSetting {
    /// The processing month.
    ProcessingMonth(ProcessingMonth),
    /// The termination cutoff day.
    CutoffDay(u32),
    /// The employer share.
    CompanyPercentage(Decimal),
    /// The employee share.
    EmployeePercentage(Decimal),
    /// One more excluded position title.
    ExcludedPosition(String),
}

impl MonthSetting {
    /// Returns the parameter name, used as the conflict key.
    pub fn parameter(&self) -> &'static str {
        match self {
            MonthSetting::ProcessingMonth(_) => "processing_month",
            MonthSetting::CutoffDay(_) => "cutoff_day",
            MonthSetting::CompanyPercentage(_) => "company_percentage",
            MonthSetting::EmployeePercentage(_) => "employee_percentage",
            MonthSetting::ExcludedPosition(_) => "excluded_position",
        }
    }
}

/// A canonical partial record produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum SourceRecord {
    /// Active roster row.
    Active(ActiveRecord),
    /// Termination row.
    Terminated(TerminationRecord),
    /// Admission row.
    Admission(AdmissionRecord),
    /// Leave row.
    Leave(AbsenceRecord),
    /// Vacation row.
    Vacation(AbsenceRecord),
    /// Intern row.
    Intern(ExclusionRecord),
    /// Apprentice row.
    Apprentice(ExclusionRecord),
    /// Abroad row.
    Abroad(AbroadRecord),
    /// Union daily value row.
    UnionValue(UnionValueRecord),
    /// Union working-day row.
    UnionCalendar(CalendarDayRecord),
    /// Month parameter row.
    MonthConfig(MonthSetting),
}

impl SourceRecord {
    /// Returns the category tag of this record.
    pub fn category(&self) -> SourceCategory {
        match self {
            SourceRecord::Active(_) => SourceCategory::Active,
            SourceRecord::Terminated(_) => SourceCategory::Terminated,
            SourceRecord::Admission(_) => SourceCategory::Admission,
            SourceRecord::Leave(_) => SourceCategory::Leave,
            SourceRecord::Vacation(_) => SourceCategory::Vacation,
            SourceRecord::Intern(_) => SourceCategory::Intern,
            SourceRecord::Apprentice(_) => SourceCategory::Apprentice,
            SourceRecord::Abroad(_) => SourceCategory::Abroad,
            SourceRecord::UnionValue(_) => SourceCategory::UnionValue,
            SourceRecord::UnionCalendar(_) => SourceCategory::UnionCalendar,
            SourceRecord::MonthConfig(_) => SourceCategory::MonthConfig,
        }
    }

    /// Returns the employee key for employee-scoped records.
    pub fn employee_key(&self) -> Option<&EmployeeKey> {
        match self {
            SourceRecord::Active(r) => Some(&r.key),
            SourceRecord::Terminated(r) => Some(&r.key),
            SourceRecord::Admission(r) => Some(&r.key),
            SourceRecord::Leave(r) | SourceRecord::Vacation(r) => Some(&r.key),
            SourceRecord::Intern(r) | SourceRecord::Apprentice(r) => Some(&r.key),
            SourceRecord::Abroad(r) => Some(&r.key),
            SourceRecord::UnionValue(_)
            | SourceRecord::UnionCalendar(_)
            | SourceRecord::MonthConfig(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_snake_case() {
        assert_eq!(SourceCategory::UnionCalendar.to_string(), "union_calendar");
        assert_eq!(SourceCategory::Terminated.to_string(), "terminated");
    }

    #[test]
    fn test_serde_matches_display() {
        for category in SourceCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category));
        }
    }

    #[test]
    fn test_all_is_in_declaration_order() {
        let mut sorted = SourceCategory::ALL;
        sorted.sort();
        assert_eq!(sorted, SourceCategory::ALL);
    }

    #[test]
    fn test_required_sources() {
        let required: Vec<_> = SourceCategory::ALL
            .into_iter()
            .filter(|c| c.is_required())
            .collect();
        assert_eq!(
            required,
            vec![
                SourceCategory::Active,
                SourceCategory::UnionValue,
                SourceCategory::UnionCalendar
            ]
        );
    }

    #[test]
    fn test_reference_tables_are_not_employee_scoped() {
        assert!(SourceCategory::Abroad.is_employee_scoped());
        assert!(!SourceCategory::UnionValue.is_employee_scoped());
        assert!(!SourceCategory::MonthConfig.is_employee_scoped());
    }

    #[test]
    fn test_record_category_and_key() {
        let key = EmployeeKey::parse("42").unwrap();
        let record = SourceRecord::Vacation(AbsenceRecord {
            key: key.clone(),
            situation: None,
            start: None,
            end: None,
            days: Some(10),
        });
        assert_eq!(record.category(), SourceCategory::Vacation);
        assert_eq!(record.employee_key(), Some(&key));

        let value = SourceRecord::UnionValue(UnionValueRecord {
            key: UnionValueKey::Union("SINDPD SP".to_string()),
            daily_value: Decimal::new(3500, 2),
        });
        assert_eq!(value.category(), SourceCategory::UnionValue);
        assert!(value.employee_key().is_none());
    }

    #[test]
    fn test_month_setting_parameter_names() {
        assert_eq!(MonthSetting::CutoffDay(15).parameter(), "cutoff_day");
        assert_eq!(
            MonthSetting::ExcludedPosition("DIRETOR".to_string()).parameter(),
            "excluded_position"
        );
    }
}
