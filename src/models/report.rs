//! Report rows, exclusions, warnings and the run summary.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EmployeeKey, EmployeeStatus, ProcessingMonth};

/// Delivery columns of the final report, in order.
pub const REPORT_COLUMNS: [&str; 10] = [
    "Matricula",
    "Admissão",
    "Sindicato do Colaborador",
    "Competência",
    "Dias",
    "VALOR DIÁRIO VR",
    "TOTAL",
    "Custo empresa",
    "Desconto profissional",
    "OBS GERAL",
];

/// Observation written when no rule changed the standard calculation.
pub const NORMAL_CALCULATION_NOTE: &str = "CÁLCULO NORMAL";

/// One line of the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Registration identifier.
    pub key: EmployeeKey,
    /// Admission date, if known.
    pub admission_date: Option<NaiveDate>,
    /// Union code.
    pub union_code: String,
    /// Processing month.
    pub competence: ProcessingMonth,
    /// Payable days.
    pub payable_days: u32,
    /// Daily benefit value.
    pub daily_value: Decimal,
    /// Total benefit value.
    pub total_value: Decimal,
    /// Employer share.
    pub employer_share: Decimal,
    /// Employee share.
    pub employee_share: Decimal,
    /// `OBS GERAL` text.
    pub observations: String,
}

impl ReportRow {
    /// Renders the row as the ten delivery cells, in [`REPORT_COLUMNS`] order.
    ///
    /// # Example
    ///
    /// ```
    /// use vr_engine::models::{EmployeeKey, ProcessingMonth, ReportRow};
    /// use rust_decimal::Decimal;
    ///
    /// let row = ReportRow {
    ///     key: EmployeeKey::parse("34941").unwrap(),
    ///     admission_date: None,
    ///     union_code: "SINDPD SP".to_string(),
    ///     competence: ProcessingMonth::new(2025, 5).unwrap(),
    ///     payable_days: 22,
    ///     daily_value: Decimal::new(35, 0),
    ///     total_value: Decimal::new(770, 0),
    ///     employer_share: Decimal::new(616, 0),
    ///     employee_share: Decimal::new(154, 0),
    ///     observations: "CÁLCULO NORMAL".to_string(),
    /// };
    /// let cells = row.to_record();
    /// assert_eq!(cells[3], "01/05/2025");
    /// assert_eq!(cells[6], "770.00");
    /// ```
    pub fn to_record(&self) -> [String; 10] {
        [
            self.key.to_string(),
            self.admission_date
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_default(),
            self.union_code.clone(),
            self.competence.competence_label(),
            self.payable_days.to_string(),
            format_money(self.daily_value),
            format_money(self.total_value),
            format_money(self.employer_share),
            format_money(self.employee_share),
            self.observations.clone(),
        ]
    }
}

fn format_money(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// Why an employee was left out of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Listed as an intern.
    Intern,
    /// Listed as an apprentice.
    Apprentice,
    /// Holds an excluded position.
    ExcludedPosition,
    /// Works abroad and the policy excludes abroad employees.
    Abroad,
    /// Not on the roster: only annotation sources mention the key.
    MissingMandatoryData,
}

/// An employee removed by the eligibility filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    /// The employee key.
    pub key: EmployeeKey,
    /// The exclusion reason.
    pub reason: ExclusionReason,
    /// The resolved status at the time of exclusion.
    pub status: EmployeeStatus,
    /// Supporting detail (the matched position title, the contributing sources).
    pub detail: Option<String>,
}

/// A recoverable issue found during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunWarning {
    /// The stage that raised it ("normalize", "consolidate", ...).
    pub stage: String,
    /// A stable code for the kind of issue.
    pub code: String,
    /// Human-readable description.
    pub message: String,
    /// The employee concerned, if any.
    pub key: Option<EmployeeKey>,
}

impl RunWarning {
    /// Creates a warning not tied to an employee.
    pub fn new(stage: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            code: code.to_string(),
            message: message.into(),
            key: None,
        }
    }

    /// Attaches the employee concerned.
    pub fn for_key(mut self, key: EmployeeKey) -> Self {
        self.key = Some(key);
        self
    }
}

/// Monetary totals over a set of report rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitTotals {
    /// Sum of `TOTAL`.
    pub total_value: Decimal,
    /// Sum of `Custo empresa`.
    pub employer_share: Decimal,
    /// Sum of `Desconto profissional`.
    pub employee_share: Decimal,
}

impl BenefitTotals {
    /// Adds one row to the totals.
    pub fn add(&mut self, row: &ReportRow) {
        self.total_value += row.total_value;
        self.employer_share += row.employer_share;
        self.employee_share += row.employee_share;
    }
}

/// Per-union figures of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionTotals {
    /// Number of reported employees.
    pub employees: usize,
    /// Sum of payable days.
    pub payable_days: u64,
    /// Money totals.
    pub totals: BenefitTotals,
}

/// Employee counts of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    /// Distinct keys seen across employee-scoped sources.
    pub employees_seen: usize,
    /// Employees that passed the eligibility filter.
    pub included: usize,
    /// Employees removed by the eligibility filter.
    pub excluded: usize,
    /// Rows in the report.
    pub reported: usize,
    /// Reported rows with zero payable days.
    pub zero_day_rows: usize,
}

/// Everything a run reports besides the rows themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique identifier of the run.
    pub run_id: Uuid,
    /// When the run finished.
    pub timestamp: DateTime<Utc>,
    /// Version of the engine.
    pub engine_version: String,
    /// The processing month.
    pub processing_month: ProcessingMonth,
    /// Cutoff day used.
    pub cutoff_day: u32,
    /// Company percentage used.
    pub company_percentage: Decimal,
    /// Employee counts.
    pub counts: RunCounts,
    /// Count of exclusions per reason.
    pub exclusions_by_reason: BTreeMap<ExclusionReason, usize>,
    /// Every exclusion.
    pub exclusions: Vec<Exclusion>,
    /// Every recoverable issue.
    pub warnings: Vec<RunWarning>,
    /// Aggregate money totals.
    pub totals: BenefitTotals,
    /// Figures per union code.
    pub unions: BTreeMap<String, UnionTotals>,
}
