//! End-to-end run over an in-memory snapshot of the sources.
//!
//! normalize → month settings → reference tables → consolidate → filter →
//! calculate (parallel) → assemble. No I/O happens here; see [`crate::io`]
//! for reading the sources and writing the report.

use std::collections::BTreeMap;

use chrono::Utc;
use rayon::prelude::*;
use tracing::info;
use uuid::Uuid;

use crate::calculation::{
    CalculationContext, EligibilityPolicy, assemble_report, build_month_settings,
    build_report_row, build_union_calendars, build_union_values, calculate_employee, consolidate,
    filter_eligible,
};
use crate::config::{MonthSettings, RunConfig};
use crate::error::EngineResult;
use crate::models::{
    BenefitTotals, CalculationResult, ExclusionReason, ReportRow, RunCounts, RunSummary,
    RunWarning, SourceRecord, UnionTotals,
};
use crate::normalize::{RawTable, normalize_table};

/// Everything a successful run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// The effective configuration after the month source and command-line overrides.
    pub config: RunConfig,
    /// Report rows, ordered by key.
    pub rows: Vec<ReportRow>,
    /// Per-employee results with their audit trail, ordered by key.
    pub results: Vec<CalculationResult>,
    /// Counts, exclusions, warnings and totals.
    pub summary: RunSummary,
}

/// Runs the whole reconciliation and calculation.
///
/// # Arguments
///
/// * `tables` - One raw table per source that was present
/// * `config` - The loaded run configuration
/// * `overrides` - Command-line overrides, applied after the month source
///
/// # Returns
///
/// The report and run summary, or the first fatal error. No partial output is
/// produced on error.
///
/// # Example
///
/// ```
/// use vr_engine::config::{MonthSettings, RunConfig};
/// use vr_engine::models::SourceCategory;
/// use vr_engine::normalize::RawTable;
/// use vr_engine::pipeline;
///
/// let tables = vec![
///     RawTable::from_rows(
///         SourceCategory::Active,
///         &["MATRICULA", "TITULO DO CARGO", "Sindicato"],
///         &[&["34941", "ANALISTA", "SINDPD SP"]],
///     ),
///     RawTable::from_rows(
///         SourceCategory::UnionValue,
///         &["Sindicato", "VALOR"],
///         &[&["SINDPD SP", "35,00"]],
///     ),
///     RawTable::from_rows(
///         SourceCategory::UnionCalendar,
///         &["Sindicato", "DATA"],
///         &[&["SINDPD SP", "02/05/2025"], &["SINDPD SP", "05/05/2025"]],
///     ),
/// ];
///
/// let config = RunConfig {
///     processing_month: "05/2025".parse().ok(),
///     ..RunConfig::default()
/// };
/// let output = pipeline::run(&tables, &config, &MonthSettings::default()).unwrap();
/// assert_eq!(output.rows.len(), 1);
/// assert_eq!(output.rows[0].total_value.to_string(), "70.00");
/// ```
pub fn run(
    tables: &[RawTable],
    config: &RunConfig,
    overrides: &MonthSettings,
) -> EngineResult<RunOutput> {
    let mut warnings: Vec<RunWarning> = Vec::new();
    let mut records: Vec<SourceRecord> = Vec::new();

    for table in tables {
        let normalized = normalize_table(table)?;
        info!(
            category = %normalized.category,
            source = %table.source_name,
            records = normalized.records.len(),
            "Normalized source"
        );
        records.extend(normalized.records);
        warnings.extend(normalized.warnings);
    }

    let month_settings = build_month_settings(&records)?;
    let config = config
        .with_overrides(&month_settings)?
        .with_overrides(overrides)?;
    let month = config.month()?;
    info!(
        month = %month,
        cutoff_day = config.cutoff_day,
        company_percentage = %config.company_percentage,
        "Effective run configuration"
    );

    let (values, value_warnings) = build_union_values(&records, &config.union_states)?;
    warnings.extend(value_warnings);
    let (calendars, calendar_warnings) = build_union_calendars(&records, month);
    warnings.extend(calendar_warnings);

    let policy = EligibilityPolicy::from_config(&config);
    let consolidation = consolidate(&records, &policy)?;
    warnings.extend(consolidation.warnings);
    let employees_seen = consolidation.employees.len();

    let outcome = filter_eligible(consolidation.employees.into_values(), &policy);
    info!(
        included = outcome.included.len(),
        excluded = outcome.excluded.len(),
        "Applied eligibility filter"
    );

    let context = CalculationContext {
        month,
        cutoff_day: config.cutoff_day,
        company_percentage: config.company_percentage,
        calendars: &calendars,
        values: &values,
    };

    // Collecting into a Vec keeps key order, so the first error is the lowest key.
    let results = outcome
        .included
        .par_iter()
        .map(|employee| calculate_employee(employee, &context))
        .collect::<Vec<_>>()
        .into_iter()
        .collect::<EngineResult<Vec<_>>>()?;

    let rows = outcome
        .included
        .iter()
        .zip(&results)
        .map(|(employee, result)| build_report_row(employee, result, month))
        .collect();
    let rows = assemble_report(rows)?;

    let counts = RunCounts {
        employees_seen,
        included: outcome.included.len(),
        excluded: outcome.excluded.len(),
        reported: rows.len(),
        zero_day_rows: rows.iter().filter(|r| r.payable_days == 0).count(),
    };

    let mut exclusions_by_reason: BTreeMap<ExclusionReason, usize> = BTreeMap::new();
    for exclusion in &outcome.excluded {
        *exclusions_by_reason.entry(exclusion.reason).or_default() += 1;
    }

    let mut totals = BenefitTotals::default();
    let mut unions: BTreeMap<String, UnionTotals> = BTreeMap::new();
    for row in &rows {
        totals.add(row);
        let union = unions.entry(row.union_code.clone()).or_default();
        union.employees += 1;
        union.payable_days += u64::from(row.payable_days);
        union.totals.add(row);
    }

    info!(
        reported = counts.reported,
        total = %totals.total_value,
        employer_share = %totals.employer_share,
        employee_share = %totals.employee_share,
        warnings = warnings.len(),
        "Run complete"
    );

    let summary = RunSummary {
        run_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        processing_month: month,
        cutoff_day: config.cutoff_day,
        company_percentage: config.company_percentage,
        counts,
        exclusions_by_reason,
        exclusions: outcome.excluded,
        warnings,
        totals,
        unions,
    };

    Ok(RunOutput {
        config,
        rows,
        results,
        summary,
    })
}
