//! Final report assembly.

use std::collections::BTreeSet;

use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    CalculationResult, ConsolidatedEmployee, NORMAL_CALCULATION_NOTE, ProcessingMonth, ReportRow,
};

/// Builds the report row of one calculated employee.
///
/// `OBS GERAL` lists the notes of the rules that changed the result, or
/// [`NORMAL_CALCULATION_NOTE`] when none did.
pub fn build_report_row(
    employee: &ConsolidatedEmployee,
    result: &CalculationResult,
    month: ProcessingMonth,
) -> ReportRow {
    let observations = if result.notes.is_empty() {
        NORMAL_CALCULATION_NOTE.to_string()
    } else {
        result.notes.join("; ")
    };

    ReportRow {
        key: result.key.clone(),
        admission_date: employee.admission_date,
        union_code: result.union_code.clone(),
        competence: month,
        payable_days: result.payable_days,
        daily_value: result.daily_value,
        total_value: result.total_value,
        employer_share: result.employer_share,
        employee_share: result.employee_share,
        observations,
    }
}

/// Orders the rows by key and checks each key appears once.
///
/// # Errors
///
/// Returns [`EngineError::DuplicateKeyError`] for the first repeated key.
pub fn assemble_report(mut rows: Vec<ReportRow>) -> EngineResult<Vec<ReportRow>> {
    let mut seen = BTreeSet::new();
    for row in &rows {
        if !seen.insert(&row.key) {
            return Err(EngineError::DuplicateKeyError {
                key: row.key.to_string(),
            });
        }
    }

    rows.sort_by(|a, b| a.key.cmp(&b.key));
    info!(rows = rows.len(), "Assembled report");
    Ok(rows)
}
