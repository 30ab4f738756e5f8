//! Reference table construction.
//!
//! Folds the union value, union calendar and month configuration records into
//! lookup tables and month-level overrides.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::config::MonthSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    MonthSetting, ProcessingMonth, RunWarning, SourceCategory, SourceRecord, UnionCalendars,
    UnionValueKey, UnionValues,
};
use crate::normalize::{canonical_union_code, fold_header};

/// Builds the daily value table.
///
/// Rows keyed by state are translated through `union_states` (state name to
/// union code, names compared after header folding). A state with no entry
/// is dropped with a warning.
///
/// # Errors
///
/// Returns [`EngineError::KeyConflictError`] when one union is given two
/// different daily values. Repeated identical values are accepted.
pub fn build_union_values(
    records: &[SourceRecord],
    union_states: &BTreeMap<String, String>,
) -> EngineResult<(UnionValues, Vec<RunWarning>)> {
    let states: BTreeMap<String, String> = union_states
        .iter()
        .filter_map(|(state, union)| Some((fold_header(state), canonical_union_code(union)?)))
        .collect();

    let mut values = UnionValues::new();
    let mut warnings = Vec::new();

    for record in records {
        let SourceRecord::UnionValue(row) = record else {
            continue;
        };
        let union_code = match &row.key {
            UnionValueKey::Union(code) => code.clone(),
            UnionValueKey::State(state) => match states.get(&fold_header(state)) {
                Some(code) => code.clone(),
                None => {
                    warn!(state = %state, "No union configured for state");
                    warnings.push(RunWarning::new(
                        "reference",
                        "unknown_state",
                        format!("ignored daily value of state '{state}': no union configured"),
                    ));
                    continue;
                }
            },
        };

        if let Some(previous) = values.insert(union_code.clone(), row.daily_value) {
            if previous != row.daily_value {
                return Err(EngineError::KeyConflictError {
                    category: SourceCategory::UnionValue,
                    key: union_code,
                });
            }
            debug!(union = %union_code, "Collapsed repeated union value");
        }
    }

    info!(unions = values.len(), "Built union value table");
    Ok((values, warnings))
}

/// Builds the working-day calendars for `month`.
///
/// Dates outside the month are dropped with a single warning per union;
/// repeated dates collapse.
pub fn build_union_calendars(
    records: &[SourceRecord],
    month: ProcessingMonth,
) -> (UnionCalendars, Vec<RunWarning>) {
    let mut calendars = UnionCalendars::new(month);
    let mut dropped: BTreeMap<&str, usize> = BTreeMap::new();

    for record in records {
        let SourceRecord::UnionCalendar(row) = record else {
            continue;
        };
        if !calendars.add_day(&row.union_code, row.date) {
            *dropped.entry(row.union_code.as_str()).or_default() += 1;
        }
    }

    let warnings = dropped
        .into_iter()
        .map(|(union, count)| {
            warn!(union, dropped = count, month = %month, "Calendar dates outside the month");
            RunWarning::new(
                "reference",
                "calendar_outside_month",
                format!("ignored {count} calendar date(s) of union '{union}' outside {month}"),
            )
        })
        .collect();

    info!(unions = calendars.len(), month = %month, "Built union calendars");
    (calendars, warnings)
}

/// Folds month configuration records into overrides.
///
/// # Errors
///
/// Returns [`EngineError::KeyConflictError`] when a parameter is given two
/// different values. Excluded positions accumulate instead.
pub fn build_month_settings(records: &[SourceRecord]) -> EngineResult<MonthSettings> {
    fn set<T: PartialEq>(slot: &mut Option<T>, value: T, parameter: &str) -> EngineResult<()> {
        if slot.as_ref().is_some_and(|existing| *existing != value) {
            return Err(EngineError::KeyConflictError {
                category: SourceCategory::MonthConfig,
                key: parameter.to_string(),
            });
        }
        *slot = Some(value);
        Ok(())
    }

    let mut settings = MonthSettings::default();

    for record in records {
        let SourceRecord::MonthConfig(setting) = record else {
            continue;
        };
        let parameter = setting.parameter();
        match setting {
            MonthSetting::ProcessingMonth(month) => {
                set(&mut settings.processing_month, *month, parameter)?
            }
            MonthSetting::CutoffDay(day) => set(&mut settings.cutoff_day, *day, parameter)?,
            MonthSetting::CompanyPercentage(value) => {
                set(&mut settings.company_percentage, *value, parameter)?
            }
            MonthSetting::EmployeePercentage(value) => {
                set(&mut settings.employee_percentage, *value, parameter)?
            }
            MonthSetting::ExcludedPosition(title) => {
                if !settings.excluded_positions.contains(title) {
                    settings.excluded_positions.push(title.clone());
                }
            }
        }
    }

    Ok(settings)
}
