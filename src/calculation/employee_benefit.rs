//! Per-employee benefit calculation.
//!
//! Combines the payable-day calculation with the union value lookup and the
//! cost split. Pure over its inputs, so employees can be calculated in
//! parallel.

use rust_decimal::Decimal;
use tracing::debug;

use super::{calculate_benefit_split, calculate_payable_days};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CalculationResult, ConsolidatedEmployee, ProcessingMonth, UnionCalendars, UnionValues,
};

/// Everything a single employee's calculation reads besides the employee.
#[derive(Debug, Clone, Copy)]
pub struct CalculationContext<'a> {
    /// The processing month.
    pub month: ProcessingMonth,
    /// Terminations on or before this day void the month.
    pub cutoff_day: u32,
    /// Fraction of the benefit funded by the company.
    pub company_percentage: Decimal,
    /// Working-day calendars per union.
    pub calendars: &'a UnionCalendars,
    /// Daily values per union.
    pub values: &'a UnionValues,
}

/// Calculates the benefit of one included employee.
///
/// # Errors
///
/// - [`EngineError::UnresolvedStatusError`] if the employee has no union
/// - [`EngineError::CalendarGapError`] if the union has no working days in the month
/// - [`EngineError::MissingUnionValueError`] if the union has no daily value
pub fn calculate_employee(
    employee: &ConsolidatedEmployee,
    context: &CalculationContext<'_>,
) -> EngineResult<CalculationResult> {
    let union_code = employee
        .union_code
        .as_deref()
        .ok_or_else(|| EngineError::UnresolvedStatusError {
            key: employee.key.to_string(),
            message: "included employee has no union".to_string(),
        })?;

    let calendar = context.calendars.get(union_code)?;
    let daily_value = context.values.get(union_code)?;

    let days = calculate_payable_days(employee, calendar, context.month, context.cutoff_day, 1);
    let split_step = days.audit_steps.len() as u32 + 1;
    let split = calculate_benefit_split(
        days.payable_days,
        daily_value,
        context.company_percentage,
        split_step,
    );

    let mut audit_steps = days.audit_steps;
    audit_steps.push(split.audit_step);

    debug!(
        key = %employee.key,
        union = union_code,
        payable_days = days.payable_days,
        total = %split.total_value,
        "Calculated employee benefit"
    );

    Ok(CalculationResult {
        key: employee.key.clone(),
        union_code: union_code.to_string(),
        payable_days: days.payable_days,
        daily_value,
        total_value: split.total_value,
        employer_share: split.employer_share,
        employee_share: split.employee_share,
        notes: days.notes,
        audit_steps,
    })
}
