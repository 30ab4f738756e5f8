//! Payable working-day calculation.
//!
//! The payable interval starts as the whole processing month and is narrowed
//! by admission and termination. A termination on or before the cutoff day
//! voids the month. Union working days inside the interval are counted and
//! vacation/leave days are deducted, each calendar day at most once.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde_json::json;

use crate::models::{Absence, AuditStep, ConsolidatedEmployee, ProcessingMonth, UnionCalendar};

/// The result of the payable-day calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct PayableDaysResult {
    /// Working days the benefit is paid for.
    pub payable_days: u32,
    /// The payable interval, if any part of the month is payable.
    pub interval: Option<(NaiveDate, NaiveDate)>,
    /// Report observations for the rules that changed the result.
    pub notes: Vec<String>,
    /// Every rule applied, numbered from the requested first step.
    pub audit_steps: Vec<AuditStep>,
}

/// Collects audit steps with sequential numbering.
struct Trail {
    steps: Vec<AuditStep>,
    next: u32,
    notes: Vec<String>,
}

impl Trail {
    fn new(first_step: u32) -> Self {
        Self {
            steps: Vec::new(),
            next: first_step,
            notes: Vec::new(),
        }
    }

    fn record(
        &mut self,
        rule_id: &str,
        rule_name: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: String,
    ) {
        self.steps.push(AuditStep {
            step_number: self.next,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            input,
            output,
            reasoning,
        });
        self.next += 1;
    }

    fn note(&mut self, note: String) {
        self.notes.push(note);
    }

    fn finish(self, payable_days: u32, interval: Option<(NaiveDate, NaiveDate)>) -> PayableDaysResult {
        PayableDaysResult {
            payable_days,
            interval,
            notes: self.notes,
            audit_steps: self.steps,
        }
    }
}

fn br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Calculates the payable working days of one employee.
///
/// # Arguments
///
/// * `employee` - The consolidated employee
/// * `calendar` - The working-day calendar of the employee's union
/// * `month` - The processing month
/// * `cutoff_day` - Terminations on or before this day of the month void it
/// * `first_step` - The step number of the first audit step
///
/// # Returns
///
/// A [`PayableDaysResult`] with the payable days, the notes for the report and
/// one audit step per rule applied.
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
/// use chrono::NaiveDate;
/// use vr_engine::calculation::calculate_payable_days;
/// use vr_engine::models::*;
///
/// let month = ProcessingMonth::new(2025, 5).unwrap();
/// let mut calendar = UnionCalendar::new("SINDPD SP", month);
/// for d in [2, 5, 6, 7, 8, 9, 12, 13, 14, 15, 16, 19] {
///     calendar.insert(NaiveDate::from_ymd_opt(2025, 5, d).unwrap());
/// }
///
/// let employee = ConsolidatedEmployee {
///     key: EmployeeKey::parse("1").unwrap(),
///     status: EmployeeStatus::Terminated,
///     name: None,
///     document_id: None,
///     company: None,
///     position: None,
///     union_code: Some("SINDPD SP".to_string()),
///     admission_date: None,
///     termination_date: NaiveDate::from_ymd_opt(2025, 5, 16),
///     vacation: None,
///     leave: None,
///     sources: BTreeSet::from([SourceCategory::Active, SourceCategory::Terminated]),
/// };
///
/// let result = calculate_payable_days(&employee, &calendar, month, 15, 1);
/// assert_eq!(result.payable_days, 11);
/// ```
pub fn calculate_payable_days(
    employee: &ConsolidatedEmployee,
    calendar: &UnionCalendar,
    month: ProcessingMonth,
    cutoff_day: u32,
    first_step: u32,
) -> PayableDaysResult {
    let mut trail = Trail::new(first_step);
    let first = month.first_day();
    let last = month.last_day();
    let mut start = first;
    let mut end = last;

    if let Some(admission) = employee.admission_date {
        if admission > last {
            trail.record(
                "admission_after_month",
                "Admission After Month",
                json!({ "admission_date": admission.to_string(), "month_end": last.to_string() }),
                json!({ "payable_days": 0 }),
                format!("Admitted on {admission}, after the processing month ends on {last}"),
            );
            trail.note(format!("ADMISSÃO EM {} APÓS A COMPETÊNCIA", br(admission)));
            return trail.finish(0, None);
        }
        if admission > first {
            start = admission;
            trail.record(
                "admission_proration",
                "Admission Proration",
                json!({ "admission_date": admission.to_string() }),
                json!({ "interval_start": start.to_string() }),
                format!("Admitted within the month; interval starts on {admission}"),
            );
            trail.note(format!("ADMISSÃO EM {}", br(admission)));
        }
    }

    if let Some(termination) = employee.termination_date {
        if termination < first {
            trail.record(
                "termination_before_month",
                "Termination Before Month",
                json!({ "termination_date": termination.to_string(), "month_start": first.to_string() }),
                json!({ "payable_days": 0 }),
                format!("Terminated on {termination}, before the processing month"),
            );
            trail.note(format!("DESLIGADO EM {} ANTES DA COMPETÊNCIA", br(termination)));
            return trail.finish(0, None);
        }
        if termination <= last {
            if termination.day() <= cutoff_day {
                trail.record(
                    "termination_cutoff",
                    "Termination Cutoff",
                    json!({ "termination_date": termination.to_string(), "cutoff_day": cutoff_day }),
                    json!({ "payable_days": 0, "month_voided": true }),
                    format!(
                        "Terminated on day {} <= cutoff day {}; the month is voided",
                        termination.day(),
                        cutoff_day
                    ),
                );
                trail.note(format!(
                    "DESLIGADO EM {} ATÉ O DIA {}: SEM BENEFÍCIO",
                    br(termination),
                    cutoff_day
                ));
                return trail.finish(0, None);
            }
            end = termination;
            trail.record(
                "termination_proration",
                "Termination Proration",
                json!({ "termination_date": termination.to_string(), "cutoff_day": cutoff_day }),
                json!({ "interval_end": end.to_string() }),
                format!(
                    "Terminated on day {} > cutoff day {}; interval ends on {}",
                    termination.day(),
                    cutoff_day,
                    termination
                ),
            );
            trail.note(format!("DESLIGADO EM {}", br(termination)));
        }
    }

    if start > end {
        trail.record(
            "empty_interval",
            "Empty Interval",
            json!({ "interval_start": start.to_string(), "interval_end": end.to_string() }),
            json!({ "payable_days": 0 }),
            "Admission falls after termination; nothing is payable".to_string(),
        );
        return trail.finish(0, None);
    }

    let working_days = calendar.count_between(start, end);
    trail.record(
        "calendar_working_days",
        "Union Working Days",
        json!({
            "union": calendar.union_code,
            "interval_start": start.to_string(),
            "interval_end": end.to_string(),
        }),
        json!({ "working_days": working_days }),
        format!(
            "{} working days of {} between {} and {}",
            working_days, calendar.union_code, start, end
        ),
    );

    let deducted = deduct_absences(employee, calendar, start, end, working_days, &mut trail);
    let payable_days = working_days - deducted;

    if deducted > 0 {
        trail.record(
            "absence_deduction",
            "Absence Deduction",
            json!({ "working_days": working_days, "absent_days": deducted }),
            json!({ "payable_days": payable_days }),
            format!("{working_days} - {deducted} absent days = {payable_days} payable days"),
        );
    }

    trail.finish(payable_days, Some((start, end)))
}

/// Returns the absent working days inside `[start, end]`, at most `working_days`.
fn deduct_absences(
    employee: &ConsolidatedEmployee,
    calendar: &UnionCalendar,
    start: NaiveDate,
    end: NaiveDate,
    working_days: u32,
    trail: &mut Trail,
) -> u32 {
    let mut covered: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut undated = 0u32;
    let mut whole_interval = false;

    let absences: [(&str, &str, Option<&Absence>); 2] = [
        ("vacation", "FÉRIAS", employee.vacation.as_ref()),
        ("leave", "AFASTAMENTO", employee.leave.as_ref()),
    ];

    for (kind, label, absence) in absences {
        let Some(absence) = absence else { continue };

        if absence.is_dated() {
            let from = absence.start.map_or(start, |d| d.max(start));
            let to = absence.end.map_or(end, |d| d.min(end));
            let days: Vec<NaiveDate> = calendar.days_between(from, to).collect();
            trail.record(
                &format!("{kind}_dated"),
                "Dated Absence",
                json!({
                    "kind": kind,
                    "start": absence.start.map(|d| d.to_string()),
                    "end": absence.end.map(|d| d.to_string()),
                }),
                json!({ "working_days_covered": days.len() }),
                format!("{} covers {} working days inside the interval", kind, days.len()),
            );
            if !days.is_empty() {
                trail.note(format!("{label}: {} DIA(S)", days.len()));
            }
            covered.extend(days);
        } else if let Some(days) = absence.days {
            undated = undated.saturating_add(days);
            trail.record(
                &format!("{kind}_undated"),
                "Undated Absence",
                json!({ "kind": kind, "days": days }),
                json!({ "days_deducted": days }),
                format!("{kind} has no dates; deducting its {days} reported days"),
            );
            if days > 0 {
                trail.note(format!("{label}: {days} DIA(S)"));
            }
        } else if kind == "leave" {
            whole_interval = true;
            trail.record(
                "leave_whole_interval",
                "Open Leave",
                json!({ "kind": kind, "situation": absence.situation }),
                json!({ "days_deducted": working_days }),
                "Leave has neither dates nor a day count; it covers the whole interval".to_string(),
            );
            trail.note(format!("{label} SEM PERÍODO: MÊS INTEIRO"));
        }
    }

    if whole_interval {
        working_days
    } else {
        (covered.len() as u32).saturating_add(undated).min(working_days)
    }
}
