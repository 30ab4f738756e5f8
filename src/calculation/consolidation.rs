//! Employee consolidation.
//!
//! Merges the partial records every employee-scoped source holds about a key
//! into exactly one [`ConsolidatedEmployee`] per key, resolving the status by
//! precedence and carrying non-conflicting attributes in fixed category order.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Absence, AbsenceRecord, ConsolidatedEmployee, EmployeeKey, RunWarning, SourceCategory,
    SourceRecord,
};

use super::eligibility::EligibilityPolicy;
use super::status_precedence::resolve_status;
use crate::normalize::fold_header;

const STAGE: &str = "consolidate";

/// Roster situations (folded) that put the employee on leave even when the
/// leave source does not list them.
const ROSTER_LEAVE_SITUATIONS: [&str; 4] =
    ["LICENCA MATERNIDADE", "AUXILIO DOENCA", "ATESTADO", "AFASTADO"];

/// Returns the open leave a roster situation implies, if any.
fn roster_leave(situation: &str) -> Option<Absence> {
    let folded = fold_header(situation);
    ROSTER_LEAVE_SITUATIONS
        .iter()
        .any(|s| folded.contains(s))
        .then(|| Absence {
            situation: Some(situation.to_string()),
            start: None,
            end: None,
            days: None,
        })
}

/// The consolidated employees and the recoverable issues found while merging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Consolidation {
    /// One record per key, in key order.
    pub employees: BTreeMap<EmployeeKey, ConsolidatedEmployee>,
    /// Recoverable issues (attribute disagreements between sources).
    pub warnings: Vec<RunWarning>,
}

/// The records of one key, at most one per category.
type Contributions<'a> = BTreeMap<SourceCategory, &'a SourceRecord>;

/// Consolidates employee-scoped records into one record per key.
///
/// Records of reference-table categories are ignored.
///
/// # Arguments
///
/// * `records` - Normalized records from every source
/// * `policy` - Supplies the excluded position titles and the abroad policy
///
/// # Returns
///
/// The consolidated employees, or an error if:
/// - One category holds two different records for a key (`KeyConflictError`)
/// - An includable employee has no union code (`UnresolvedStatusError`)
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use vr_engine::calculation::{consolidate, EligibilityPolicy};
/// use vr_engine::models::*;
///
/// let key = EmployeeKey::parse("34941").unwrap();
/// let records = vec![
///     SourceRecord::Active(ActiveRecord {
///         key: key.clone(),
///         name: None,
///         document_id: None,
///         company: None,
///         position: Some("ANALISTA".to_string()),
///         union_code: Some("SINDPD SP".to_string()),
///         situation: None,
///         admission_date: None,
///     }),
///     SourceRecord::Terminated(TerminationRecord {
///         key: key.clone(),
///         termination_date: NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
///         union_code: None,
///     }),
/// ];
///
/// let consolidation = consolidate(&records, &EligibilityPolicy::default()).unwrap();
/// assert_eq!(consolidation.employees[&key].status, EmployeeStatus::Terminated);
/// ```
pub fn consolidate(
    records: &[SourceRecord],
    policy: &EligibilityPolicy,
) -> EngineResult<Consolidation> {
    let grouped = group_by_key(records)?;
    let mut consolidation = Consolidation::default();

    for (key, contributions) in grouped {
        let employee = merge_employee(&key, &contributions, policy, &mut consolidation.warnings)?;
        consolidation.employees.insert(key, employee);
    }

    info!(
        employees = consolidation.employees.len(),
        warnings = consolidation.warnings.len(),
        "Consolidated employee records"
    );

    Ok(consolidation)
}

fn group_by_key(records: &[SourceRecord]) -> EngineResult<BTreeMap<EmployeeKey, Contributions<'_>>> {
    let mut grouped: BTreeMap<EmployeeKey, Contributions<'_>> = BTreeMap::new();

    for record in records {
        let Some(key) = record.employee_key() else {
            continue;
        };
        let category = record.category();
        let contributions = grouped.entry(key.clone()).or_default();

        match contributions.get(&category) {
            Some(existing) if *existing == record => {
                debug!(key = %key, category = %category, "Collapsed identical duplicate record");
            }
            Some(_) => {
                return Err(EngineError::KeyConflictError {
                    category,
                    key: key.to_string(),
                });
            }
            None => {
                contributions.insert(category, record);
            }
        }
    }

    Ok(grouped)
}

/// Picks the first value present, in the order given, warning when a later
/// source disagrees with it.
fn carry<T: PartialEq + std::fmt::Debug>(
    key: &EmployeeKey,
    attribute: &str,
    candidates: Vec<(SourceCategory, Option<T>)>,
    warnings: &mut Vec<RunWarning>,
) -> Option<T> {
    let mut chosen: Option<(SourceCategory, T)> = None;

    for (category, value) in candidates {
        let Some(value) = value else { continue };
        if let Some((first, kept)) = &chosen {
            if *kept != value {
                let message = format!(
                    "{attribute} {kept:?} from {first} disagrees with {value:?} from {category}; keeping {first}"
                );
                warn!(key = %key, attribute, "{}", message);
                warnings.push(
                    RunWarning::new(STAGE, "attribute_mismatch", message).for_key(key.clone()),
                );
            }
        } else {
            chosen = Some((category, value));
        }
    }

    chosen.map(|(_, value)| value)
}

fn absence(record: &AbsenceRecord) -> Absence {
    Absence {
        situation: record.situation.clone(),
        start: record.start,
        end: record.end,
        days: record.days,
    }
}

fn merge_employee(
    key: &EmployeeKey,
    contributions: &Contributions<'_>,
    policy: &EligibilityPolicy,
    warnings: &mut Vec<RunWarning>,
) -> EngineResult<ConsolidatedEmployee> {
    let mut active = None;
    let mut terminated = None;
    let mut admission = None;
    let mut leave = None;
    let mut vacation = None;
    let mut intern = None;
    let mut apprentice = None;
    let mut abroad = None;

    for record in contributions.values() {
        match record {
            SourceRecord::Active(r) => active = Some(r),
            SourceRecord::Terminated(r) => terminated = Some(r),
            SourceRecord::Admission(r) => admission = Some(r),
            SourceRecord::Leave(r) => leave = Some(r),
            SourceRecord::Vacation(r) => vacation = Some(r),
            SourceRecord::Intern(r) => intern = Some(r),
            SourceRecord::Apprentice(r) => apprentice = Some(r),
            SourceRecord::Abroad(r) => abroad = Some(r),
            SourceRecord::UnionValue(_)
            | SourceRecord::UnionCalendar(_)
            | SourceRecord::MonthConfig(_) => {}
        }
    }

    let union_code = carry(
        key,
        "union",
        vec![
            (SourceCategory::Active, active.and_then(|r| r.union_code.clone())),
            (SourceCategory::Terminated, terminated.and_then(|r| r.union_code.clone())),
            (SourceCategory::Admission, admission.and_then(|r| r.union_code.clone())),
            (SourceCategory::Abroad, abroad.and_then(|r| r.union_code.clone())),
        ],
        warnings,
    );
    let position = carry(
        key,
        "position",
        vec![
            (SourceCategory::Active, active.and_then(|r| r.position.clone())),
            (SourceCategory::Admission, admission.and_then(|r| r.position.clone())),
            (SourceCategory::Intern, intern.and_then(|r| r.position.clone())),
            (SourceCategory::Apprentice, apprentice.and_then(|r| r.position.clone())),
        ],
        warnings,
    );
    let name = carry(
        key,
        "name",
        vec![
            (SourceCategory::Active, active.and_then(|r| r.name.clone())),
            (SourceCategory::Admission, admission.and_then(|r| r.name.clone())),
        ],
        warnings,
    );
    // The admissions source is authoritative for the admission date.
    let admission_date = carry(
        key,
        "admission date",
        vec![
            (SourceCategory::Admission, admission.map(|r| r.admission_date)),
            (SourceCategory::Active, active.and_then(|r| r.admission_date)),
        ],
        warnings,
    );

    let sources: BTreeSet<SourceCategory> = contributions.keys().copied().collect();
    let position_excluded = position
        .as_deref()
        .is_some_and(|p| policy.matching_position(p).is_some());

    let leave = match leave {
        Some(record) => Some(absence(record)),
        None => active
            .and_then(|r| r.situation.as_deref())
            .and_then(roster_leave),
    };
    let mut asserted = sources.clone();
    if leave.is_some() {
        asserted.insert(SourceCategory::Leave);
    }

    let status = resolve_status(&asserted, position_excluded).ok_or_else(|| {
        EngineError::UnresolvedStatusError {
            key: key.to_string(),
            message: "no source asserts a status".to_string(),
        }
    })?;

    let employee = ConsolidatedEmployee {
        key: key.clone(),
        status,
        name,
        document_id: active.and_then(|r| r.document_id.clone()),
        company: active.and_then(|r| r.company.clone()),
        position,
        union_code,
        admission_date,
        termination_date: terminated.map(|r| r.termination_date),
        vacation: vacation.map(absence),
        leave,
        sources,
    };

    let includable = employee.on_roster()
        && !employee.status.is_excluded()
        && !policy.excludes_abroad(&employee);
    if includable && employee.union_code.is_none() {
        return Err(EngineError::UnresolvedStatusError {
            key: key.to_string(),
            message: "no source asserts a union code".to_string(),
        });
    }

    debug!(key = %key, status = %employee.status, "Resolved employee status");
    Ok(employee)
}
