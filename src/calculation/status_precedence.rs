//! Status resolution by precedence.
//!
//! An employee may appear in several sources at once (active and terminated,
//! on vacation and abroad). Each contributing category asserts a candidate
//! status and the highest-precedence candidate wins; see
//! [`EmployeeStatus::precedence`].

use std::collections::BTreeSet;

use crate::models::{EmployeeStatus, SourceCategory};

/// Returns the status a category asserts, if it asserts one.
///
/// Reference-table categories assert nothing.
pub fn status_for_category(category: SourceCategory) -> Option<EmployeeStatus> {
    match category {
        SourceCategory::Active => Some(EmployeeStatus::Active),
        SourceCategory::Admission => Some(EmployeeStatus::Admitted),
        SourceCategory::Terminated => Some(EmployeeStatus::Terminated),
        SourceCategory::Leave => Some(EmployeeStatus::OnLeave),
        SourceCategory::Vacation => Some(EmployeeStatus::OnVacation),
        SourceCategory::Abroad => Some(EmployeeStatus::Abroad),
        SourceCategory::Intern => Some(EmployeeStatus::ExcludedIntern),
        SourceCategory::Apprentice => Some(EmployeeStatus::ExcludedApprentice),
        SourceCategory::UnionValue | SourceCategory::UnionCalendar | SourceCategory::MonthConfig => {
            None
        }
    }
}

/// Resolves the single authoritative status of an employee.
///
/// # Arguments
///
/// * `categories` - Every category that mentions the employee
/// * `position_excluded` - Whether the employee's position matches an excluded title
///
/// # Returns
///
/// The highest-precedence status asserted, or `None` when no category asserts
/// one and the position is not excluded.
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
/// use vr_engine::calculation::resolve_status;
/// use vr_engine::models::{EmployeeStatus, SourceCategory};
///
/// let categories = BTreeSet::from([SourceCategory::Active, SourceCategory::Terminated]);
/// assert_eq!(resolve_status(&categories, false), Some(EmployeeStatus::Terminated));
/// assert_eq!(resolve_status(&categories, true), Some(EmployeeStatus::ExcludedPosition));
/// ```
pub fn resolve_status(
    categories: &BTreeSet<SourceCategory>,
    position_excluded: bool,
) -> Option<EmployeeStatus> {
    categories
        .iter()
        .filter_map(|category| status_for_category(*category))
        .chain(position_excluded.then_some(EmployeeStatus::ExcludedPosition))
        .max_by_key(|status| status.precedence())
}
