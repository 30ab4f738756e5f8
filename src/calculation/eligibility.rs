//! Eligibility filtering.
//!
//! Splits consolidated employees into those who receive the benefit and those
//! who do not, with the reason. Evaluated only from the resolved status and
//! the consolidated attributes.

use tracing::debug;

use crate::config::RunConfig;
use crate::models::{
    ConsolidatedEmployee, EmployeeStatus, Exclusion, ExclusionReason, SourceCategory,
};

/// Who is left out besides interns, apprentices and excluded positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityPolicy {
    /// Uppercased position titles matched as substrings.
    pub excluded_positions: Vec<String>,
    /// Whether employees listed as working abroad are excluded.
    pub exclude_abroad: bool,
}

impl EligibilityPolicy {
    /// Builds the policy from the effective run configuration.
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            excluded_positions: config
                .excluded_positions
                .iter()
                .map(|title| title.trim().to_uppercase())
                .filter(|title| !title.is_empty())
                .collect(),
            exclude_abroad: config.exclude_abroad,
        }
    }

    /// Returns the excluded title contained in `position`, if any (case-insensitive).
    ///
    /// # Example
    ///
    /// ```
    /// use vr_engine::calculation::EligibilityPolicy;
    /// use vr_engine::config::RunConfig;
    ///
    /// let policy = EligibilityPolicy::from_config(&RunConfig::default());
    /// assert_eq!(policy.matching_position("Diretor Comercial"), Some("DIRETOR"));
    /// assert_eq!(policy.matching_position("Analista"), None);
    /// ```
    pub fn matching_position(&self, position: &str) -> Option<&str> {
        let position = position.to_uppercase();
        self.excluded_positions
            .iter()
            .find(|title| position.contains(title.as_str()))
            .map(String::as_str)
    }

    /// Returns true when the employee is left out for working abroad.
    pub fn excludes_abroad(&self, employee: &ConsolidatedEmployee) -> bool {
        self.exclude_abroad && employee.sources.contains(&SourceCategory::Abroad)
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::from_config(&RunConfig::default())
    }
}

/// The outcome of the eligibility filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EligibilityOutcome {
    /// Employees who receive the benefit, in key order.
    pub included: Vec<ConsolidatedEmployee>,
    /// Employees left out, in key order.
    pub excluded: Vec<Exclusion>,
}

/// Returns why an employee must not receive the benefit, if so.
///
/// Checked in order: intern, apprentice, excluded position, abroad (when the
/// policy excludes it), not on the roster.
pub fn exclusion_reason(
    employee: &ConsolidatedEmployee,
    policy: &EligibilityPolicy,
) -> Option<ExclusionReason> {
    match employee.status {
        EmployeeStatus::ExcludedIntern => Some(ExclusionReason::Intern),
        EmployeeStatus::ExcludedApprentice => Some(ExclusionReason::Apprentice),
        EmployeeStatus::ExcludedPosition => Some(ExclusionReason::ExcludedPosition),
        _ if policy.excludes_abroad(employee) => Some(ExclusionReason::Abroad),
        _ if !employee.on_roster() => Some(ExclusionReason::MissingMandatoryData),
        _ => None,
    }
}

fn exclusion_detail(
    employee: &ConsolidatedEmployee,
    reason: ExclusionReason,
    policy: &EligibilityPolicy,
) -> Option<String> {
    match reason {
        ExclusionReason::ExcludedPosition => employee.position.as_deref().map(|position| {
            match policy.matching_position(position) {
                Some(title) => format!("position '{position}' matches '{title}'"),
                None => format!("position '{position}'"),
            }
        }),
        ExclusionReason::MissingMandatoryData => {
            let sources: Vec<&str> = employee.sources.iter().map(|c| c.as_str()).collect();
            Some(format!("not on the roster; only in {}", sources.join(", ")))
        }
        _ => None,
    }
}

/// Partitions consolidated employees into included and excluded.
///
/// # Arguments
///
/// * `employees` - Consolidated employees, in key order
/// * `policy` - The eligibility policy
///
/// # Returns
///
/// An [`EligibilityOutcome`] preserving the input order in both lists.
pub fn filter_eligible<I>(employees: I, policy: &EligibilityPolicy) -> EligibilityOutcome
where
    I: IntoIterator<Item = ConsolidatedEmployee>,
{
    let mut outcome = EligibilityOutcome::default();

    for employee in employees {
        match exclusion_reason(&employee, policy) {
            Some(reason) => {
                debug!(key = %employee.key, reason = ?reason, "Employee excluded");
                outcome.excluded.push(Exclusion {
                    detail: exclusion_detail(&employee, reason, policy),
                    key: employee.key,
                    reason,
                    status: employee.status,
                });
            }
            None => outcome.included.push(employee),
        }
    }

    outcome
}
