//! Calculation result models for the VR/VA Benefit Engine.
//!
//! This module contains the [`CalculationResult`] produced for every included
//! employee and the [`AuditStep`] trail recording each rule applied to it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::EmployeeKey;

/// A single step in the audit trail.
///
/// Each step records one rule applied during calculation, including
/// the inputs, outputs, and reasoning.
///
/// # Example
///
/// ```
/// use vr_engine::models::AuditStep;
/// use serde_json::json;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "admission_proration".to_string(),
///     rule_name: "Admission Proration".to_string(),
///     input: json!({"admission_date": "2025-05-12"}),
///     output: json!({"interval_start": "2025-05-12"}),
///     reasoning: "Admitted within the month; interval starts at admission".to_string(),
/// };
/// assert_eq!(step.step_number, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The benefit computed for one included employee.
///
/// Invariants: `employer_share + employee_share == total_value` and
/// `total_value == payable_days * daily_value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// The employee key.
    pub key: EmployeeKey,
    /// The union the calendar and value came from.
    pub union_code: String,
    /// Working days the benefit is paid for.
    pub payable_days: u32,
    /// Daily benefit value of the union.
    pub daily_value: Decimal,
    /// `payable_days * daily_value`.
    pub total_value: Decimal,
    /// Portion funded by the company.
    pub employer_share: Decimal,
    /// Portion discounted from the employee.
    pub employee_share: Decimal,
    /// Short notes on the rules that changed the result, for `OBS GERAL`.
    pub notes: Vec<String>,
    /// Every rule applied, in order.
    pub audit_steps: Vec<AuditStep>,
}

impl CalculationResult {
    /// Returns true when the monetary invariants hold exactly.
    pub fn is_balanced(&self) -> bool {
        self.employer_share + self.employee_share == self.total_value
            && self.total_value == Decimal::from(self.payable_days) * self.daily_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn result(days: u32, daily: &str, total: &str, employer: &str, employee: &str) -> CalculationResult {
        CalculationResult {
            key: EmployeeKey::parse("1").unwrap(),
            union_code: "SINDPD SP".to_string(),
            payable_days: days,
            daily_value: dec(daily),
            total_value: dec(total),
            employer_share: dec(employer),
            employee_share: dec(employee),
            notes: vec![],
            audit_steps: vec![],
        }
    }

    #[test]
    fn test_balanced_result() {
        assert!(result(22, "35.00", "770.00", "616.00", "154.00").is_balanced());
    }

    #[test]
    fn test_unbalanced_split_detected() {
        assert!(!result(22, "35.00", "770.00", "616.00", "154.01").is_balanced());
    }

    #[test]
    fn test_unbalanced_total_detected() {
        assert!(!result(21, "35.00", "770.00", "616.00", "154.00").is_balanced());
    }

    #[test]
    fn test_audit_step_serialization() {
        let step = AuditStep {
            step_number: 3,
            rule_id: "cutoff_void".to_string(),
            rule_name: "Termination Cutoff".to_string(),
            input: serde_json::json!({"termination_day": 10, "cutoff_day": 15}),
            output: serde_json::json!({"payable_days": 0}),
            reasoning: "Terminated on or before the cutoff day".to_string(),
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["rule_id"], "cutoff_void");
        assert_eq!(json["output"]["payable_days"], 0);
    }
}
