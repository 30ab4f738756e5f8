//! Benefit value and cost split.
//!
//! The total is `payable_days * daily_value`. The company share is rounded to
//! cents half-up and the employee share is the exact complement, so the two
//! always add back to the total.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::AuditStep;

/// Rounds a monetary amount to two places, midpoint away from zero.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use vr_engine::calculation::round_money;
///
/// assert_eq!(round_money(Decimal::new(12345, 3)), Decimal::new(1235, 2));
/// assert_eq!(round_money(Decimal::new(12344, 3)), Decimal::new(1234, 2));
/// ```
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// The result of splitting one employee's benefit.
#[derive(Debug, Clone)]
pub struct BenefitSplitResult {
    /// `payable_days * daily_value`.
    pub total_value: Decimal,
    /// The company cost.
    pub employer_share: Decimal,
    /// The employee discount.
    pub employee_share: Decimal,
    /// The audit step recording the split.
    pub audit_step: AuditStep,
}

/// Calculates the total benefit and splits it between company and employee.
///
/// # Arguments
///
/// * `payable_days` - Working days the benefit is paid for
/// * `daily_value` - Daily benefit value of the employee's union
/// * `company_percentage` - Fraction funded by the company, in `[0, 1]`
/// * `step_number` - The step number for the audit trail
///
/// # Returns
///
/// A [`BenefitSplitResult`]. Zero payable days yield zero in every field.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use vr_engine::calculation::calculate_benefit_split;
///
/// let result = calculate_benefit_split(22, Decimal::new(3500, 2), Decimal::new(80, 2), 1);
/// assert_eq!(result.total_value, Decimal::new(77000, 2));
/// assert_eq!(result.employer_share, Decimal::new(61600, 2));
/// assert_eq!(result.employee_share, Decimal::new(15400, 2));
/// ```
pub fn calculate_benefit_split(
    payable_days: u32,
    daily_value: Decimal,
    company_percentage: Decimal,
    step_number: u32,
) -> BenefitSplitResult {
    let total_value = round_money(Decimal::from(payable_days) * daily_value);
    let employer_share = round_money(total_value * company_percentage);
    let employee_share = total_value - employer_share;

    let audit_step = AuditStep {
        step_number,
        rule_id: "benefit_split".to_string(),
        rule_name: "Benefit Split".to_string(),
        input: serde_json::json!({
            "payable_days": payable_days,
            "daily_value": daily_value.to_string(),
            "company_percentage": company_percentage.to_string()
        }),
        output: serde_json::json!({
            "total_value": total_value.to_string(),
            "employer_share": employer_share.to_string(),
            "employee_share": employee_share.to_string()
        }),
        reasoning: format!(
            "{} days × R${} = R${}; company {} = R${}, employee R${}",
            payable_days, daily_value, total_value, company_percentage, employer_share, employee_share
        ),
    };

    BenefitSplitResult {
        total_value,
        employer_share,
        employee_share,
        audit_step,
    }
}
