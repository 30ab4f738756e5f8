//! Calculation logic for the VR/VA Benefit Engine.
//!
//! This module contains the consolidation of source records into one employee
//! per key, status resolution by precedence, eligibility filtering, the
//! payable working-day calculation with the termination cutoff rule, the
//! benefit value and cost split, and final report assembly.

mod benefit_split;
mod consolidation;
mod eligibility;
mod employee_benefit;
mod reference_tables;
mod report_assembly;
mod status_precedence;
mod working_days;

pub use benefit_split::{BenefitSplitResult, calculate_benefit_split, round_money};
pub use consolidation::{Consolidation, consolidate};
pub use eligibility::{EligibilityOutcome, EligibilityPolicy, exclusion_reason, filter_eligible};
pub use employee_benefit::{CalculationContext, calculate_employee};
pub use reference_tables::{build_month_settings, build_union_calendars, build_union_values};
pub use report_assembly::{assemble_report, build_report_row};
pub use status_precedence::{resolve_status, status_for_category};
pub use working_days::{PayableDaysResult, calculate_payable_days};
