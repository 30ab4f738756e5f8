//! Core data models for the VR/VA Benefit Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod calculation_result;
mod employee;
mod processing_month;
mod report;
mod source_record;
mod union_tables;

pub use calculation_result::{AuditStep, CalculationResult};
pub use employee::{Absence, ConsolidatedEmployee, EmployeeKey, EmployeeStatus};
pub use processing_month::ProcessingMonth;
pub use report::{
    BenefitTotals, Exclusion, ExclusionReason, NORMAL_CALCULATION_NOTE, REPORT_COLUMNS, ReportRow,
    RunCounts, RunSummary, RunWarning, UnionTotals,
};
pub use source_record::{
    AbroadRecord, AbsenceRecord, ActiveRecord, AdmissionRecord, CalendarDayRecord,
    ExclusionRecord, MonthSetting, SourceCategory, SourceRecord, TerminationRecord,
    UnionValueKey, UnionValueRecord,
};
pub use union_tables::{UnionCalendar, UnionCalendars, UnionValues};
