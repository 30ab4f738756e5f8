//! Integration tests for the VR/VA Benefit Engine.
//!
//! This test suite runs the whole engine over the fixture sources in
//! `tests/fixtures/input` (May 2025, two unions) and covers:
//! - Full-month, admission and termination proration
//! - The termination cutoff rule
//! - Dated and undated vacation, open leave
//! - Intern, apprentice, excluded-position and abroad exclusions
//! - Report and summary output
//! - Error cases

use std::fs;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use tempfile::TempDir;

use vr_engine::config::{ConfigLoader, MonthSettings, RunConfig};
use vr_engine::error::EngineError;
use vr_engine::io::{read_sources, write_outputs};
use vr_engine::models::{ExclusionReason, ProcessingMonth, ReportRow, SourceCategory};
use vr_engine::normalize::RawTable;
use vr_engine::pipeline::{self, RunOutput};

// =============================================================================
// Test Helpers
// =============================================================================

const FIXTURE_CONFIG: &str = "tests/fixtures/vr.yaml";

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn fixture_config() -> RunConfig {
    ConfigLoader::load(FIXTURE_CONFIG)
        .expect("Failed to load fixture config")
        .into_config()
}

fn run_fixture() -> RunOutput {
    let config = fixture_config();
    let tables = read_sources(&config).expect("Failed to read fixture sources");
    pipeline::run(&tables, &config, &MonthSettings::default()).expect("Run failed")
}

fn row<'a>(output: &'a RunOutput, key: &str) -> &'a ReportRow {
    output
        .rows
        .iter()
        .find(|r| r.key.as_str() == key)
        .unwrap_or_else(|| panic!("no report row for {key}"))
}

fn assert_row(output: &RunOutput, key: &str, days: u32, total: &str, company: &str, employee: &str) {
    let row = row(output, key);
    assert_eq!(row.payable_days, days, "payable days of {key}");
    assert_eq!(row.total_value, decimal(total), "total of {key}");
    assert_eq!(row.employer_share, decimal(company), "company share of {key}");
    assert_eq!(row.employee_share, decimal(employee), "employee share of {key}");
}

fn copy_fixtures_except(dir: &Path, skip: &str) {
    for entry in fs::read_dir("tests/fixtures/input").unwrap() {
        let entry = entry.unwrap();
        if entry.file_name() != skip {
            fs::copy(entry.path(), dir.join(entry.file_name())).unwrap();
        }
    }
}

// =============================================================================
// Full Run
// =============================================================================

#[test]
fn test_month_comes_from_month_source() {
    let output = run_fixture();
    assert_eq!(output.config.processing_month, ProcessingMonth::new(2025, 5));
    assert_eq!(output.summary.processing_month.to_string(), "05/2025");
}

#[test]
fn test_report_rows_in_key_order() {
    let output = run_fixture();
    let keys: Vec<&str> = output.rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["24401", "28100", "28200", "29000", "29500", "32104", "34941", "36000"]
    );
}

#[test]
fn test_full_month_standard_split() {
    let output = run_fixture();
    assert_row(&output, "34941", 22, "770.00", "616.00", "154.00");
    assert_eq!(row(&output, "34941").observations, "CÁLCULO NORMAL");
    assert_eq!(row(&output, "34941").union_code, "SINDPD SP");
}

#[test]
fn test_union_specific_calendar_and_value() {
    let output = run_fixture();
    assert_row(&output, "32104", 21, "630.00", "504.00", "126.00");
    assert_eq!(row(&output, "32104").daily_value, decimal("30.00"));
}

#[test]
fn test_termination_before_cutoff_is_zero() {
    let output = run_fixture();
    assert_row(&output, "28100", 0, "0", "0", "0");
    assert!(row(&output, "28100").observations.contains("DESLIGADO EM 10/05/2025"));
}

#[test]
fn test_termination_after_cutoff_prorates() {
    let output = run_fixture();
    assert_row(&output, "28200", 14, "490.00", "392.00", "98.00");
}

#[test]
fn test_mid_month_admission() {
    let output = run_fixture();
    assert_row(&output, "36000", 10, "350.00", "280.00", "70.00");
    let row = row(&output, "36000");
    assert_eq!(row.observations, "ADMISSÃO EM 19/05/2025");
    assert_eq!(row.to_record()[1], "19/05/2025");
}

#[test]
fn test_dated_vacation() {
    let output = run_fixture();
    assert_row(&output, "29000", 17, "595.00", "476.00", "119.00");
}

#[test]
fn test_undated_vacation() {
    let output = run_fixture();
    assert_row(&output, "24401", 12, "420.00", "336.00", "84.00");
}

#[test]
fn test_open_leave_reports_zero() {
    let output = run_fixture();
    assert_row(&output, "29500", 0, "0", "0", "0");
}

#[test]
fn test_union_values_keyed_by_state() {
    let output = run_fixture();
    assert_eq!(row(&output, "34941").daily_value, decimal("35.00"));
    assert_eq!(row(&output, "32104").daily_value, decimal("30.00"));

    let unknown: Vec<&str> = output
        .summary
        .warnings
        .iter()
        .filter(|w| w.code == "unknown_state")
        .map(|w| w.message.as_str())
        .collect();
    assert_eq!(unknown.len(), 1);
    assert!(unknown[0].contains("Bahia"));
}

#[test]
fn test_roster_situation_leave_without_leave_source() {
    let dir = TempDir::new().unwrap();
    copy_fixtures_except(dir.path(), "AFASTAMENTOS.csv");
    let config = RunConfig {
        input_directory: dir.path().to_path_buf(),
        ..fixture_config()
    };

    let tables = read_sources(&config).unwrap();
    let output = pipeline::run(&tables, &config, &MonthSettings::default()).unwrap();
    // 29500 is "Auxílio Doença" on the roster only.
    assert_row(&output, "29500", 0, "0", "0", "0");
    assert!(row(&output, "29500").observations.contains("AFASTAMENTO SEM PERÍODO"));
}

#[test]
fn test_exclusions() {
    let output = run_fixture();
    let summary = &output.summary;

    let excluded: Vec<(&str, ExclusionReason)> = summary
        .exclusions
        .iter()
        .map(|e| (e.key.as_str(), e.reason))
        .collect();
    assert_eq!(
        excluded,
        vec![
            ("31000", ExclusionReason::Abroad),
            ("33333", ExclusionReason::Intern),
            ("34000", ExclusionReason::Apprentice),
            ("35741", ExclusionReason::ExcludedPosition),
        ]
    );

    for key in ["31000", "33333", "34000", "35741"] {
        assert!(output.rows.iter().all(|r| r.key.as_str() != key));
    }
}

#[test]
fn test_summary_counts_and_totals() {
    let output = run_fixture();
    let summary = &output.summary;

    assert_eq!(summary.counts.employees_seen, 12);
    assert_eq!(summary.counts.included, 8);
    assert_eq!(summary.counts.excluded, 4);
    assert_eq!(summary.counts.reported, 8);
    assert_eq!(summary.counts.zero_day_rows, 2);

    assert_eq!(summary.totals.total_value, decimal("3255.00"));
    assert_eq!(summary.totals.employer_share, decimal("2604.00"));
    assert_eq!(summary.totals.employee_share, decimal("651.00"));

    assert_eq!(summary.unions["SINDPD SP"].employees, 6);
    assert_eq!(summary.unions["SITEPD PR"].employees, 2);
    assert_eq!(summary.unions["SITEPD PR"].totals.total_value, decimal("630.00"));
}

#[test]
fn test_every_row_balances() {
    let output = run_fixture();
    for row in &output.rows {
        assert_eq!(row.employer_share + row.employee_share, row.total_value);
        assert_eq!(
            Decimal::from(row.payable_days) * row.daily_value,
            row.total_value
        );
    }
    assert!(output.results.iter().all(|r| r.is_balanced()));
}

// =============================================================================
// Output
// =============================================================================

#[test]
fn test_written_report_round_trips_through_csv() {
    let output = run_fixture();
    let dir = TempDir::new().unwrap();
    let mut config = output.config.output.clone();
    config.directory = dir.path().to_path_buf();
    config.audit_trail = true;

    let written = write_outputs(&output.rows, &output.summary, &output.results, &config).unwrap();

    let bytes = fs::read(&written.report).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(headers[0], "Matricula");
    assert_eq!(headers[9], "OBS GERAL");

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 8);
    let first = &records[0];
    assert_eq!(&first[0], "24401");
    assert_eq!(&first[3], "01/05/2025");
    assert_eq!(&first[4], "12");
    assert_eq!(&first[6], "420.00");

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&written.summary).unwrap()).unwrap();
    assert_eq!(summary["counts"]["reported"], 8);
    assert_eq!(summary["totals"]["total_value"], "3255.00");

    let audit: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(written.audit.unwrap()).unwrap()).unwrap();
    assert_eq!(audit.as_array().unwrap().len(), 8);
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn test_month_override_without_calendar_fails() {
    let config = fixture_config();
    let tables = read_sources(&config).unwrap();
    let overrides = MonthSettings::for_month(ProcessingMonth::new(2025, 6).unwrap());

    match pipeline::run(&tables, &config, &overrides) {
        Err(EngineError::CalendarGapError { union, month }) => {
            assert_eq!(union, "SINDPD SP");
            assert_eq!(month, "06/2025");
        }
        other => panic!("expected CalendarGapError, got {:?}", other.map(|o| o.rows)),
    }
}

#[test]
fn test_missing_required_calendar_source() {
    let dir = TempDir::new().unwrap();
    copy_fixtures_except(dir.path(), "DIAS_UTEIS.csv");
    let config = RunConfig {
        input_directory: dir.path().to_path_buf(),
        ..fixture_config()
    };

    let err = read_sources(&config).unwrap_err();
    assert!(matches!(
        err,
        EngineError::SourceNotFound {
            category: SourceCategory::UnionCalendar,
            ..
        }
    ));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_missing_optional_source_is_skipped() {
    let dir = TempDir::new().unwrap();
    copy_fixtures_except(dir.path(), "EXTERIOR.csv");
    let config = RunConfig {
        input_directory: dir.path().to_path_buf(),
        ..fixture_config()
    };

    let tables = read_sources(&config).unwrap();
    let output = pipeline::run(&tables, &config, &MonthSettings::default()).unwrap();
    // Without the abroad list 31000 is an ordinary active employee.
    assert_row(&output, "31000", 21, "630.00", "504.00", "126.00");
}

#[test]
fn test_conflicting_active_records() {
    let config = RunConfig {
        processing_month: ProcessingMonth::new(2025, 5),
        ..RunConfig::default()
    };
    let tables = vec![
        RawTable::from_rows(
            SourceCategory::Active,
            &["MATRICULA", "Sindicato"],
            &[&["34941", "SINDPD SP"], &["34941", "SITEPD PR"]],
        ),
        RawTable::from_rows(
            SourceCategory::UnionValue,
            &["Sindicato", "VALOR"],
            &[&["SINDPD SP", "35,00"]],
        ),
        RawTable::from_rows(
            SourceCategory::UnionCalendar,
            &["Sindicato", "DATA"],
            &[&["SINDPD SP", "02/05/2025"]],
        ),
    ];

    match pipeline::run(&tables, &config, &MonthSettings::default()) {
        Err(EngineError::KeyConflictError { category, key }) => {
            assert_eq!(category, SourceCategory::Active);
            assert_eq!(key, "34941");
        }
        other => panic!("expected KeyConflictError, got {:?}", other.map(|o| o.rows)),
    }
}

#[test]
fn test_missing_config_file() {
    match ConfigLoader::load("tests/fixtures/missing.yaml") {
        Err(err @ EngineError::ConfigNotFound { .. }) => assert_eq!(err.exit_code(), 2),
        other => panic!("expected ConfigNotFound, got {:?}", other),
    }
}
