//! Performance benchmarks for the VR/VA Benefit Engine.
//!
//! This benchmark suite measures:
//! - Payable-day calculation for a single employee
//! - A full in-memory run over synthetic sources of growing size
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use vr_engine::calculation::calculate_payable_days;
use vr_engine::config::{MonthSettings, RunConfig};
use vr_engine::models::{
    Absence, ConsolidatedEmployee, EmployeeKey, EmployeeStatus, ProcessingMonth, SourceCategory,
    UnionCalendar,
};
use vr_engine::normalize::RawTable;
use vr_engine::pipeline;

const UNIONS: [&str; 4] = ["SINDPD SP", "SITEPD PR", "SINDPPD RS", "SINDPD RJ"];

fn may() -> ProcessingMonth {
    ProcessingMonth::new(2025, 5).unwrap()
}

fn weekdays() -> Vec<NaiveDate> {
    (1..=31)
        .filter_map(|d| NaiveDate::from_ymd_opt(2025, 5, d))
        .filter(|d| d.weekday().num_days_from_monday() < 5)
        .collect()
}

/// Builds the eleven-source snapshot for `employees` synthetic employees.
///
/// Every tenth employee is terminated, every seventh on vacation and every
/// fiftieth an intern.
fn synthetic_tables(employees: usize) -> Vec<RawTable> {
    let mut active = Vec::with_capacity(employees);
    let mut terminated = Vec::new();
    let mut vacation = Vec::new();
    let mut interns = Vec::new();

    for i in 0..employees {
        let key = (10_000 + i).to_string();
        let union = UNIONS[i % UNIONS.len()].to_string();
        active.push(vec![key.clone(), "ANALISTA".to_string(), union]);
        if i % 10 == 0 {
            let day = 5 + (i / 10) % 25;
            terminated.push(vec![key.clone(), format!("{day:02}/05/2025")]);
        }
        if i % 7 == 0 {
            vacation.push(vec![key.clone(), "12/05/2025".to_string(), "23/05/2025".to_string()]);
        }
        if i % 50 == 0 {
            interns.push(vec![key]);
        }
    }

    let mut values = Vec::new();
    let mut calendar = Vec::new();
    for union in UNIONS {
        values.push(vec![union.to_string(), "37,50".to_string()]);
        for day in weekdays() {
            calendar.push(vec![union.to_string(), day.format("%d/%m/%Y").to_string()]);
        }
    }

    vec![
        table(SourceCategory::Active, &["MATRICULA", "TITULO DO CARGO", "Sindicato"], active),
        table(SourceCategory::Terminated, &["MATRICULA", "DATA DEMISSÃO"], terminated),
        table(SourceCategory::Vacation, &["MATRICULA", "DATA INICIO", "DATA FIM"], vacation),
        table(SourceCategory::Intern, &["MATRICULA"], interns),
        table(SourceCategory::UnionValue, &["Sindicato", "VALOR"], values),
        table(SourceCategory::UnionCalendar, &["Sindicato", "DATA"], calendar),
    ]
}

fn table(category: SourceCategory, headers: &[&str], rows: Vec<Vec<String>>) -> RawTable {
    RawTable {
        category,
        source_name: category.default_file_name().to_string(),
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows,
    }
}

/// Benchmark: payable days of one employee with admission and vacation.
fn bench_payable_days(c: &mut Criterion) {
    let mut calendar = UnionCalendar::new("SINDPD SP", may());
    for day in weekdays() {
        calendar.insert(day);
    }
    let employee = ConsolidatedEmployee {
        key: EmployeeKey::parse("34941").unwrap(),
        status: EmployeeStatus::OnVacation,
        name: None,
        document_id: None,
        company: None,
        position: None,
        union_code: Some("SINDPD SP".to_string()),
        admission_date: NaiveDate::from_ymd_opt(2025, 5, 6),
        termination_date: None,
        vacation: Some(Absence {
            situation: None,
            start: NaiveDate::from_ymd_opt(2025, 5, 12),
            end: NaiveDate::from_ymd_opt(2025, 5, 23),
            days: None,
        }),
        leave: None,
        sources: BTreeSet::from([SourceCategory::Active, SourceCategory::Vacation]),
    };

    c.bench_function("payable_days", |b| {
        b.iter(|| calculate_payable_days(black_box(&employee), &calendar, may(), 15, 1))
    });
}

/// Benchmark: full runs over growing rosters to understand scaling behavior.
fn bench_full_run(c: &mut Criterion) {
    let config = RunConfig {
        processing_month: Some(may()),
        ..RunConfig::default()
    };
    let overrides = MonthSettings::default();

    let mut group = c.benchmark_group("full_run");

    for employees in [100usize, 1_000, 10_000] {
        let tables = synthetic_tables(employees);
        group.throughput(Throughput::Elements(employees as u64));
        group.bench_with_input(BenchmarkId::new("employees", employees), &tables, |b, tables| {
            b.iter(|| {
                let output = pipeline::run(black_box(tables), &config, &overrides).unwrap();
                black_box(output.rows.len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_payable_days, bench_full_run);
criterion_main!(benches);
