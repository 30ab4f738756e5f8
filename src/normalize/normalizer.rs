//! Raw table to canonical record conversion.
//!
//! [`normalize_table`] works on one table at a time and never looks at other
//! sources: no deduplication, no cross-referencing. Those belong to
//! consolidation.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AbroadRecord, AbsenceRecord, ActiveRecord, AdmissionRecord, CalendarDayRecord, EmployeeKey,
    ExclusionRecord, MonthSetting, ProcessingMonth, RunWarning, SourceCategory, SourceRecord,
    TerminationRecord, UnionValueKey, UnionValueRecord,
};

use super::schema::{ColumnMap, Field, fold_header};
use super::values::{
    canonical_union_code, non_blank, parse_date, parse_day_count, parse_money, parse_percentage,
};

const STAGE: &str = "normalize";

/// A source table as read from disk: header row plus data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// The declared category.
    pub category: SourceCategory,
    /// Where the table came from (file name), for logs.
    pub source_name: String,
    /// Header cells.
    pub headers: Vec<String>,
    /// Data rows; short rows are padded with blanks on read.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Creates a table from string slices, mostly for tests and benchmarks.
    pub fn from_rows(category: SourceCategory, headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            category,
            source_name: category.default_file_name().to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }
}

/// The canonical records of one table and the recoverable issues found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTable {
    /// The table category.
    pub category: SourceCategory,
    /// One record per non-blank row (month configuration rows with an unknown parameter are dropped).
    pub records: Vec<SourceRecord>,
    /// Recoverable issues.
    pub warnings: Vec<RunWarning>,
}

/// Normalizes a raw table into its category's records.
///
/// # Arguments
///
/// * `table` - The raw table and its declared category
///
/// # Returns
///
/// The canonical records, or an error if:
/// - A mandatory column is missing (`SchemaError`)
/// - A non-blank row has no registration identifier (`EmptyKey`)
/// - A mandatory date cannot be parsed (`DateFormatError`)
/// - A mandatory value cannot be parsed (`ValueFormatError`)
///
/// # Example
///
/// ```
/// use vr_engine::models::{SourceCategory, SourceRecord};
/// use vr_engine::normalize::{normalize_table, RawTable};
///
/// let table = RawTable::from_rows(
///     SourceCategory::Terminated,
///     &["MATRICULA", "DATA DEMISSÃO"],
///     &[&["34941", "10/05/2025"], &["", ""]],
/// );
/// let normalized = normalize_table(&table).unwrap();
/// assert_eq!(normalized.records.len(), 1);
/// assert!(matches!(normalized.records[0], SourceRecord::Terminated(_)));
/// ```
pub fn normalize_table(table: &RawTable) -> EngineResult<NormalizedTable> {
    let columns = ColumnMap::resolve(table.category, &table.headers)?;
    let mut records = Vec::with_capacity(table.rows.len());
    let mut warnings = Vec::new();
    let mut skipped = 0usize;

    for (idx, cells) in table.rows.iter().enumerate() {
        if cells.iter().all(|c| c.trim().is_empty()) {
            skipped += 1;
            continue;
        }

        let row = Row {
            category: table.category,
            line: idx + 2,
            cells,
            columns: &columns,
        };

        if let Some(record) = normalize_row(&row, &mut warnings)? {
            records.push(record);
        }
    }

    debug!(
        category = %table.category,
        source = %table.source_name,
        records = records.len(),
        blank_rows = skipped,
        warnings = warnings.len(),
        "Normalized source table"
    );

    Ok(NormalizedTable {
        category: table.category,
        records,
        warnings,
    })
}

/// One data row with its column map.
struct Row<'a> {
    category: SourceCategory,
    line: usize,
    cells: &'a [String],
    columns: &'a ColumnMap,
}

impl Row<'_> {
    fn raw(&self, field: Field) -> &str {
        self.columns
            .index(field)
            .and_then(|idx| self.cells.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn text(&self, field: Field) -> Option<String> {
        non_blank(self.raw(field)).map(str::to_string)
    }

    fn key(&self) -> EngineResult<EmployeeKey> {
        EmployeeKey::parse(self.raw(Field::Key)).ok_or(EngineError::EmptyKey {
            category: self.category,
            row: self.line,
        })
    }

    fn union(&self) -> Option<String> {
        canonical_union_code(self.raw(Field::Union))
    }

    fn required_union(&self) -> EngineResult<String> {
        self.union().ok_or_else(|| self.value_error(Field::Union, "missing union code"))
    }

    fn required_date(&self, field: Field) -> EngineResult<NaiveDate> {
        let raw = self.raw(field);
        parse_date(raw).ok_or_else(|| EngineError::DateFormatError {
            category: self.category,
            row: self.line,
            column: field.canonical_name().to_string(),
            value: raw.trim().to_string(),
        })
    }

    fn optional_date(&self, field: Field, warnings: &mut Vec<RunWarning>) -> Option<NaiveDate> {
        let raw = non_blank(self.raw(field))?;
        let parsed = parse_date(raw);
        if parsed.is_none() {
            self.warn(
                warnings,
                "invalid_optional_date",
                format!("ignoring unparsable {} '{}'", field.canonical_name(), raw),
            );
        }
        parsed
    }

    fn optional_days(&self, warnings: &mut Vec<RunWarning>) -> Option<u32> {
        let raw = non_blank(self.raw(Field::Days))?;
        match parse_day_count(raw) {
            Ok(days) => Some(days),
            Err(message) => {
                self.warn(
                    warnings,
                    "invalid_optional_number",
                    format!("ignoring {} '{}': {}", Field::Days.canonical_name(), raw, message),
                );
                None
            }
        }
    }

    fn value_error(&self, field: Field, message: impl Into<String>) -> EngineError {
        EngineError::ValueFormatError {
            category: self.category,
            row: self.line,
            column: field.canonical_name().to_string(),
            value: self.raw(field).trim().to_string(),
            message: message.into(),
        }
    }

    fn warn(&self, warnings: &mut Vec<RunWarning>, code: &str, message: String) {
        let message = format!(
            "{} source, row {}: {}",
            self.category, self.line, message
        );
        warn!(category = %self.category, row = self.line, code, "{}", message);

        let mut warning = RunWarning::new(STAGE, code, message);
        if let Some(key) = EmployeeKey::parse(self.raw(Field::Key)) {
            warning = warning.for_key(key);
        }
        warnings.push(warning);
    }
}

fn normalize_row(row: &Row<'_>, warnings: &mut Vec<RunWarning>) -> EngineResult<Option<SourceRecord>> {
    let record = match row.category {
        SourceCategory::Active => {
            let record = ActiveRecord {
                key: row.key()?,
                name: row.text(Field::Name),
                document_id: row.text(Field::DocumentId),
                company: row.text(Field::Company),
                position: row.text(Field::Position),
                union_code: row.union(),
                situation: row.text(Field::Situation),
                admission_date: row.optional_date(Field::AdmissionDate, warnings),
            };
            if record.union_code.is_none() {
                row.warn(
                    warnings,
                    "blank_union",
                    "roster row has no union code".to_string(),
                );
            }
            SourceRecord::Active(record)
        }
        SourceCategory::Terminated => SourceRecord::Terminated(TerminationRecord {
            key: row.key()?,
            termination_date: row.required_date(Field::TerminationDate)?,
            union_code: row.union(),
        }),
        SourceCategory::Admission => SourceRecord::Admission(AdmissionRecord {
            key: row.key()?,
            admission_date: row.required_date(Field::AdmissionDate)?,
            position: row.text(Field::Position),
            union_code: row.union(),
            name: row.text(Field::Name),
        }),
        SourceCategory::Leave => SourceRecord::Leave(absence(row, warnings)?),
        SourceCategory::Vacation => SourceRecord::Vacation(absence(row, warnings)?),
        SourceCategory::Intern => SourceRecord::Intern(ExclusionRecord {
            key: row.key()?,
            position: row.text(Field::Position),
        }),
        SourceCategory::Apprentice => SourceRecord::Apprentice(ExclusionRecord {
            key: row.key()?,
            position: row.text(Field::Position),
        }),
        SourceCategory::Abroad => SourceRecord::Abroad(AbroadRecord {
            key: row.key()?,
            union_code: row.union(),
        }),
        SourceCategory::UnionValue => {
            let key = match (row.union(), row.text(Field::State)) {
                (Some(union_code), _) => UnionValueKey::Union(union_code),
                (None, Some(state)) => UnionValueKey::State(state),
                (None, None) => return Err(row.value_error(Field::Union, "missing union code or state")),
            };
            let raw = row.raw(Field::DailyValue);
            let daily_value =
                parse_money(raw).map_err(|message| row.value_error(Field::DailyValue, message))?;
            SourceRecord::UnionValue(UnionValueRecord { key, daily_value })
        }
        SourceCategory::UnionCalendar => SourceRecord::UnionCalendar(CalendarDayRecord {
            union_code: row.required_union()?,
            date: row.required_date(Field::CalendarDate)?,
        }),
        SourceCategory::MonthConfig => match month_setting(row)? {
            Some(setting) => SourceRecord::MonthConfig(setting),
            None => {
                row.warn(
                    warnings,
                    "unknown_parameter",
                    format!("ignoring unknown parameter '{}'", row.raw(Field::Parameter).trim()),
                );
                return Ok(None);
            }
        },
    };

    Ok(Some(record))
}

fn absence(row: &Row<'_>, warnings: &mut Vec<RunWarning>) -> EngineResult<AbsenceRecord> {
    let record = AbsenceRecord {
        key: row.key()?,
        situation: row.text(Field::Situation),
        start: row.optional_date(Field::StartDate, warnings),
        end: row.optional_date(Field::EndDate, warnings),
        days: row.optional_days(warnings),
    };

    if let (Some(start), Some(end)) = (record.start, record.end) {
        if end < start {
            return Err(row.value_error(
                Field::EndDate,
                format!("absence ends before it starts ({start})"),
            ));
        }
    }

    Ok(record)
}

/// Recognized month configuration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parameter {
    ProcessingMonth,
    CutoffDay,
    CompanyPercentage,
    EmployeePercentage,
    ExcludedPosition,
}

impl Parameter {
    fn from_name(name: &str) -> Option<Self> {
        match fold_header(name).as_str() {
            "COMPETENCIA" | "MES" | "MES REFERENCIA" | "PROCESSING MONTH" => {
                Some(Parameter::ProcessingMonth)
            }
            "DIA CORTE" | "DIA DE CORTE" | "CUTOFF DAY" => Some(Parameter::CutoffDay),
            "PERCENTUAL EMPRESA" | "CUSTO EMPRESA" | "COMPANY PERCENTAGE" => {
                Some(Parameter::CompanyPercentage)
            }
            "PERCENTUAL COLABORADOR"
            | "PERCENTUAL PROFISSIONAL"
            | "DESCONTO PROFISSIONAL"
            | "EMPLOYEE PERCENTAGE" => Some(Parameter::EmployeePercentage),
            "CARGO EXCLUIDO" | "CARGOS EXCLUIDOS" | "EXCLUDED POSITION" => {
                Some(Parameter::ExcludedPosition)
            }
            _ => None,
        }
    }
}

fn month_setting(row: &Row<'_>) -> EngineResult<Option<MonthSetting>> {
    let name = row.raw(Field::Parameter);
    let Some(parameter) = Parameter::from_name(name) else {
        return Ok(None);
    };

    let raw = row.raw(Field::SettingValue).trim();
    if raw.is_empty() {
        return Err(row.value_error(Field::SettingValue, "missing parameter value"));
    }

    let setting = match parameter {
        Parameter::ProcessingMonth => {
            let month = raw
                .parse::<ProcessingMonth>()
                .ok()
                .or_else(|| parse_date(raw).map(ProcessingMonth::of))
                .ok_or_else(|| row.value_error(Field::SettingValue, "not a month"))?;
            MonthSetting::ProcessingMonth(month)
        }
        Parameter::CutoffDay => MonthSetting::CutoffDay(
            parse_day_count(raw).map_err(|m| row.value_error(Field::SettingValue, m))?,
        ),
        Parameter::CompanyPercentage => MonthSetting::CompanyPercentage(
            parse_percentage(raw).map_err(|m| row.value_error(Field::SettingValue, m))?,
        ),
        Parameter::EmployeePercentage => MonthSetting::EmployeePercentage(
            parse_percentage(raw).map_err(|m| row.value_error(Field::SettingValue, m))?,
        ),
        Parameter::ExcludedPosition => MonthSetting::ExcludedPosition(raw.to_uppercase()),
    };

    Ok(Some(setting))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_active_row_fields() {
        let table = RawTable::from_rows(
            SourceCategory::Active,
            &["MATRICULA", "EMPRESA", "TITULO DO CARGO", "DESC. SITUACAO", "Sindicato"],
            &[&[
                "34941.0",
                "1409",
                "TECH RECRUITER II",
                "Trabalhando",
                "SINDPD SP - SIND.TRAB.EM PROC DADOS",
            ]],
        );
        let normalized = normalize_table(&table).unwrap();

        match &normalized.records[0] {
            SourceRecord::Active(record) => {
                assert_eq!(record.key.as_str(), "34941");
                assert_eq!(record.company.as_deref(), Some("1409"));
                assert_eq!(record.position.as_deref(), Some("TECH RECRUITER II"));
                assert_eq!(record.situation.as_deref(), Some("Trabalhando"));
                assert_eq!(record.union_code.as_deref(), Some("SINDPD SP"));
                assert_eq!(record.name, None);
            }
            other => panic!("expected Active, got {:?}", other),
        }
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn test_blank_rows_skipped() {
        let table = RawTable::from_rows(
            SourceCategory::Intern,
            &["MATRICULA", "TITULO DO CARGO"],
            &[&["", "  "], &["1", "ESTAGIARIO"], &[" ", ""]],
        );
        let normalized = normalize_table(&table).unwrap();
        assert_eq!(normalized.records.len(), 1);
    }

    #[test]
    fn test_empty_key_reports_row() {
        let table = RawTable::from_rows(
            SourceCategory::Intern,
            &["MATRICULA", "TITULO DO CARGO"],
            &[&["1", "ESTAGIARIO"], &["", "ESTAGIARIO"]],
        );
        match normalize_table(&table) {
            Err(EngineError::EmptyKey { category, row }) => {
                assert_eq!(category, SourceCategory::Intern);
                assert_eq!(row, 3);
            }
            other => panic!("expected EmptyKey, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_mandatory_date() {
        let table = RawTable::from_rows(
            SourceCategory::Admission,
            &["MATRICULA", "Admissão"],
            &[&["1", "31/02/2025"]],
        );
        match normalize_table(&table) {
            Err(EngineError::DateFormatError { row, column, value, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "ADMISSAO");
                assert_eq!(value, "31/02/2025");
            }
            other => panic!("expected DateFormatError, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_mandatory_date_is_error() {
        let table = RawTable::from_rows(
            SourceCategory::Terminated,
            &["MATRICULA", "DATA DEMISSAO"],
            &[&["1", ""]],
        );
        assert!(matches!(
            normalize_table(&table),
            Err(EngineError::DateFormatError { .. })
        ));
    }

    #[test]
    fn test_bad_optional_date_is_warning() {
        let table = RawTable::from_rows(
            SourceCategory::Vacation,
            &["MATRICULA", "DIAS DE FÉRIAS", "DATA INICIO"],
            &[&["7", "10", "ontem"]],
        );
        let normalized = normalize_table(&table).unwrap();
        match &normalized.records[0] {
            SourceRecord::Vacation(record) => {
                assert_eq!(record.days, Some(10));
                assert_eq!(record.start, None);
            }
            other => panic!("expected Vacation, got {:?}", other),
        }
        assert_eq!(normalized.warnings.len(), 1);
        assert_eq!(normalized.warnings[0].code, "invalid_optional_date");
        assert_eq!(normalized.warnings[0].key.as_ref().unwrap().as_str(), "7");
    }

    #[test]
    fn test_absence_end_before_start() {
        let table = RawTable::from_rows(
            SourceCategory::Leave,
            &["MATRICULA", "DATA INICIO", "DATA FIM"],
            &[&["7", "20/05/2025", "10/05/2025"]],
        );
        assert!(matches!(
            normalize_table(&table),
            Err(EngineError::ValueFormatError { .. })
        ));
    }

    #[test]
    fn test_active_blank_union_warns() {
        let table = RawTable::from_rows(
            SourceCategory::Active,
            &["MATRICULA", "SINDICATO"],
            &[&["9", ""]],
        );
        let normalized = normalize_table(&table).unwrap();
        assert_eq!(normalized.records.len(), 1);
        assert_eq!(normalized.warnings[0].code, "blank_union");
    }

    #[test]
    fn test_union_value_rows() {
        let table = RawTable::from_rows(
            SourceCategory::UnionValue,
            &["SINDICATO", "VALOR"],
            &[&["SINDPD SP", "37,50"], &["sitepd pr", "R$ 35"]],
        );
        let normalized = normalize_table(&table).unwrap();
        assert_eq!(
            normalized.records,
            vec![
                SourceRecord::UnionValue(UnionValueRecord {
                    key: UnionValueKey::Union("SINDPD SP".to_string()),
                    daily_value: dec("37.50"),
                }),
                SourceRecord::UnionValue(UnionValueRecord {
                    key: UnionValueKey::Union("SITEPD PR".to_string()),
                    daily_value: dec("35.00"),
                }),
            ]
        );
    }

    #[test]
    fn test_union_value_precision_error() {
        let table = RawTable::from_rows(
            SourceCategory::UnionValue,
            &["SINDICATO", "VALOR"],
            &[&["SINDPD SP", "37.505"]],
        );
        match normalize_table(&table) {
            Err(EngineError::ValueFormatError { column, value, .. }) => {
                assert_eq!(column, "VALOR");
                assert_eq!(value, "37.505");
            }
            other => panic!("expected ValueFormatError, got {:?}", other),
        }
    }

    #[test]
    fn test_calendar_rows() {
        let table = RawTable::from_rows(
            SourceCategory::UnionCalendar,
            &["SINDICATO", "DATA"],
            &[&["SINDPD SP", "2025-05-02"], &["SINDPD SP", "05/05/2025"]],
        );
        let normalized = normalize_table(&table).unwrap();
        assert_eq!(
            normalized.records[1],
            SourceRecord::UnionCalendar(CalendarDayRecord {
                union_code: "SINDPD SP".to_string(),
                date: date(2025, 5, 5),
            })
        );
    }

    #[test]
    fn test_month_config_rows() {
        let table = RawTable::from_rows(
            SourceCategory::MonthConfig,
            &["PARAMETRO", "VALOR"],
            &[
                &["Competência", "05/2025"],
                &["Dia de corte", "15"],
                &["Percentual Empresa", "80%"],
                &["Percentual Colaborador", "0,20"],
                &["Cargo excluído", "conselheiro"],
                &["Cor favorita", "azul"],
            ],
        );
        let normalized = normalize_table(&table).unwrap();
        assert_eq!(
            normalized.records,
            vec![
                SourceRecord::MonthConfig(MonthSetting::ProcessingMonth(
                    ProcessingMonth::new(2025, 5).unwrap()
                )),
                SourceRecord::MonthConfig(MonthSetting::CutoffDay(15)),
                SourceRecord::MonthConfig(MonthSetting::CompanyPercentage(dec("0.8"))),
                SourceRecord::MonthConfig(MonthSetting::EmployeePercentage(dec("0.2"))),
                SourceRecord::MonthConfig(MonthSetting::ExcludedPosition(
                    "CONSELHEIRO".to_string()
                )),
            ]
        );
        assert_eq!(normalized.warnings.len(), 1);
        assert_eq!(normalized.warnings[0].code, "unknown_parameter");
    }

    #[test]
    fn test_month_config_bad_value() {
        let table = RawTable::from_rows(
            SourceCategory::MonthConfig,
            &["PARAMETRO", "VALOR"],
            &[&["DIA CORTE", "quinze"]],
        );
        assert!(matches!(
            normalize_table(&table),
            Err(EngineError::ValueFormatError { .. })
        ));
    }

    #[test]
    fn test_schema_error_propagates() {
        let table = RawTable::from_rows(SourceCategory::UnionValue, &["VALOR"], &[]);
        assert!(matches!(
            normalize_table(&table),
            Err(EngineError::SchemaError { .. })
        ));
    }

    #[test]
    fn test_union_value_rows_keyed_by_state() {
        let table = RawTable::from_rows(
            SourceCategory::UnionValue,
            &["ESTADO", "VALOR"],
            &[&["São Paulo", "37,50"], &["Paraná", "35,00"]],
        );
        let normalized = normalize_table(&table).unwrap();
        assert_eq!(
            normalized.records[0],
            SourceRecord::UnionValue(UnionValueRecord {
                key: UnionValueKey::State("São Paulo".to_string()),
                daily_value: dec("37.50"),
            })
        );
        assert_eq!(normalized.records.len(), 2);
    }

    #[test]
    fn test_union_value_row_without_union_or_state() {
        let table = RawTable::from_rows(
            SourceCategory::UnionValue,
            &["ESTADO", "VALOR"],
            &[&["", "37,50"]],
        );
        match normalize_table(&table) {
            Err(EngineError::ValueFormatError { column, row, .. }) => {
                assert_eq!(column, "SINDICATO");
                assert_eq!(row, 2);
            }
            other => panic!("expected ValueFormatError, got {:?}", other),
        }
    }
}
