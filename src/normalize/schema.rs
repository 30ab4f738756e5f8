//! Column schemas of the source categories.
//!
//! Each category declares the canonical fields it reads and which of them are
//! mandatory. Headers are matched after folding, so `Data Demissão`,
//! `DATA_DEMISSAO` and `data demissao` all resolve to the same field.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::models::SourceCategory;

/// A canonical field of a source row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Registration identifier.
    Key,
    /// Employee name.
    Name,
    /// Document id (CPF).
    DocumentId,
    /// Employing company.
    Company,
    /// Position title.
    Position,
    /// Union code or name.
    Union,
    /// Brazilian state name, keying union values by state.
    State,
    /// Free-text situation.
    Situation,
    /// Admission date.
    AdmissionDate,
    /// Termination date.
    TerminationDate,
    /// Absence start date.
    StartDate,
    /// Absence end date.
    EndDate,
    /// Absence day count.
    Days,
    /// Daily benefit value.
    DailyValue,
    /// Working day of a union calendar.
    CalendarDate,
    /// Month configuration parameter name.
    Parameter,
    /// Month configuration parameter value.
    SettingValue,
}

impl Field {
    /// Returns the name reported in schema and format errors.
    pub fn canonical_name(self) -> &'static str {
        self.aliases()[0]
    }

    /// Returns the folded header names accepted for this field, preferred first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Key => &["MATRICULA", "CADASTRO", "MAT"],
            Field::Name => &["NOME", "NOME COLABORADOR", "COLABORADOR"],
            Field::DocumentId => &["CPF", "DOCUMENTO"],
            Field::Company => &["EMPRESA"],
            Field::Position => &["TITULO DO CARGO", "CARGO", "FUNCAO"],
            Field::Union => &["SINDICATO", "SINDICADO", "SINDICATO DO COLABORADOR"],
            Field::State => &["ESTADO", "UF"],
            Field::Situation => &["DESC SITUACAO", "SITUACAO", "DESCRICAO SITUACAO"],
            Field::AdmissionDate => &["ADMISSAO", "DATA ADMISSAO", "DATA DE ADMISSAO"],
            Field::TerminationDate => &[
                "DATA DEMISSAO",
                "DATA DE DEMISSAO",
                "DEMISSAO",
                "DATA DESLIGAMENTO",
            ],
            Field::StartDate => &[
                "DATA INICIO",
                "INICIO",
                "DATA INICIAL",
                "INICIO AFASTAMENTO",
                "INICIO FERIAS",
            ],
            Field::EndDate => &[
                "DATA FIM",
                "FIM",
                "DATA FINAL",
                "FIM AFASTAMENTO",
                "FIM FERIAS",
            ],
            Field::Days => &[
                "DIAS",
                "DIAS DE FERIAS",
                "DIAS FERIAS",
                "DIAS DE AFASTAMENTO",
                "DIAS AFASTAMENTO",
                "QTD DIAS",
            ],
            Field::DailyValue => &["VALOR", "VALOR DIARIO", "VALOR DIA", "VALOR DIARIO VR"],
            Field::CalendarDate => &["DATA", "DIA UTIL", "DATA UTIL"],
            Field::Parameter => &["PARAMETRO", "CHAVE"],
            Field::SettingValue => &["VALOR"],
        }
    }
}

/// A field read by a category, and whether it must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// The field.
    pub field: Field,
    /// Whether the column must exist and the cell must hold a value.
    pub required: bool,
}

const fn required(field: Field) -> FieldSpec {
    FieldSpec {
        field,
        required: true,
    }
}

const fn optional(field: Field) -> FieldSpec {
    FieldSpec {
        field,
        required: false,
    }
}

const ACTIVE_FIELDS: &[FieldSpec] = &[
    required(Field::Key),
    optional(Field::Name),
    optional(Field::DocumentId),
    optional(Field::Company),
    optional(Field::Position),
    optional(Field::Union),
    optional(Field::Situation),
    optional(Field::AdmissionDate),
];

const TERMINATED_FIELDS: &[FieldSpec] = &[
    required(Field::Key),
    required(Field::TerminationDate),
    optional(Field::Union),
];

const ADMISSION_FIELDS: &[FieldSpec] = &[
    required(Field::Key),
    required(Field::AdmissionDate),
    optional(Field::Position),
    optional(Field::Union),
    optional(Field::Name),
];

const LEAVE_FIELDS: &[FieldSpec] = &[
    required(Field::Key),
    optional(Field::Situation),
    optional(Field::StartDate),
    optional(Field::EndDate),
    optional(Field::Days),
];

const VACATION_FIELDS: &[FieldSpec] = &[
    required(Field::Key),
    optional(Field::Days),
    optional(Field::StartDate),
    optional(Field::EndDate),
];

const ROSTER_LIST_FIELDS: &[FieldSpec] = &[required(Field::Key), optional(Field::Position)];

const ABROAD_FIELDS: &[FieldSpec] = &[required(Field::Key), optional(Field::Union)];

// Keyed by union or by state; `ColumnMap::resolve` requires one of the two.
const UNION_VALUE_FIELDS: &[FieldSpec] = &[
    optional(Field::Union),
    optional(Field::State),
    required(Field::DailyValue),
];

const UNION_CALENDAR_FIELDS: &[FieldSpec] =
    &[required(Field::Union), required(Field::CalendarDate)];

const MONTH_CONFIG_FIELDS: &[FieldSpec] =
    &[required(Field::Parameter), required(Field::SettingValue)];

/// Returns the fields a category reads.
pub fn fields_for(category: SourceCategory) -> &'static [FieldSpec] {
    match category {
        SourceCategory::Active => ACTIVE_FIELDS,
        SourceCategory::Terminated => TERMINATED_FIELDS,
        SourceCategory::Admission => ADMISSION_FIELDS,
        SourceCategory::Leave => LEAVE_FIELDS,
        SourceCategory::Vacation => VACATION_FIELDS,
        SourceCategory::Intern | SourceCategory::Apprentice => ROSTER_LIST_FIELDS,
        SourceCategory::Abroad => ABROAD_FIELDS,
        SourceCategory::UnionValue => UNION_VALUE_FIELDS,
        SourceCategory::UnionCalendar => UNION_CALENDAR_FIELDS,
        SourceCategory::MonthConfig => MONTH_CONFIG_FIELDS,
    }
}

/// Folds a header or parameter name for matching.
///
/// Strips a byte order mark, uppercases, removes Portuguese accents, treats
/// `_` and `.` as spaces and collapses whitespace.
///
/// # Example
///
/// ```
/// use vr_engine::normalize::fold_header;
///
/// assert_eq!(fold_header("\u{feff} Data_Demissão "), "DATA DEMISSAO");
/// assert_eq!(fold_header("DESC. SITUACAO"), "DESC SITUACAO");
/// ```
pub fn fold_header(name: &str) -> String {
    let name = name.trim().trim_start_matches('\u{feff}');
    let folded: String = name
        .to_uppercase()
        .chars()
        .map(|c| match c {
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'Ç' => 'C',
            '_' | '.' => ' ',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Column positions of the fields a category reads, resolved against a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    columns: HashMap<Field, usize>,
}

impl ColumnMap {
    /// Resolves the columns of `category` in `headers`.
    ///
    /// For each field the first alias present wins; when a header repeats,
    /// the leftmost column is used.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SchemaError`] naming the first mandatory field
    /// with no matching column.
    pub fn resolve(category: SourceCategory, headers: &[String]) -> EngineResult<Self> {
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            by_name.entry(fold_header(header)).or_insert(idx);
        }

        let mut columns = HashMap::new();
        for spec in fields_for(category) {
            let found = spec
                .field
                .aliases()
                .iter()
                .find_map(|alias| by_name.get(*alias).copied());

            match found {
                Some(idx) => {
                    columns.insert(spec.field, idx);
                }
                None if spec.required => {
                    return Err(EngineError::SchemaError {
                        category,
                        column: spec.field.canonical_name().to_string(),
                    });
                }
                None => {}
            }
        }

        if category == SourceCategory::UnionValue
            && !columns.contains_key(&Field::Union)
            && !columns.contains_key(&Field::State)
        {
            return Err(EngineError::SchemaError {
                category,
                column: Field::Union.canonical_name().to_string(),
            });
        }

        Ok(Self { columns })
    }

    /// Returns the column index of a field, if the table has it.
    pub fn index(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }
}
