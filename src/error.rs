//! Error types for the VR/VA Benefit Engine.
//!
//! Every failure the engine can raise is a variant of [`EngineError`]. All of
//! them abort the run: recoverable issues (policy exclusions, blank optional
//! attributes) are reported as warnings in the run summary instead.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::SourceCategory;

/// The main error type for the VR/VA Benefit Engine.
///
/// # Example
///
/// ```
/// use vr_engine::error::EngineError;
///
/// let error = EngineError::MissingUnionValueError {
///     union: "SINDPD SP".to_string(),
/// };
/// assert_eq!(error.to_string(), "No daily benefit value for union 'SINDPD SP'");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value is out of range or malformed.
    #[error("Invalid configuration '{field}': {message}")]
    InvalidConfig {
        /// The configuration field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Company and employee percentages do not add up to exactly one.
    #[error("Company percentage {company} and employee percentage {employee} must sum to 1")]
    InvalidPercentages {
        /// The configured company percentage.
        company: Decimal,
        /// The configured employee percentage.
        employee: Decimal,
    },

    /// A required source file is absent from the input directory.
    #[error("Required {category} source not found: {path}")]
    SourceNotFound {
        /// The category of the missing source.
        category: SourceCategory,
        /// The path that was looked up.
        path: String,
    },

    /// A source file exists but could not be read.
    #[error("Failed to read source '{path}': {message}")]
    SourceReadError {
        /// The source path.
        path: String,
        /// The underlying read error.
        message: String,
    },

    /// The report or summary could not be written.
    #[error("Failed to write '{path}': {message}")]
    ReportWriteError {
        /// The destination path.
        path: String,
        /// The underlying write error.
        message: String,
    },

    /// A source table lacks a column its category requires.
    #[error("Schema error in {category} source: missing column '{column}'")]
    SchemaError {
        /// The category of the offending source.
        category: SourceCategory,
        /// The canonical name of the missing column.
        column: String,
    },

    /// A non-blank row has no registration identifier.
    #[error("Empty registration identifier in {category} source at row {row}")]
    EmptyKey {
        /// The category of the offending source.
        category: SourceCategory,
        /// The spreadsheet row number (header is row 1).
        row: usize,
    },

    /// A mandatory date could not be parsed.
    #[error("Invalid date '{value}' in {category} source, row {row}, column '{column}'")]
    DateFormatError {
        /// The category of the offending source.
        category: SourceCategory,
        /// The spreadsheet row number (header is row 1).
        row: usize,
        /// The column holding the date.
        column: String,
        /// The raw cell text.
        value: String,
    },

    /// A mandatory numeric or enumerated value could not be parsed.
    #[error("Invalid value '{value}' in {category} source, row {row}, column '{column}': {message}")]
    ValueFormatError {
        /// The category of the offending source.
        category: SourceCategory,
        /// The spreadsheet row number (header is row 1).
        row: usize,
        /// The column holding the value.
        column: String,
        /// The raw cell text.
        value: String,
        /// Why the value was rejected.
        message: String,
    },

    /// One source contributed two different claims about the same key.
    #[error("Conflicting {category} records for key '{key}'")]
    KeyConflictError {
        /// The category that contributed both records.
        category: SourceCategory,
        /// The employee key, union code or parameter name in conflict.
        key: String,
    },

    /// An includable employee could not be given a complete status.
    #[error("Unresolved status for employee '{key}': {message}")]
    UnresolvedStatusError {
        /// The employee key.
        key: String,
        /// What information is missing.
        message: String,
    },

    /// The union has no working-day calendar for the processing month.
    #[error("No working-day calendar for union '{union}' in {month}")]
    CalendarGapError {
        /// The union code.
        union: String,
        /// The processing month (MM/YYYY).
        month: String,
    },

    /// The union has no daily benefit value.
    #[error("No daily benefit value for union '{union}'")]
    MissingUnionValueError {
        /// The union code.
        union: String,
    },

    /// The assembled report holds two rows for one key.
    #[error("Duplicate report row for employee '{key}'")]
    DuplicateKeyError {
        /// The duplicated employee key.
        key: String,
    },
}

impl EngineError {
    /// Returns the process exit code for this error.
    ///
    /// `1` for data and consistency errors, `2` for configuration errors,
    /// `3` for missing sources and `4` for I/O failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidConfig { .. }
            | EngineError::InvalidPercentages { .. } => 2,
            EngineError::SourceNotFound { .. } => 3,
            EngineError::SourceReadError { .. } | EngineError::ReportWriteError { .. } => 4,
            _ => 1,
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
