//! Configuration types for a benefit run.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML run configuration, plus the month-level
//! overrides that the month configuration source and the command line apply
//! on top of it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{ProcessingMonth, SourceCategory};

fn default_cutoff_day() -> u32 {
    15
}

fn default_company_percentage() -> Decimal {
    Decimal::new(80, 2)
}

fn default_employee_percentage() -> Decimal {
    Decimal::new(20, 2)
}

fn default_excluded_positions() -> Vec<String> {
    ["DIRETOR", "GERENTE GERAL", "PRESIDENTE", "VICE-PRESIDENTE"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_union_states() -> BTreeMap<String, String> {
    [
        ("PARANA", "SITEPD PR"),
        ("RIO DE JANEIRO", "SINDPD RJ"),
        ("RIO GRANDE DO SUL", "SINDPPD RS"),
        ("SAO PAULO", "SINDPD SP"),
    ]
    .into_iter()
    .map(|(state, union)| (state.to_string(), union.to_string()))
    .collect()
}

fn default_true() -> bool {
    true
}

fn default_input_directory() -> PathBuf {
    PathBuf::from("data/input")
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("data/output")
}

fn default_file_suffix() -> String {
    "vr_final_report".to_string()
}

fn default_delimiter() -> char {
    ';'
}

/// The run configuration.
///
/// Every field has a default, so an empty YAML document is a valid
/// configuration as long as the processing month is supplied later by the
/// month configuration source or the command line.
///
/// # Example
///
/// ```
/// use vr_engine::config::RunConfig;
/// use rust_decimal::Decimal;
///
/// let config: RunConfig = serde_yaml::from_str("processing_month: \"05/2025\"").unwrap();
/// assert_eq!(config.cutoff_day, 15);
/// assert_eq!(config.company_percentage, Decimal::new(80, 2));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// The month being processed.
    #[serde(default)]
    pub processing_month: Option<ProcessingMonth>,
    /// Terminations on or before this day of the month void the benefit.
    #[serde(default = "default_cutoff_day")]
    pub cutoff_day: u32,
    /// Share of the benefit funded by the company.
    #[serde(default = "default_company_percentage")]
    pub company_percentage: Decimal,
    /// Share of the benefit discounted from the employee.
    #[serde(default = "default_employee_percentage")]
    pub employee_percentage: Decimal,
    /// Position titles (uppercase substrings) that are never entitled.
    #[serde(default = "default_excluded_positions")]
    pub excluded_positions: Vec<String>,
    /// Whether employees working abroad are excluded.
    #[serde(default = "default_true")]
    pub exclude_abroad: bool,
    /// Union code of each state, for value tables keyed by state.
    /// State names match after folding, so `São Paulo` finds `SAO PAULO`.
    #[serde(default = "default_union_states")]
    pub union_states: BTreeMap<String, String>,
    /// Directory holding the source CSV files.
    #[serde(default = "default_input_directory")]
    pub input_directory: PathBuf,
    /// Source file names by category.
    #[serde(default)]
    pub sources: SourceFiles,
    /// Report output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            processing_month: None,
            cutoff_day: default_cutoff_day(),
            company_percentage: default_company_percentage(),
            employee_percentage: default_employee_percentage(),
            excluded_positions: default_excluded_positions(),
            exclude_abroad: true,
            union_states: default_union_states(),
            input_directory: default_input_directory(),
            sources: SourceFiles::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RunConfig {
    /// Checks ranges and the percentage split.
    ///
    /// The processing month may still be unset; see [`RunConfig::month`].
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidConfig`] for a cutoff day outside 1-31, a
    ///   percentage outside 0-1 or a blank excluded position.
    /// - [`EngineError::InvalidPercentages`] when the two percentages do not
    ///   sum to exactly one.
    pub fn validate(&self) -> EngineResult<()> {
        if !(1..=31).contains(&self.cutoff_day) {
            return Err(EngineError::InvalidConfig {
                field: "cutoff_day".to_string(),
                message: format!("{} is not a day of the month (1-31)", self.cutoff_day),
            });
        }

        for (field, value) in [
            ("company_percentage", self.company_percentage),
            ("employee_percentage", self.employee_percentage),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(EngineError::InvalidConfig {
                    field: field.to_string(),
                    message: format!("{value} is outside 0..1"),
                });
            }
        }

        if self.company_percentage + self.employee_percentage != Decimal::ONE {
            return Err(EngineError::InvalidPercentages {
                company: self.company_percentage,
                employee: self.employee_percentage,
            });
        }

        if self.excluded_positions.iter().any(|p| p.trim().is_empty()) {
            return Err(EngineError::InvalidConfig {
                field: "excluded_positions".to_string(),
                message: "blank position title".to_string(),
            });
        }

        if let Some((state, _)) = self
            .union_states
            .iter()
            .find(|(state, union)| state.trim().is_empty() || union.trim().is_empty())
        {
            return Err(EngineError::InvalidConfig {
                field: "union_states".to_string(),
                message: format!("blank state or union code in entry '{state}'"),
            });
        }

        if self.output.file_suffix.trim().is_empty() {
            return Err(EngineError::InvalidConfig {
                field: "output.file_suffix".to_string(),
                message: "must not be blank".to_string(),
            });
        }

        if !self.output.delimiter.is_ascii() || self.output.delimiter.is_ascii_alphanumeric() {
            return Err(EngineError::InvalidConfig {
                field: "output.delimiter".to_string(),
                message: format!("'{}' is not a usable CSV delimiter", self.output.delimiter),
            });
        }

        Ok(())
    }

    /// Returns the processing month, failing if none was configured.
    pub fn month(&self) -> EngineResult<ProcessingMonth> {
        self.processing_month
            .ok_or_else(|| EngineError::InvalidConfig {
                field: "processing_month".to_string(),
                message: "not set in the configuration, the month source or --month".to_string(),
            })
    }

    /// Returns a copy with the overrides applied, revalidated.
    ///
    /// Set values replace the configured ones; excluded positions are
    /// appended, skipping titles already present.
    ///
    /// # Errors
    ///
    /// Any error [`RunConfig::validate`] reports for the overridden values.
    pub fn with_overrides(&self, overrides: &MonthSettings) -> EngineResult<RunConfig> {
        let mut config = self.clone();

        if let Some(month) = overrides.processing_month {
            config.processing_month = Some(month);
        }
        if let Some(cutoff) = overrides.cutoff_day {
            config.cutoff_day = cutoff;
        }
        if let Some(company) = overrides.company_percentage {
            config.company_percentage = company;
        }
        if let Some(employee) = overrides.employee_percentage {
            config.employee_percentage = employee;
        }
        for title in &overrides.excluded_positions {
            let title = title.trim().to_uppercase();
            if !config
                .excluded_positions
                .iter()
                .any(|existing| existing.trim().to_uppercase() == title)
            {
                config.excluded_positions.push(title);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Returns the path of a category's source file.
    pub fn source_path(&self, category: SourceCategory) -> PathBuf {
        self.sources.path_for(category, &self.input_directory)
    }
}

/// Month-level overrides, from the month configuration source or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSettings {
    /// Processing month override.
    pub processing_month: Option<ProcessingMonth>,
    /// Cutoff day override.
    pub cutoff_day: Option<u32>,
    /// Company percentage override.
    pub company_percentage: Option<Decimal>,
    /// Employee percentage override.
    pub employee_percentage: Option<Decimal>,
    /// Additional excluded position titles.
    pub excluded_positions: Vec<String>,
}

impl MonthSettings {
    /// Returns settings that only override the processing month.
    pub fn for_month(month: ProcessingMonth) -> Self {
        Self {
            processing_month: Some(month),
            ..Self::default()
        }
    }

    /// Returns true when nothing is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Source file names by category, relative to the input directory.
///
/// Categories not listed fall back to [`SourceCategory::default_file_name`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceFiles(BTreeMap<SourceCategory, String>);

impl SourceFiles {
    /// Returns the configured file name of a category.
    pub fn file_name(&self, category: SourceCategory) -> &str {
        self.0
            .get(&category)
            .map(String::as_str)
            .unwrap_or_else(|| category.default_file_name())
    }

    /// Returns the full path of a category's file under `input_directory`.
    pub fn path_for(&self, category: SourceCategory, input_directory: &Path) -> PathBuf {
        input_directory.join(self.file_name(category))
    }

    /// Overrides the file name of a category.
    pub fn set(&mut self, category: SourceCategory, file_name: impl Into<String>) {
        self.0.insert(category, file_name.into());
    }
}

/// Where and how the report is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output directory.
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    /// File name suffix after the timestamp.
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
    /// CSV delimiter of the report.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Prefix the report with a UTF-8 byte order mark so spreadsheets detect the encoding.
    #[serde(default = "default_true")]
    pub utf8_bom: bool,
    /// Also write the per-employee audit trail as JSON.
    #[serde(default)]
    pub audit_trail: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            file_suffix: default_file_suffix(),
            delimiter: default_delimiter(),
            utf8_bom: true,
            audit_trail: false,
        }
    }
}
