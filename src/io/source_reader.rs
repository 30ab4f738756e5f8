//! Source CSV ingest.
//!
//! Each source is one CSV file exported from the HR spreadsheets. Exports come
//! with either `;` or `,` as delimiter and in UTF-8 or Latin-1; both are
//! detected here so normalization only ever sees clean text cells.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::RunConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::SourceCategory;
use crate::normalize::RawTable;

/// Reads every configured source present in the input directory.
///
/// # Errors
///
/// - [`EngineError::SourceNotFound`] when a required source (active roster,
///   union values, union calendar) is missing
/// - [`EngineError::SourceReadError`] when a present file cannot be read or parsed
pub fn read_sources(config: &RunConfig) -> EngineResult<Vec<RawTable>> {
    let mut tables = Vec::with_capacity(SourceCategory::ALL.len());

    for category in SourceCategory::ALL {
        let path = config.source_path(category);
        if !path.is_file() {
            if category.is_required() {
                return Err(EngineError::SourceNotFound {
                    category,
                    path: path.display().to_string(),
                });
            }
            info!(category = %category, path = %path.display(), "Optional source absent, skipping");
            continue;
        }
        tables.push(read_table(&path, category)?);
    }

    info!(
        sources = tables.len(),
        directory = %config.input_directory.display(),
        "Read source files"
    );
    Ok(tables)
}

/// Reads one source CSV into a raw table of the given category.
///
/// Blank rows are kept (normalization skips them so row numbers stay true);
/// short rows are padded to the header width.
///
/// # Errors
///
/// Returns [`EngineError::SourceReadError`] if the file cannot be opened, has
/// no header row or contains malformed CSV.
pub fn read_table(path: &Path, category: SourceCategory) -> EngineResult<RawTable> {
    let path_str = path.display().to_string();
    let bytes = fs::read(path).map_err(|e| EngineError::SourceReadError {
        path: path_str.clone(),
        message: e.to_string(),
    })?;

    let decoded = decode(bytes);
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(&decoded);
    let delimiter = detect_delimiter(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| EngineError::SourceReadError {
            path: path_str.clone(),
            message: format!("failed to read header row: {e}"),
        })?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(EngineError::SourceReadError {
            path: path_str,
            message: "missing header row".to_string(),
        });
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| EngineError::SourceReadError {
            path: path_str.clone(),
            message: format!("line {}: {e}", idx + 2),
        })?;
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        if cells.len() < headers.len() {
            cells.resize(headers.len(), String::new());
        }
        rows.push(cells);
    }

    debug!(
        category = %category,
        path = %path_str,
        delimiter = %(delimiter as char),
        columns = headers.len(),
        rows = rows.len(),
        "Read source table"
    );

    Ok(RawTable {
        category,
        source_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(path_str),
        headers,
        rows,
    })
}

/// Decodes UTF-8, falling back to Latin-1 (every byte is its own code point).
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().iter().map(|&b| char::from(b)).collect(),
    }
}

/// Picks `;` or `,` by which appears more often in the header line.
fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    if semicolons >= commas && semicolons > 0 {
        b';'
    } else {
        b','
    }
}
