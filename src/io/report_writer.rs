//! Report and run summary output.
//!
//! The report is written as `<YYYYMMDD_HHMMSS>_<suffix>.csv` with the
//! delivery columns; the run summary (and optionally the audit trail) go next
//! to it as JSON.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::OutputConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{CalculationResult, REPORT_COLUMNS, ReportRow, RunSummary};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Paths of the files written for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    /// The report CSV.
    pub report: PathBuf,
    /// The run summary JSON.
    pub summary: PathBuf,
    /// The audit trail JSON, when requested.
    pub audit: Option<PathBuf>,
}

/// Writes the report, the run summary and, if configured, the audit trail.
///
/// File names are prefixed with the summary timestamp so consecutive runs
/// never overwrite each other. Every file is first written under a `.part`
/// name and renamed only once all of them were written, so a failed run
/// leaves no report behind.
///
/// # Errors
///
/// Returns [`EngineError::ReportWriteError`] if the output directory cannot
/// be created or any file cannot be written.
pub fn write_outputs(
    rows: &[ReportRow],
    summary: &RunSummary,
    results: &[CalculationResult],
    output: &OutputConfig,
) -> EngineResult<WrittenFiles> {
    fs::create_dir_all(&output.directory).map_err(|e| write_error(&output.directory, e))?;

    let stamp = summary.timestamp.format("%Y%m%d_%H%M%S").to_string();
    let report = output
        .directory
        .join(format!("{stamp}_{}.csv", output.file_suffix));
    let summary_path = output.directory.join(format!("{stamp}_vr_summary.json"));
    let audit = output
        .audit_trail
        .then(|| output.directory.join(format!("{stamp}_vr_audit.json")));

    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(3);
    let written = stage(&mut staged, &report, |part| write_report_csv(part, rows, output))
        .and_then(|()| stage(&mut staged, &summary_path, |part| write_json(part, summary)))
        .and_then(|()| match &audit {
            Some(path) => stage(&mut staged, path, |part| write_json(part, results)),
            None => Ok(()),
        });
    if let Err(err) = written {
        discard(&staged);
        return Err(err);
    }

    for (idx, (part, path)) in staged.iter().enumerate() {
        if let Err(err) = fs::rename(part, path) {
            for (_, done) in &staged[..idx] {
                let _ = fs::remove_file(done);
            }
            discard(&staged[idx..]);
            return Err(write_error(path, err));
        }
    }

    info!(
        report = %report.display(),
        summary = %summary_path.display(),
        rows = rows.len(),
        "Wrote report"
    );

    Ok(WrittenFiles {
        report,
        summary: summary_path,
        audit,
    })
}

/// Writes `path`'s content to its `.part` sibling and records the pair.
fn stage<'p>(
    staged: &mut Vec<(PathBuf, &'p Path)>,
    path: &'p Path,
    write: impl FnOnce(&Path) -> EngineResult<()>,
) -> EngineResult<()> {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);
    staged.push((part.clone(), path));
    write(&part)
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (part, _) in staged {
        let _ = fs::remove_file(part);
    }
}

/// Writes the report rows under the delivery header.
pub fn write_report_csv(path: &Path, rows: &[ReportRow], output: &OutputConfig) -> EngineResult<()> {
    let mut file = BufWriter::new(File::create(path).map_err(|e| write_error(path, e))?);
    if output.utf8_bom {
        file.write_all(UTF8_BOM).map_err(|e| write_error(path, e))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(output.delimiter as u8)
        .from_writer(file);

    writer
        .write_record(REPORT_COLUMNS)
        .map_err(|e| write_error(path, e))?;
    for row in rows {
        writer
            .write_record(row.to_record())
            .map_err(|e| write_error(path, e))?;
    }
    writer.flush().map_err(|e| write_error(path, e))?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> EngineResult<()> {
    let file = File::create(path).map_err(|e| write_error(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| write_error(path, e))?;
    writer.flush().map_err(|e| write_error(path, e))?;
    Ok(())
}

fn write_error(path: &Path, err: impl std::fmt::Display) -> EngineError {
    EngineError::ReportWriteError {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
