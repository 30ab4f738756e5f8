//! Command-line interface.
//!
//! `src/main.rs` only maps the result of [`run`] to an exit code; argument
//! parsing, logging setup and command dispatch live here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigLoader, MonthSettings, RunConfig};
use crate::error::{EngineError, EngineResult};
use crate::io::{read_sources, write_outputs};
use crate::models::ProcessingMonth;
use crate::pipeline::{self, RunOutput};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "vr-engine", version, about = "Monthly VR/VA benefit reconciliation and calculation")]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read the sources, calculate the benefit and write the report.
    Run(RunArgs),
    /// Read the sources and calculate, without writing anything.
    Validate(RunArgs),
}

/// Options shared by `run` and `validate`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Run configuration file.
    #[arg(short, long, default_value = "config/vr.yaml")]
    pub config: PathBuf,

    /// Input directory holding the source CSVs (overrides the configuration).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory (overrides the configuration).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Processing month, MM/YYYY or YYYY-MM (overrides the configuration and the month source).
    #[arg(short, long, value_parser = parse_month)]
    pub month: Option<ProcessingMonth>,

    /// Also write the per-employee audit trail.
    #[arg(long)]
    pub audit: bool,
}

fn parse_month(value: &str) -> Result<ProcessingMonth, String> {
    value.parse()
}

/// Entry point for the `vr-engine` binary.
pub fn run() -> EngineResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Command::Run(args) => handle_run(&args, true),
        Command::Validate(args) => handle_run(&args, false),
    }
}

/// Installs the `fmt` subscriber; `RUST_LOG` wins over `--debug`.
fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_run(args: &RunArgs, write: bool) -> EngineResult<()> {
    let config = effective_config(args)?;
    let overrides = args
        .month
        .map(MonthSettings::for_month)
        .unwrap_or_default();

    let tables = read_sources(&config)?;
    let output = pipeline::run(&tables, &config, &overrides)?;

    if write {
        let written = write_outputs(
            &output.rows,
            &output.summary,
            &output.results,
            &output.config.output,
        )?;
        println!("{}", format_summary(&output));
        println!("Report: {}", written.report.display());
        println!("Summary: {}", written.summary.display());
        if let Some(audit) = &written.audit {
            println!("Audit trail: {}", audit.display());
        }
    } else {
        info!("Validation only; nothing written");
        println!("{}", format_summary(&output));
    }

    Ok(())
}

fn effective_config(args: &RunArgs) -> EngineResult<RunConfig> {
    let mut config = ConfigLoader::load(&args.config)?.into_config();
    if let Some(input) = &args.input {
        config.input_directory = input.clone();
    }
    if let Some(output) = &args.output {
        config.output.directory = output.clone();
    }
    if args.audit {
        config.output.audit_trail = true;
    }
    if !config.input_directory.is_dir() {
        return Err(EngineError::SourceReadError {
            path: config.input_directory.display().to_string(),
            message: "input directory does not exist".to_string(),
        });
    }
    Ok(config)
}

/// Renders the terminal summary of a run.
pub fn format_summary(output: &RunOutput) -> String {
    let summary = &output.summary;
    let mut lines = vec![
        format!("Competência: {}", summary.processing_month),
        format!(
            "Employees: {} seen, {} included, {} excluded, {} reported ({} with zero days)",
            summary.counts.employees_seen,
            summary.counts.included,
            summary.counts.excluded,
            summary.counts.reported,
            summary.counts.zero_day_rows
        ),
    ];

    for (reason, count) in &summary.exclusions_by_reason {
        lines.push(format!("  excluded {reason:?}: {count}"));
    }

    lines.push(format!(
        "Total: R$ {:.2} (company R$ {:.2}, employee R$ {:.2})",
        summary.totals.total_value, summary.totals.employer_share, summary.totals.employee_share
    ));
    for (union, totals) in &summary.unions {
        lines.push(format!(
            "  {union}: {} employees, R$ {:.2}",
            totals.employees, totals.totals.total_value
        ));
    }
    if !summary.warnings.is_empty() {
        lines.push(format!("Warnings: {}", summary.warnings.len()));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_args() {
        let cli = Cli::try_parse_from([
            "vr-engine",
            "run",
            "--config",
            "cfg.yaml",
            "--month",
            "05/2025",
            "--audit",
        ])
        .unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.config, PathBuf::from("cfg.yaml"));
                assert_eq!(args.month, ProcessingMonth::new(2025, 5));
                assert!(args.audit);
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_defaults() {
        let cli = Cli::try_parse_from(["vr-engine", "--debug", "validate"]).unwrap();
        assert!(cli.debug);
        match cli.command {
            Command::Validate(args) => {
                assert_eq!(args.config, PathBuf::from("config/vr.yaml"));
                assert!(args.month.is_none());
            }
            other => panic!("expected validate, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(Cli::try_parse_from(["vr-engine", "run", "--month", "13/2025"]).is_err());
    }
}
