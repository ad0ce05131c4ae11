//! # nxv-cli
//!
//! Command-line validator for NeXus data files.
//!
//! Validates a data file against its application definition and writes
//! one record per finding to stdout, followed by an
//! `Errors: N, Warnings: M` summary.

mod config;

use anyhow::Result;
use clap::{ArgAction, Parser};
use config::{CliConfig, OutputFormat};
use nxv_validation::{Counters, LogRecord, StreamSink, Target, TracingSink, ValidationContext};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nxvalidate")]
#[command(about = "Validate NeXus data files against NXDL application definitions")]
#[command(version)]
struct Cli {
    /// Data file to validate
    file: PathBuf,

    /// Directory containing NXDL definitions
    #[arg(short = 'd', long)]
    nxdl_dir: Option<PathBuf>,

    /// Application definition to validate against, instead of the one the file declares
    #[arg(short, long)]
    appdef: Option<String>,

    /// Path of the group to validate, instead of every NXentry
    #[arg(short, long)]
    path: Option<String>,

    /// Require the entry to declare the definition it is validated against
    #[arg(short = 'r', long)]
    check_root: bool,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format for validation records
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Increase diagnostic output (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Fail when warnings are reported
    #[arg(short, long)]
    warnings_as_errors: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let nxdl_dir = cli
        .nxdl_dir
        .clone()
        .or(config.nxdl_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let format = cli.format.or(config.format).unwrap_or_default();

    let mut ctx = ValidationContext::new(nxdl_dir);
    ctx.set_policy(config.policy);
    match format {
        OutputFormat::Text => ctx.set_logger(StreamSink::new(io::stdout())),
        OutputFormat::Json => ctx.set_logger(print_json),
        OutputFormat::Tracing => ctx.set_logger(TracingSink),
    }

    let target = Target {
        definition: cli.appdef.as_deref(),
        start_path: cli.path.as_deref(),
        check_root: cli.check_root,
    };
    tracing::info!(
        "Validating {} with definitions from {}",
        cli.file.display(),
        ctx.nxdl_dir().display()
    );
    let outcome = ctx.validate(&cli.file, &target);
    let counters = ctx.counters();
    print_summary(format, counters)?;

    let failed = !outcome.is_valid() || (cli.warnings_as_errors && counters.warnings > 0);
    Ok(if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn print_json(record: &LogRecord) {
    match serde_json::to_string(record) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!("Failed to serialize record: {}", e),
    }
}

fn print_summary(format: OutputFormat, counters: Counters) -> Result<()> {
    match format {
        OutputFormat::Text | OutputFormat::Tracing => println!("{counters}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&serde_json::json!({ "summary": counters }))?
        ),
    }
    Ok(())
}
