//! Level-1c converter service.
//!
//! Scans an input directory for raw satellite files, groups them into scan
//! units and converts each unit into one level-1c file.

mod config;
mod json_io;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::ConverterConfig;
use json_io::{JsonSceneReader, JsonSceneWriter};
use level1c::{BatchDriver, Converter};

#[derive(Parser, Debug)]
#[command(name = "l1c-converter")]
#[command(about = "Convert calibrated satellite scenes into level-1c files")]
struct Args {
    /// Directory holding the raw input files
    input_dir: Option<PathBuf>,

    /// Directory the level-1c files are written to
    output_dir: Option<PathBuf>,

    /// Configuration file path (falls back to L1C_* environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in instrument profile (seviri, avhrr-gac-fdr)
    #[arg(short, long)]
    profile: Option<String>,

    /// YAML instrument profile
    #[arg(long)]
    profile_file: Option<PathBuf>,

    /// Only convert these slots (YYYYMMDDhhmm, comma separated)
    #[arg(long, value_delimiter = ',')]
    times: Vec<String>,

    /// Convert scan units in parallel
    #[arg(long)]
    parallel: bool,

    /// Orbit number to write instead of the placeholder
    #[arg(long)]
    orbit_number: Option<u32>,

    /// Log level
    #[arg(long, env = "L1C_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize tracing; RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);
    match args.log_format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }

    info!("Starting level-1c converter");

    let config = load_config(&args)?;
    info!(
        input_dir = %config.input_dir.display(),
        output_dir = %config.output_dir.display(),
        profile = %config.profile,
        parallel = config.parallel,
        "Loaded configuration"
    );

    let profile = Arc::new(config.load_profile()?);
    let converter = Converter::new(profile, JsonSceneReader, JsonSceneWriter, &config.output_dir)
        .context("Failed to set up converter")?
        .with_orbit_number(config.orbit_number);
    let driver = BatchDriver::new(converter, config.batch_options()?)?;

    let report = driver
        .run(&config.input_dir)
        .with_context(|| format!("Failed to scan input directory {:?}", config.input_dir))?;

    let converted = report.converted().count();
    let failed = report.failures().count();
    info!(
        units = report.len(),
        converted,
        skipped = report.skipped_count(),
        failed,
        "Conversion finished"
    );

    if report.has_failures() {
        error!(failed, "Some scan units failed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Config file or environment, with command line flags applied on top.
fn load_config(args: &Args) -> Result<ConverterConfig> {
    let mut config = match &args.config {
        Some(path) => ConverterConfig::from_yaml(path)?,
        None => ConverterConfig::from_env()?,
    };

    if let Some(dir) = &args.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(profile) = &args.profile {
        config.profile = profile.clone();
        config.profile_file = None;
    }
    if let Some(path) = &args.profile_file {
        config.profile_file = Some(path.clone());
    }
    if !args.times.is_empty() {
        config.times = args.times.clone();
    }
    if args.parallel {
        config.parallel = true;
    }
    if args.orbit_number.is_some() {
        config.orbit_number = args.orbit_number;
    }
    Ok(config)
}
