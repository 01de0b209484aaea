//! Converter configuration.
//!
//! Settings come from a YAML file (with `${VAR}` / `${VAR:-default}`
//! substitution) or, without one, from `L1C_*` environment variables.
//! Command line flags are applied on top by `main`.

use anyhow::{Context, Result};
use level1c::{BatchOptions, InstrumentProfile};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

fn default_profile() -> String {
    "seviri".to_string()
}

/// Top-level converter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Directory holding the raw input files
    pub input_dir: PathBuf,

    /// Directory the level-1c files are written to
    pub output_dir: PathBuf,

    /// Built-in instrument profile name
    #[serde(default = "default_profile")]
    pub profile: String,

    /// YAML instrument profile; takes precedence over `profile`
    #[serde(default)]
    pub profile_file: Option<PathBuf>,

    /// `YYYYMMDDhhmm` slots to convert; all slots when empty
    #[serde(default)]
    pub times: Vec<String>,

    /// Convert scan units in parallel
    #[serde(default)]
    pub parallel: bool,

    /// Orbit number written instead of the placeholder
    #[serde(default)]
    pub orbit_number: Option<u32>,
}

impl ConverterConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read converter config from {:?}", path.as_ref()))?;
        let expanded = expand_env_vars(&content)?;
        let config: ConverterConfig = serde_yaml::from_str(&expanded)
            .with_context(|| format!("Failed to parse converter config from {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load configuration from `L1C_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let times = env::var("L1C_TIMES")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let orbit_number = match env::var("L1C_ORBIT_NUMBER") {
            Ok(v) => Some(
                v.trim()
                    .parse()
                    .with_context(|| format!("L1C_ORBIT_NUMBER is not a number: {}", v))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            input_dir: env::var("L1C_INPUT_DIR").unwrap_or_else(|_| ".".to_string()).into(),
            output_dir: env::var("L1C_OUTPUT_DIR").unwrap_or_else(|_| ".".to_string()).into(),
            profile: env::var("L1C_PROFILE").unwrap_or_else(|_| default_profile()),
            profile_file: env::var("L1C_PROFILE_FILE").ok().map(PathBuf::from),
            times,
            parallel: env::var("L1C_PARALLEL").map(|v| v == "true").unwrap_or(false),
            orbit_number,
        })
    }

    /// The instrument profile to convert with.
    pub fn load_profile(&self) -> Result<InstrumentProfile> {
        let profile = match &self.profile_file {
            Some(path) => InstrumentProfile::load(path)
                .with_context(|| format!("Failed to load instrument profile {:?}", path))?,
            None => InstrumentProfile::builtin(&self.profile)?,
        };
        info!(profile = %profile.name, channels = profile.channels.len(), "Using instrument profile");
        Ok(profile)
    }

    pub fn batch_options(&self) -> Result<BatchOptions> {
        let options = BatchOptions::default().parallel(self.parallel);
        if self.times.is_empty() {
            return Ok(options);
        }
        options
            .with_times(&self.times)
            .context("Invalid entry in times (expected YYYYMMDDhhmm)")
    }
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand `${VAR}` and `${VAR:-default}` references.
fn expand_env_vars(content: &str) -> Result<String> {
    let pattern = Regex::new(r"\$\{([^}]*)\}").context("Invalid substitution pattern")?;
    let mut result = String::with_capacity(content.len());
    let mut last = 0;
    for caps in pattern.captures_iter(content) {
        let (Some(whole), Some(expr)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        result.push_str(&content[last..whole.start()]);
        result.push_str(&resolve_var_expr(expr.as_str())?);
        last = whole.end();
    }
    result.push_str(&content[last..]);
    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    match expr.split_once(":-") {
        Some((name, default)) => Ok(env::var(name.trim())
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())),
        None => env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr)),
    }
}
