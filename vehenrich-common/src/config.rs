//! Bootstrap configuration loading
//!
//! Settings are resolved per field with the priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module owns tiers 3 and 4. The binary layers CLI and environment
//! values on top.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming an explicit TOML config file
pub const CONFIG_PATH_ENV_VAR: &str = "VEHENRICH_CONFIG";

/// TOML bootstrap configuration
///
/// Every field is optional. A missing field falls through to the compiled
/// default in [`CompiledDefaults`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Source crash CSV
    #[serde(default)]
    pub input_path: Option<PathBuf>,

    /// Destination of the deduplicated CSV
    #[serde(default)]
    pub dedup_output_path: Option<PathBuf>,

    /// Destination (and checkpoint) of the enriched CSV
    #[serde(default)]
    pub enrich_output_path: Option<PathBuf>,

    /// Classification service credential
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat completion model name
    #[serde(default)]
    pub model: Option<String>,

    /// Base URL of the chat completion API (without `/chat/completions`)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Fixed pause after every classification call, in milliseconds
    #[serde(default)]
    pub min_interval_ms: Option<u64>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Compiled defaults, used when neither CLI, environment nor TOML supply a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub input_path: PathBuf,
    pub dedup_output_path: PathBuf,
    pub enrich_output_path: PathBuf,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    /// 101ms keeps the call rate under ~500 requests per minute
    pub min_interval: Duration,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("vehmodel_crashes_cris3.csv"),
            dedup_output_path: PathBuf::from("vehmodel_crashes_unique.csv"),
            enrich_output_path: PathBuf::from("vehmodel_crashes_streamed.csv"),
            model: "gpt-3.5-turbo-0125".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            request_timeout: Duration::from_secs(30),
            min_interval: Duration::from_millis(101),
            log_level: default_log_level(),
        }
    }
}

/// Platform config file location (`<config_dir>/vehenrich/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vehenrich").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse TOML {}: {}", path.display(), e))
    })
}

/// Load the bootstrap configuration
///
/// An explicit path (CLI argument, then `VEHENRICH_CONFIG`) must be readable.
/// Otherwise the platform default is used if present, and a missing file
/// falls back to an empty config so compiled defaults apply.
pub fn load_bootstrap_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    let explicit = cli_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV_VAR).map(PathBuf::from));

    if let Some(path) = explicit {
        let config = load_toml_config(&path)?;
        info!("Loaded TOML configuration from {}", path.display());
        return Ok(config);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            info!("Loaded TOML configuration from {}", path.display());
            Ok(config)
        }
        _ => {
            debug!("No config file found, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}
