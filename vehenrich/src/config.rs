//! Run configuration resolution for vehenrich
//!
//! Each setting resolves with CLI → ENV → TOML → compiled default priority.
//! CLI and environment values arrive together through `clap` (every flag
//! has an `env` fallback) except the API key, which is resolved here so
//! that conflicting sources can be reported.

use crate::services::openai_client::OpenAiConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use vehenrich_common::config::{CompiledDefaults, TomlConfig};
use vehenrich_common::{Error, Result};

/// Environment variable carrying the classification service credential
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Resolve the API key from 3-tier configuration
///
/// **Priority:** CLI → ENV → TOML
pub fn resolve_api_key(cli_key: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let env_key = std::env::var(API_KEY_ENV_VAR).ok();
    let toml_key = toml_config.api_key.as_deref();

    let candidates = [
        ("command line", cli_key),
        ("environment", env_key.as_deref()),
        ("TOML", toml_key),
    ];

    let sources: Vec<&str> = candidates
        .iter()
        .filter(|(_, key)| key.map(is_valid_key).unwrap_or(false))
        .map(|(source, _)| *source)
        .collect();

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    for (source, key) in candidates {
        if let Some(key) = key.filter(|k| is_valid_key(k)) {
            info!("API key loaded from {}", source);
            return Ok(key.trim().to_string());
        }
    }

    Err(Error::Config(format!(
        "API key not configured. Please configure using one of:\n\
         1. Command line: --api-key <key>\n\
         2. Environment: {}=your-key-here\n\
         3. TOML config: api_key = \"your-key\"",
        API_KEY_ENV_VAR
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolved settings for the dedup command
#[derive(Debug, Clone)]
pub struct DedupSettings {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl DedupSettings {
    pub fn resolve(
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        toml_config: &TomlConfig,
    ) -> Self {
        let defaults = CompiledDefaults::default();
        Self {
            input: input
                .or_else(|| toml_config.input_path.clone())
                .unwrap_or(defaults.input_path),
            output: output
                .or_else(|| toml_config.dedup_output_path.clone())
                .unwrap_or(defaults.dedup_output_path),
        }
    }
}

/// Command-line (or environment) values for the enrich command
#[derive(Debug, Clone, Default)]
pub struct EnrichOverrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub interval_ms: Option<u64>,
    pub limit: Option<usize>,
}

/// Resolved settings for the enrich command
#[derive(Clone)]
pub struct EnrichSettings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub openai: OpenAiConfig,
    pub min_interval: Duration,
    pub limit: Option<usize>,
}

impl EnrichSettings {
    pub fn resolve(overrides: EnrichOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let defaults = CompiledDefaults::default();

        let api_key = resolve_api_key(overrides.api_key.as_deref(), toml_config)?;

        let timeout = overrides
            .timeout_secs
            .or(toml_config.request_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        if timeout.is_zero() {
            return Err(Error::InvalidInput(
                "request timeout must be at least 1 second".to_string(),
            ));
        }

        let min_interval = overrides
            .interval_ms
            .or(toml_config.min_interval_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.min_interval);

        Ok(Self {
            input: overrides
                .input
                .or_else(|| toml_config.input_path.clone())
                .unwrap_or(defaults.input_path),
            output: overrides
                .output
                .or_else(|| toml_config.enrich_output_path.clone())
                .unwrap_or(defaults.enrich_output_path),
            openai: OpenAiConfig {
                api_key,
                model: overrides
                    .model
                    .or_else(|| toml_config.model.clone())
                    .unwrap_or(defaults.model),
                base_url: overrides
                    .base_url
                    .or_else(|| toml_config.base_url.clone())
                    .unwrap_or(defaults.base_url),
                timeout,
            },
            min_interval,
            limit: overrides.limit,
        })
    }
}
