//! vehenrich - Vehicle crash data enrichment
//!
//! Two commands:
//! - `dedup`: keep the first crash record per make/model/year
//! - `enrich`: classify each unique vehicle and append results to a
//!   resumable CSV checkpoint

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use vehenrich::config::{DedupSettings, EnrichOverrides, EnrichSettings};
use vehenrich::services::{Deduplicator, OpenAiClassifier, Throttle};
use vehenrich::workflow::{run_enrichment, PipelineOptions};
use vehenrich_common::config::{load_bootstrap_config, CompiledDefaults};

/// Command-line arguments for vehenrich
#[derive(Parser, Debug)]
#[command(name = "vehenrich")]
#[command(about = "Deduplicate and enrich vehicle crash records")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "VEHENRICH_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, env = "VEHENRICH_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep the first record of every make/model/year
    Dedup {
        /// Source crash CSV
        #[arg(short, long, env = "VEHENRICH_INPUT")]
        input: Option<PathBuf>,

        /// Destination for the unique rows
        #[arg(short, long, env = "VEHENRICH_DEDUP_OUTPUT")]
        output: Option<PathBuf>,
    },
    /// Classify unique vehicles, appending to a resumable output CSV
    Enrich {
        /// Source crash CSV
        #[arg(short, long, env = "VEHENRICH_INPUT")]
        input: Option<PathBuf>,

        /// Output CSV, also read back as the checkpoint
        #[arg(short, long, env = "VEHENRICH_ENRICH_OUTPUT")]
        output: Option<PathBuf>,

        /// API key (otherwise OPENAI_API_KEY or the TOML `api_key`)
        #[arg(long)]
        api_key: Option<String>,

        /// Chat completion model
        #[arg(long, env = "VEHENRICH_MODEL")]
        model: Option<String>,

        /// API base URL
        #[arg(long, env = "VEHENRICH_BASE_URL")]
        base_url: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long, env = "VEHENRICH_TIMEOUT_SECS")]
        timeout_secs: Option<u64>,

        /// Pause after every classification call, in milliseconds
        #[arg(long, env = "VEHENRICH_INTERVAL_MS")]
        interval_ms: Option<u64>,

        /// Stop after this many classification calls
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_bootstrap_config(args.config.as_deref())?;

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| toml_config.logging.level.clone());
    vehenrich_common::logging::init_tracing(&log_level)?;

    info!("Starting vehenrich {}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Dedup { input, output } => {
            let settings = DedupSettings::resolve(input, output, &toml_config);

            let summary = tokio::task::spawn_blocking(move || {
                Deduplicator::new().run(&settings.input, &settings.output)
            })
            .await
            .context("Dedup task panicked")??;

            info!(
                "Saved {} unique rows ({} duplicates dropped)",
                summary.rows_written, summary.duplicates_dropped
            );
        }
        Command::Enrich {
            input,
            output,
            api_key,
            model,
            base_url,
            timeout_secs,
            interval_ms,
            limit,
        } => {
            let overrides = EnrichOverrides {
                input,
                output,
                api_key,
                model,
                base_url,
                timeout_secs,
                interval_ms,
                limit,
            };
            let settings = EnrichSettings::resolve(overrides, &toml_config)?;

            info!(
                input = %settings.input.display(),
                output = %settings.output.display(),
                model = %settings.openai.model,
                interval_ms = settings.min_interval.as_millis() as u64,
                "Enrichment configured"
            );
            if settings.min_interval < CompiledDefaults::default().min_interval {
                tracing::warn!(
                    "Interval below default; the service may start rejecting requests"
                );
            }

            let classifier = OpenAiClassifier::new(settings.openai.clone())
                .context("Failed to build HTTP client")?;

            let stats = run_enrichment(
                Arc::new(classifier),
                Throttle::new(settings.min_interval),
                &settings.input,
                &settings.output,
                PipelineOptions {
                    limit: settings.limit,
                },
            )
            .await
            .with_context(|| {
                format!(
                    "Failed to enrich {} into {}",
                    settings.input.display(),
                    settings.output.display()
                )
            })?;

            info!(
                "Done: {} new rows written to {} ({} already present)",
                stats.written(),
                settings.output.display(),
                stats.skipped
            );
        }
    }

    Ok(())
}
