//! Resumable enrichment pipeline
//!
//! Walks the source CSV one row at a time. Each row ends in one of:
//! - **Invalid**: make, model or year blank after trimming; dropped, not recorded
//! - **Skipped**: key already in the completed set; no call, no write
//! - **Queried**: one classifier call, then the enriched row is appended,
//!   the key is marked completed and the throttle pauses
//!
//! Only one classifier call is ever outstanding: the next row is not read
//! until the previous row's result has been written.
//!
//! # Error Handling
//! - Unparseable reply: row written with `Unknown` attributes
//! - Service failure: row written with `Error` attributes
//! - Neither is retried, in this run or a later one
//! - Short or badly encoded source rows are decoded leniently and end up
//!   Invalid or Queried like any other row
//! - A source that cannot be opened, and I/O errors on the sink, abort the run

use crate::models::{EnrichedRecord, SourceRow, VehicleAttributes};
use crate::services::checkpoint::{load_completed, CompletedSet};
use crate::services::classifier::{build_prompt, parse_attributes, VehicleClassifier};
use crate::services::output_sink::{EnrichedCsvSink, RecordSink};
use crate::services::source_reader::SourceReader;
use crate::services::throttle::Throttle;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vehenrich_common::Result;

/// Run-level options
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Stop after this many classifier calls; the rest is left for the next run
    pub limit: Option<usize>,
}

/// Terminal state of one source row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Invalid,
    Skipped,
    /// Reply parsed into attributes
    Classified,
    /// Reply could not be parsed; written as `Unknown`
    Unparseable,
    /// Service call failed; written as `Error`
    Failed,
}

/// Counters for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub rows_read: usize,
    pub invalid: usize,
    pub skipped: usize,
    pub classified: usize,
    pub unparseable: usize,
    pub failed: usize,
}

impl PipelineStats {
    /// Rows appended to the output during this run
    pub fn written(&self) -> usize {
        self.classified + self.unparseable + self.failed
    }

    fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Invalid => self.invalid += 1,
            RecordOutcome::Skipped => self.skipped += 1,
            RecordOutcome::Classified => self.classified += 1,
            RecordOutcome::Unparseable => self.unparseable += 1,
            RecordOutcome::Failed => self.failed += 1,
        }
    }
}

/// Enrich `input` into the CSV at `output`, resuming from what it already holds
///
/// The checkpoint is loaded and the source opened before the output file is
/// created or appended to, so a bad input path leaves `output` untouched.
pub async fn run_enrichment(
    classifier: Arc<dyn VehicleClassifier>,
    throttle: Throttle,
    input: &Path,
    output: &Path,
    options: PipelineOptions,
) -> Result<PipelineStats> {
    let completed = load_completed(output)?;
    let source = SourceReader::open(input)?;
    let mut sink = EnrichedCsvSink::open(output)?;

    let mut pipeline = EnrichmentPipeline::new(classifier, throttle, completed).with_options(options);
    let stats = pipeline.run(source, &mut sink).await?;

    info!(
        output = %sink.path().display(),
        rows_appended = sink.rows_written(),
        "Output saved"
    );

    Ok(stats)
}

/// Sequential, checkpointed enrichment of vehicle records
pub struct EnrichmentPipeline {
    classifier: Arc<dyn VehicleClassifier>,
    throttle: Throttle,
    completed: CompletedSet,
    options: PipelineOptions,
}

impl EnrichmentPipeline {
    /// Create a pipeline resuming from `completed`
    pub fn new(
        classifier: Arc<dyn VehicleClassifier>,
        throttle: Throttle,
        completed: CompletedSet,
    ) -> Self {
        Self {
            classifier,
            throttle,
            completed,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn completed(&self) -> &CompletedSet {
        &self.completed
    }

    /// Enrich every row of `source` into `sink`
    ///
    /// Returns only after the sink's final flush, so a returned `Ok` means
    /// every written row is on disk.
    pub async fn run<S: RecordSink>(
        &mut self,
        mut source: SourceReader,
        sink: &mut S,
    ) -> Result<PipelineStats> {
        info!(
            input = %source.path().display(),
            already_completed = self.completed.len(),
            "Starting enrichment"
        );

        let mut stats = PipelineStats::default();

        loop {
            if let Some(limit) = self.options.limit {
                if stats.written() >= limit {
                    info!(limit, "Query limit reached, remaining rows left for the next run");
                    break;
                }
            }

            let Some(row) = source.next_row()? else {
                break;
            };
            stats.rows_read += 1;

            let outcome = self.process_row(row, sink).await?;
            stats.record(outcome);
        }

        sink.finish()?;

        info!(
            rows_read = stats.rows_read,
            written = stats.written(),
            skipped = stats.skipped,
            invalid = stats.invalid,
            unparseable = stats.unparseable,
            failed = stats.failed,
            "All rows processed and saved"
        );

        Ok(stats)
    }

    /// Drive a single row to its terminal state
    pub async fn process_row<S: RecordSink>(
        &mut self,
        row: SourceRow,
        sink: &mut S,
    ) -> Result<RecordOutcome> {
        let Some(record) = row.clone().into_record() else {
            warn!(row = ?row, "Skipping row with missing data");
            return Ok(RecordOutcome::Invalid);
        };

        if self.completed.contains(&record.key) {
            debug!(key = %record.key, "Skipping already processed");
            return Ok(RecordOutcome::Skipped);
        }

        let prompt = build_prompt(&record.key);
        info!("Processing: {}", prompt);

        let (attributes, outcome) = match self.classifier.classify(&prompt).await {
            Ok(reply) => match parse_attributes(&reply) {
                Some(attributes) => (attributes, RecordOutcome::Classified),
                None => {
                    warn!(key = %record.key, reply = %reply, "Could not parse classifier reply, using fallback");
                    (VehicleAttributes::unknown(), RecordOutcome::Unparseable)
                }
            },
            Err(e) => {
                error!(key = %record.key, error = %e, "Classification failed");
                (VehicleAttributes::error(), RecordOutcome::Failed)
            }
        };

        let enriched = EnrichedRecord::new(record, attributes);
        sink.append(&enriched)?;
        info!(
            key = %enriched.record.key,
            is_electric = %attributes.is_electric,
            is_hybrid = %attributes.is_hybrid,
            has_automatic_braking = %attributes.has_automatic_braking,
            "Saved"
        );
        self.completed.insert(enriched.record.key);

        self.throttle.pause().await;

        Ok(outcome)
    }
}
