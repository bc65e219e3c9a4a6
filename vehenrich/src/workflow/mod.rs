//! Enrichment workflow
//!
//! Source rows flow through key extraction, a membership test against the
//! completed set, and then either skip or classify-and-append.

pub mod pipeline;

pub use pipeline::{
    run_enrichment, EnrichmentPipeline, PipelineOptions, PipelineStats, RecordOutcome,
};
