//! Service modules for the dedup and enrichment workflows

pub mod atomic_writer;
pub mod checkpoint;
pub mod classifier;
pub mod deduplicator;
pub mod openai_client;
pub mod output_sink;
pub mod source_reader;
pub mod throttle;

pub use atomic_writer::AtomicCsvWriter;
pub use checkpoint::{load_completed, CompletedSet};
pub use classifier::{
    build_prompt, parse_attributes, ClassifierError, VehicleClassifier, SYSTEM_PROMPT,
};
pub use deduplicator::{dedup_records, DedupSummary, Deduplicator, KeyColumns};
pub use openai_client::{OpenAiClassifier, OpenAiConfig};
pub use output_sink::{EnrichedCsvSink, RecordSink};
pub use source_reader::SourceReader;
pub use throttle::Throttle;
