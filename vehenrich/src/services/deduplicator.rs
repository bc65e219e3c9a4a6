//! Composite-key deduplication of crash records
//!
//! Keeps the first row seen for each vehicle (make/model/year), preserving
//! source order, and writes the retained rows in one shot. Rows are carried
//! as raw bytes, so short rows and non-UTF-8 fields pass through unchanged.

use crate::models::{CompositeKey, MAKE_COLUMN, MODEL_COLUMN, YEAR_COLUMN};
use crate::services::atomic_writer::AtomicCsvWriter;
use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};
use vehenrich_common::{Error, Result};

/// Positions of the key columns within a header row
///
/// A column absent from the header, or from a short row, contributes an
/// empty string to the key. Invalid UTF-8 is decoded lossily.
#[derive(Debug, Clone, Copy)]
pub struct KeyColumns {
    make: Option<usize>,
    model: Option<usize>,
    model_year: Option<usize>,
}

impl KeyColumns {
    pub fn locate(headers: &StringRecord) -> Self {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        Self {
            make: position(MAKE_COLUMN),
            model: position(MODEL_COLUMN),
            model_year: position(YEAR_COLUMN),
        }
    }

    pub fn key(&self, record: &ByteRecord) -> CompositeKey {
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(String::from_utf8_lossy)
                .unwrap_or_default()
        };
        CompositeKey::new(&field(self.make), &field(self.model), &field(self.model_year))
    }
}

/// Stable dedup: the first record of every distinct key, in source order
pub fn dedup_records<I>(headers: &StringRecord, records: I) -> Vec<ByteRecord>
where
    I: IntoIterator<Item = ByteRecord>,
{
    let columns = KeyColumns::locate(headers);
    let mut seen = HashSet::new();

    records
        .into_iter()
        .filter(|record| seen.insert(columns.key(record)))
        .collect()
}

/// Outcome of a dedup run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupSummary {
    pub rows_read: usize,
    pub rows_written: usize,
    pub duplicates_dropped: usize,
}

/// Reads a crash CSV, deduplicates it and writes the unique rows
#[derive(Debug, Default)]
pub struct Deduplicator;

impl Deduplicator {
    pub fn new() -> Self {
        Self
    }

    /// Deduplicate `input` into `output`
    ///
    /// The output header is the header of the retained rows. With zero
    /// retained rows there is no shape to derive it from, so the run fails
    /// with [`Error::Config`] and `output` is not touched.
    pub fn run(&self, input: &Path, output: &Path) -> Result<DedupSummary> {
        info!(input = %input.display(), "Reading source records for dedup");

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::Headers)
            .from_path(input)?;
        let headers = reader.headers()?.clone();

        let records = reader
            .byte_records()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let rows_read = records.len();

        let unique = dedup_records(&headers, records);
        debug!(rows_read, unique = unique.len(), "Dedup complete");

        if unique.is_empty() {
            return Err(Error::Config(
                "output headers cannot be derived from zero records".to_string(),
            ));
        }

        let mut writer = AtomicCsvWriter::new(output)?;
        writer.write_record(&headers)?;
        for record in &unique {
            writer.write_record(record)?;
        }
        writer.finish()?;

        let summary = DedupSummary {
            rows_read,
            rows_written: unique.len(),
            duplicates_dropped: rows_read - unique.len(),
        };

        info!(
            output = %output.display(),
            rows_written = summary.rows_written,
            duplicates_dropped = summary.duplicates_dropped,
            "Saved unique rows"
        );

        Ok(summary)
    }
}
