//! Checkpoint reconstruction from a previous run's output
//!
//! The enriched CSV is the only record of progress. Its key projection is
//! the set of vehicles that need no further work.

use crate::models::{CompositeKey, SourceRow};
use csv::{ByteRecord, ReaderBuilder, Trim};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;
use vehenrich_common::Result;

/// Keys already present in the output sink
///
/// Grows monotonically during a run; never persisted apart from the output.
#[derive(Debug, Clone, Default)]
pub struct CompletedSet {
    keys: HashSet<CompositeKey>,
}

impl CompletedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &CompositeKey) -> bool {
        self.keys.contains(key)
    }

    /// Returns false if the key was already present
    pub fn insert(&mut self, key: CompositeKey) -> bool {
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<CompositeKey> for CompletedSet {
    fn from_iter<T: IntoIterator<Item = CompositeKey>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Rebuild the completed set from an existing output file
///
/// A missing file is the normal first-run state and yields an empty set.
/// Keys are derived with the same rule the pipeline uses when writing, so
/// every row written by an earlier run is recognised. A row cut short
/// (e.g. by a crash mid-write) yields no complete key and is ignored, so
/// that vehicle is queried again.
pub fn load_completed(output_path: &Path) -> Result<CompletedSet> {
    if !output_path.exists() {
        info!(
            output = %output_path.display(),
            "No previous output found, starting fresh"
        );
        return Ok(CompletedSet::new());
    }

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_path(output_path)?;
    let headers = reader.headers()?.clone();

    let mut completed = CompletedSet::new();
    let mut raw = ByteRecord::new();
    while reader.read_byte_record(&mut raw)? {
        let (row, _) = SourceRow::from_byte_record(&raw, &headers)?;
        let key = row.key();
        if key.is_complete() {
            completed.insert(key);
        }
    }

    info!(
        output = %output_path.display(),
        entries = completed.len(),
        "Loaded processed entries"
    );

    Ok(completed)
}
