//! Row-at-a-time reader for the source crash CSV
//!
//! Opening reads the header, so a missing or unreadable input fails before
//! any output is created. After that, malformed rows are never fatal:
//! short rows leave the missing fields empty and invalid UTF-8 is replaced.

use crate::models::SourceRow;
use csv::{ByteRecord, Reader, ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::warn;
use vehenrich_common::Result;

pub struct SourceReader {
    reader: Reader<File>,
    headers: StringRecord,
    raw: ByteRecord,
    path: PathBuf,
}

impl SourceReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::Headers)
            .from_path(path)?;
        let headers = reader.headers()?.clone();

        Ok(Self {
            reader,
            headers,
            raw: ByteRecord::new(),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next source row, or `None` at end of file
    pub fn next_row(&mut self) -> Result<Option<SourceRow>> {
        if !self.reader.read_byte_record(&mut self.raw)? {
            return Ok(None);
        }

        let (row, lossy) = SourceRow::from_byte_record(&self.raw, &self.headers)?;
        if lossy {
            warn!(
                line = ?self.raw.position().map(|p| p.line()),
                "Source row is not valid UTF-8, decoded with replacement characters"
            );
        }
        Ok(Some(row))
    }
}
