//! Incremental enriched-CSV output
//!
//! Each record is written and flushed on its own, so the file always holds
//! exactly the rows completed so far and can serve as the next run's
//! checkpoint.

use crate::models::{EnrichedRecord, OUTPUT_HEADERS};
use csv::{Writer, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use vehenrich_common::Result;

/// Destination for enriched records
pub trait RecordSink {
    /// Durably write one record before returning
    fn append(&mut self, record: &EnrichedRecord) -> Result<()>;

    /// Final flush; completion must not be reported before this succeeds
    fn finish(&mut self) -> Result<()>;
}

/// Append-mode CSV sink for enriched records
pub struct EnrichedCsvSink {
    writer: Writer<File>,
    path: PathBuf,
    rows_written: usize,
}

impl EnrichedCsvSink {
    /// Open `path` for appending
    ///
    /// A missing or empty file gets the header row first. An existing file is
    /// appended to as-is; its rows are never rewritten.
    pub fn open(path: &Path) -> Result<Self> {
        let has_content = path.metadata().map(|m| m.len() > 0).unwrap_or(false);
        let needs_newline = has_content && !ends_with_newline(path)?;

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if needs_newline {
            // Hand-edited file whose last row lacks a terminator
            file.write_all(b"\n")?;
        }

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if !has_content {
            writer.write_record(OUTPUT_HEADERS)?;
            writer.flush()?;
            debug!(output = %path.display(), "Created output file with header");
        } else {
            debug!(output = %path.display(), "Appending to existing output file");
        }

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended through this sink (excludes pre-existing rows)
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

impl RecordSink for EnrichedCsvSink {
    fn append(&mut self, record: &EnrichedRecord) -> Result<()> {
        self.writer.write_record(record.csv_fields())?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }
}

fn ends_with_newline(path: &Path) -> Result<bool> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
