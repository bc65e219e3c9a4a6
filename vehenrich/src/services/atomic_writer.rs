//! Atomic CSV file writer with automatic cleanup on failure.
//!
//! Writes to a temporary file in the same directory as the destination,
//! then atomically replaces the destination on `finish()`. If dropped
//! before finishing, the temporary file is deleted and the destination is
//! left untouched.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use tempfile::NamedTempFile;
use vehenrich_common::{Error, Result};

pub struct AtomicCsvWriter {
    writer: Writer<BufWriter<NamedTempFile>>,
    final_path: PathBuf,
}

impl AtomicCsvWriter {
    /// Creates a writer whose temporary file lives next to `final_path`
    /// (same filesystem, so the final rename is atomic).
    pub fn new(final_path: impl AsRef<Path>) -> Result<Self> {
        let final_path = final_path.as_ref().to_path_buf();

        let parent_dir = match final_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let temp_file = NamedTempFile::new_in(&parent_dir).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create temporary file in {}: {}",
                    parent_dir.display(),
                    e
                ),
            ))
        })?;

        Ok(Self {
            // Rows are passed through as read, short ones included
            writer: WriterBuilder::new()
                .flexible(true)
                .from_writer(BufWriter::new(temp_file)),
            final_path,
        })
    }

    pub fn write_record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer.write_record(record)?;
        Ok(())
    }

    /// Flushes all buffers and renames the temporary file onto the final path.
    pub fn finish(self) -> Result<PathBuf> {
        let buf_writer = self.writer.into_inner().map_err(|e| {
            Error::Io(std::io::Error::new(
                e.error().kind(),
                format!("Failed to flush CSV writer: {}", e.error()),
            ))
        })?;

        let named_temp = buf_writer.into_inner().map_err(|e| {
            Error::Io(std::io::Error::new(
                e.error().kind(),
                format!("Failed to flush buffer: {}", e.error()),
            ))
        })?;

        named_temp.persist(&self.final_path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.error.kind(),
                format!(
                    "Failed to persist file to {}: {}",
                    self.final_path.display(),
                    e.error
                ),
            ))
        })?;

        Ok(self.final_path)
    }
}
