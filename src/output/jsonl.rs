//! Append-only JSON Lines record sink
//!
//! Each record becomes one line and the writer is flushed after every line,
//! so a crash after N records leaves exactly N complete lines on disk.

use crate::output::Record;
use crate::SinkError;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Destination for harvested records
pub trait RecordSink {
    /// Persists one record
    fn write_record(&mut self, record: &Record) -> Result<(), SinkError>;
}

/// In-memory sink, mostly useful for tests
impl RecordSink for Vec<Record> {
    fn write_record(&mut self, record: &Record) -> Result<(), SinkError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Writes one JSON object per line to any [`Write`] destination
#[derive(Debug)]
pub struct JsonlSink<W: Write> {
    writer: W,
    lines_written: u64,
}

impl JsonlSink<File> {
    /// Opens `path` in create + append mode
    ///
    /// Existing lines are never rewritten; new records go after them.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines_written: 0,
        }
    }

    /// Number of lines written by this sink (not counting pre-existing content)
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonlSink<W> {
    fn write_record(&mut self, record: &Record) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        self.lines_written += 1;

        Ok(())
    }
}
