//! Record sinks
//!
//! Where sample records go once a cycle has built them.

use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::SampleRecord;

/// File name format for data files, derived from the session start time
pub const DATA_FILE_FORMAT: &str = "%m_%d_%Y - %I-%M %p";

/// Errors writing records
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sink already closed")]
    Closed,
}

/// Destination for sample records.
///
/// The header is written once before the first record; `close` flushes and
/// releases the destination and must be safe to call more than once.
pub trait RecordSink: Send {
    /// Write the column header
    fn write_header(&mut self, columns: &[String]) -> Result<(), SinkError>;

    /// Append one record
    fn append(&mut self, record: &SampleRecord) -> Result<(), SinkError>;

    /// Flush and release the destination
    fn close(&mut self) -> Result<(), SinkError>;
}

/// Data file name for a session started at `start`
pub fn data_file_name(start: DateTime<Local>) -> String {
    format!("{}.csv", start.format(DATA_FILE_FORMAT))
}

/// CSV writer with every field quoted and `\r` line endings
pub struct CsvSink<W: Write> {
    writer: Option<csv::Writer<W>>,
}

impl CsvSink<File> {
    /// Open `path` for appending, creating it if needed
    pub fn append_to<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> CsvSink<W> {
    /// Wrap an arbitrary writer
    pub fn new(inner: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(b',')
            .quote(b'"')
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\r'))
            .from_writer(inner);
        Self {
            writer: Some(writer),
        }
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> Result<W, SinkError> {
        let writer = self.writer.take().ok_or(SinkError::Closed)?;
        writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }

    fn writer(&mut self) -> Result<&mut csv::Writer<W>, SinkError> {
        self.writer.as_mut().ok_or(SinkError::Closed)
    }
}

impl<W: Write + Send> RecordSink for CsvSink<W> {
    fn write_header(&mut self, columns: &[String]) -> Result<(), SinkError> {
        let writer = self.writer()?;
        writer.write_record(columns)?;
        writer.flush()?;
        Ok(())
    }

    fn append(&mut self, record: &SampleRecord) -> Result<(), SinkError> {
        let writer = self.writer()?;
        writer.write_record(record.to_row())?;
        writer.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryLog {
    header: Option<Vec<String>>,
    records: Vec<SampleRecord>,
    closed: bool,
}

/// In-memory sink; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<MemoryLog>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Header written at session start, if any
    pub fn header(&self) -> Option<Vec<String>> {
        self.lock().header.clone()
    }

    /// Records appended so far
    pub fn records(&self) -> Vec<SampleRecord> {
        self.lock().records.clone()
    }

    /// Number of records appended so far
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Check if no records were appended
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the sink has been closed
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryLog> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RecordSink for MemorySink {
    fn write_header(&mut self, columns: &[String]) -> Result<(), SinkError> {
        let mut log = self.lock();
        if log.closed {
            return Err(SinkError::Closed);
        }
        log.header = Some(columns.to_vec());
        Ok(())
    }

    fn append(&mut self, record: &SampleRecord) -> Result<(), SinkError> {
        let mut log = self.lock();
        if log.closed {
            return Err(SinkError::Closed);
        }
        log.records.push(record.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.lock().closed = true;
        Ok(())
    }
}
