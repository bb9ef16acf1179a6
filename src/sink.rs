//! Record sink boundary
//!
//! The engine hands every normalized record (and a per-stream replication
//! state value) to a [`RecordSink`]. Destination writing, checkpoint
//! persistence, and catalog negotiation live on the other side of this
//! boundary.

use crate::error::Result;
use crate::resource::Record;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;

/// Downstream collaborator that consumes the record stream
pub trait RecordSink {
    /// Consume one record for the named stream
    fn write_record(&mut self, stream: &str, record: &Record) -> Result<()>;

    /// Consume a replication-state update for the named stream
    fn write_state(&mut self, _stream: &str, _value: &Value) -> Result<()> {
        Ok(())
    }

    /// Flush any buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink that prints one JSON message per line, Singer-style
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl JsonLinesSink<std::io::Stdout> {
    /// Sink writing to stdout
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> JsonLinesSink<W> {
    /// Sink writing to an arbitrary writer
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn write_record(&mut self, stream: &str, record: &Record) -> Result<()> {
        let line = json!({
            "type": "RECORD",
            "stream": stream,
            "record": record,
        });
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    fn write_state(&mut self, stream: &str, value: &Value) -> Result<()> {
        let line = json!({
            "type": "STATE",
            "stream": stream,
            "value": value,
        });
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Sink that keeps everything in memory, for tests and embedding
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Records per stream, in emission order
    pub records: HashMap<String, Vec<Record>>,
    /// Last state value per stream
    pub states: HashMap<String, Value>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Records collected for one stream
    pub fn stream(&self, name: &str) -> &[Record] {
        self.records.get(name).map_or(&[], Vec::as_slice)
    }
}

impl RecordSink for MemorySink {
    fn write_record(&mut self, stream: &str, record: &Record) -> Result<()> {
        self.records
            .entry(stream.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn write_state(&mut self, stream: &str, value: &Value) -> Result<()> {
        self.states.insert(stream.to_string(), value.clone());
        Ok(())
    }
}
