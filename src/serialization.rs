//! Writing materialized entities as JSON.
//!
//! Entities serialize with their type tag under `__type`, the source entry id
//! under `__id`, and one key per bound field.

use std::io::Write;
use std::str::FromStr;
use thiserror::Error;

use crate::entity::Entity;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output layout for a batch of entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Ndjson,
    /// A single JSON array
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ndjson" | "jsonl" => Ok(OutputFormat::Ndjson),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// NDJSON (Newline Delimited JSON) writer
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single entity as an NDJSON line
    pub fn write(&mut self, entity: &Entity) -> Result<(), SerializationError> {
        serde_json::to_writer(&mut self.writer, entity)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON array writer
///
/// The opening bracket is written on construction; [`JsonArrayWriter::finish`]
/// must be called to close the array.
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    first: bool,
}

impl<W: Write> JsonArrayWriter<W> {
    pub fn new(mut writer: W) -> Result<Self, SerializationError> {
        writer.write_all(b"[")?;
        Ok(Self {
            writer,
            first: true,
        })
    }

    pub fn write(&mut self, entity: &Entity) -> Result<(), SerializationError> {
        if !self.first {
            self.writer.write_all(b",")?;
        }
        self.first = false;
        serde_json::to_writer(&mut self.writer, entity)?;
        Ok(())
    }

    /// Close the array and flush
    pub fn finish(mut self) -> Result<(), SerializationError> {
        self.writer.write_all(b"]")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Write every entity in the chosen layout, returning how many were written.
pub fn write_entities<W, I>(writer: W, entities: I, format: OutputFormat) -> Result<usize, SerializationError>
where
    W: Write,
    I: IntoIterator<Item = Entity>,
{
    let mut count = 0;
    match format {
        OutputFormat::Ndjson => {
            let mut out = NdjsonWriter::new(writer);
            for entity in entities {
                out.write(&entity)?;
                count += 1;
            }
            out.flush()?;
        }
        OutputFormat::Json => {
            let mut out = JsonArrayWriter::new(writer)?;
            for entity in entities {
                out.write(&entity)?;
                count += 1;
            }
            out.finish()?;
        }
    }
    Ok(count)
}
