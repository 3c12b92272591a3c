use std::ops::Range;

use cascade_error::{FunctionError, Result};

use crate::datatype::ValueKind;

/// Values of a single column within a single partition.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Numeric(Vec<f64>),
    Text(Vec<Option<String>>),
}

impl Chunk {
    pub const fn kind(&self) -> ValueKind {
        match self {
            Chunk::Numeric(_) => ValueKind::Numeric,
            Chunk::Text(_) => ValueKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Chunk::Numeric(v) => v.len(),
            Chunk::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn try_num(&self, row: usize) -> Result<f64> {
        match self {
            Chunk::Numeric(v) => v.get(row).copied().ok_or_else(|| {
                FunctionError::runtime(format!(
                    "Row {row} out of bounds for chunk with {} rows",
                    v.len()
                ))
            }),
            Chunk::Text(_) => Err(FunctionError::runtime(
                "Attempted to read a numeric value from a text chunk",
            )),
        }
    }

    pub fn try_text(&self, row: usize) -> Result<Option<&str>> {
        match self {
            Chunk::Text(v) => v.get(row).map(|s| s.as_deref()).ok_or_else(|| {
                FunctionError::runtime(format!(
                    "Row {row} out of bounds for chunk with {} rows",
                    v.len()
                ))
            }),
            Chunk::Numeric(_) => Err(FunctionError::runtime(
                "Attempted to read a text value from a numeric chunk",
            )),
        }
    }

    /// Copy out the rows in `range`.
    pub fn slice(&self, range: Range<usize>) -> Result<Chunk> {
        if range.end > self.len() || range.start > range.end {
            return Err(FunctionError::runtime(format!(
                "Invalid slice {range:?} for chunk with {} rows",
                self.len()
            )));
        }

        Ok(match self {
            Chunk::Numeric(v) => Chunk::Numeric(v[range].to_vec()),
            Chunk::Text(v) => Chunk::Text(v[range].to_vec()),
        })
    }
}

/// Append-only buffer that produces a chunk.
#[derive(Debug)]
pub struct ChunkBuilder {
    chunk: Chunk,
}

impl ChunkBuilder {
    pub fn with_capacity(kind: ValueKind, capacity: usize) -> Self {
        let chunk = match kind {
            ValueKind::Numeric => Chunk::Numeric(Vec::with_capacity(capacity)),
            ValueKind::Text => Chunk::Text(Vec::with_capacity(capacity)),
        };
        ChunkBuilder { chunk }
    }

    pub fn push_num(&mut self, value: f64) -> Result<()> {
        match &mut self.chunk {
            Chunk::Numeric(v) => {
                v.push(value);
                Ok(())
            }
            Chunk::Text(_) => Err(FunctionError::runtime(
                "Attempted to append a numeric value to a text chunk",
            )),
        }
    }

    pub fn push_text(&mut self, value: Option<String>) -> Result<()> {
        match &mut self.chunk {
            Chunk::Text(v) => {
                v.push(value);
                Ok(())
            }
            Chunk::Numeric(_) => Err(FunctionError::runtime(
                "Attempted to append a text value to a numeric chunk",
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.chunk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunk.is_empty()
    }

    pub fn finish(self) -> Chunk {
        self.chunk
    }
}
