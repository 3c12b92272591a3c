//! Lazy frames.
//!
//! A lazy frame is a tree. Leaves read stored columns directly, inner nodes
//! compute their cells from child frames. Evaluating a tree happens in two
//! phases that must walk the tree in the same order:
//!
//! 1. `prepare_inputs` appends the keys of every stored column the tree reads
//!    onto a shared list. A node appends its children's inputs (in child
//!    order) followed by any columns it reads itself.
//! 2. For every partition, the materializer fetches one chunk per key in that
//!    list and hands them to `prepare_per_chunk` through a [`ChunkInputs`]
//!    cursor. Each node takes chunks off the cursor in exactly the order it
//!    appended keys in phase 1, so chunk `k` always belongs to the node that
//!    appended key `k`.
//!
//! Per-partition state lives in the [`ChunkReader`] returned from phase 2,
//! never in the frame itself, so a single frame can be evaluated on many
//! partitions concurrently.

pub mod binary;
pub mod cbind;
pub mod materialized;
pub mod row_stats;
pub mod select;

use std::fmt::Debug;
use std::sync::Arc;

use cascade_error::{FunctionError, Result};

use crate::datatype::ColumnType;
use crate::storage::ColumnKey;
use crate::storage::chunk::Chunk;
use materialized::MaterializedFrame;

pub type FrameRef = Arc<dyn LazyFrame>;

pub trait LazyFrame: Debug + Sync + Send {
    /// Number of columns in the frame.
    fn num_cols(&self) -> usize;

    /// Number of rows in the frame.
    fn num_rows(&self) -> u64;

    /// Type of the column at `col`.
    ///
    /// Panics if `col` is out of bounds.
    fn column_type(&self, col: usize) -> ColumnType;

    /// Name of the column at `col`.
    ///
    /// Panics if `col` is out of bounds.
    fn name(&self, col: usize) -> &str;

    /// Labels for a categorical column, if known up front.
    fn domain(&self, _col: usize) -> Option<Arc<[String]>> {
        None
    }

    /// Append the keys of all stored columns this frame reads.
    fn prepare_inputs(&self, inputs: &mut Vec<ColumnKey>);

    /// Take this frame's chunks for the current partition and produce a reader
    /// for it.
    ///
    /// Called once per partition, before any cell is read for that partition.
    fn prepare_per_chunk<'a>(
        &'a self,
        chunks: &mut ChunkInputs<'a>,
    ) -> Result<Box<dyn ChunkReader + 'a>>;

    /// Returns the concrete frame if this frame is already materialized.
    fn as_materialized(&self) -> Option<&MaterializedFrame> {
        None
    }

    /// Index of the first column with the given name.
    ///
    /// This is a linear search.
    fn find_column_by_name(&self, name: &str) -> Option<usize> {
        (0..self.num_cols()).find(|&col| self.name(col) == name)
    }
}

/// Reads cell values for a single partition.
///
/// `row` is the index within the partition. Rows are requested in
/// non-decreasing order, but columns for the same row may be requested in
/// any order. The numeric accessor is only called for columns whose type is
/// numeric-like, the text accessor only for text-like columns.
pub trait ChunkReader {
    fn num_value(&mut self, _row: usize, _col: usize) -> Result<f64> {
        Ok(f64::NAN)
    }

    fn text_value(&mut self, _row: usize, _col: usize) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Cursor over the chunks for a single partition.
///
/// Chunks are positionally aligned with the keys collected by
/// `prepare_inputs`.
#[derive(Debug)]
pub struct ChunkInputs<'a> {
    chunks: &'a [Arc<Chunk>],
    next: usize,
}

impl<'a> ChunkInputs<'a> {
    pub fn new(chunks: &'a [Arc<Chunk>]) -> Self {
        ChunkInputs { chunks, next: 0 }
    }

    /// Take the next `n` chunks.
    pub fn take(&mut self, n: usize) -> Result<&'a [Arc<Chunk>]> {
        let end = self.next + n;
        if end > self.chunks.len() {
            return Err(FunctionError::runtime(format!(
                "Frame requested {n} chunks at position {}, only {} chunks available",
                self.next,
                self.chunks.len()
            )));
        }

        let chunks = &self.chunks[self.next..end];
        self.next = end;
        Ok(chunks)
    }

    /// Take the next chunk.
    pub fn next_chunk(&mut self) -> Result<&'a Chunk> {
        let chunks = self.take(1)?;
        Ok(chunks[0].as_ref())
    }

    /// Position of the next chunk to be taken.
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// If every chunk has been taken.
    pub fn is_exhausted(&self) -> bool {
        self.next == self.chunks.len()
    }
}

/// Check that a column index is valid for a frame.
pub(crate) fn check_column(frame: &dyn LazyFrame, col: usize) -> Result<()> {
    if col >= frame.num_cols() {
        return Err(FunctionError::runtime(format!(
            "Column index {col} out of bounds for frame with {} columns",
            frame.num_cols()
        )));
    }
    Ok(())
}
