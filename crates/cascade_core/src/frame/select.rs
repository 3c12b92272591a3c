use std::sync::Arc;

use cascade_error::Result;

use super::{ChunkInputs, ChunkReader, FrameRef, LazyFrame, check_column};
use crate::datatype::ColumnType;
use crate::storage::ColumnKey;

/// Subset and/or reorder the columns of a frame.
///
/// The same source column may be selected more than once.
#[derive(Debug, Clone)]
pub struct ColumnSelectFrame {
    source: FrameRef,
    columns: Vec<usize>,
}

impl ColumnSelectFrame {
    pub fn try_new(source: FrameRef, columns: Vec<usize>) -> Result<Self> {
        for &col in &columns {
            check_column(source.as_ref(), col)?;
        }
        Ok(ColumnSelectFrame { source, columns })
    }

    pub fn source(&self) -> &FrameRef {
        &self.source
    }

    /// Source column index for each output column.
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }
}

impl LazyFrame for ColumnSelectFrame {
    fn num_cols(&self) -> usize {
        self.columns.len()
    }

    fn num_rows(&self) -> u64 {
        self.source.num_rows()
    }

    fn column_type(&self, col: usize) -> ColumnType {
        self.source.column_type(self.columns[col])
    }

    fn name(&self, col: usize) -> &str {
        self.source.name(self.columns[col])
    }

    fn domain(&self, col: usize) -> Option<Arc<[String]>> {
        self.source.domain(self.columns[col])
    }

    fn prepare_inputs(&self, inputs: &mut Vec<ColumnKey>) {
        self.source.prepare_inputs(inputs);
    }

    fn prepare_per_chunk<'a>(
        &'a self,
        chunks: &mut ChunkInputs<'a>,
    ) -> Result<Box<dyn ChunkReader + 'a>> {
        let source = self.source.prepare_per_chunk(chunks)?;
        Ok(Box::new(SelectReader {
            source,
            columns: &self.columns,
        }))
    }
}

struct SelectReader<'a> {
    source: Box<dyn ChunkReader + 'a>,
    columns: &'a [usize],
}

impl ChunkReader for SelectReader<'_> {
    fn num_value(&mut self, row: usize, col: usize) -> Result<f64> {
        self.source.num_value(row, self.columns[col])
    }

    fn text_value(&mut self, row: usize, col: usize) -> Result<Option<String>> {
        self.source.text_value(row, self.columns[col])
    }
}
