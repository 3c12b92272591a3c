use std::sync::Arc;

use cascade_error::{FunctionError, Result};

use super::{ChunkInputs, ChunkReader, FrameRef, LazyFrame};
use crate::datatype::ColumnType;
use crate::storage::ColumnKey;

/// Place the columns of several frames side by side.
///
/// All children must have the same number of rows. Output columns are the
/// columns of the first child, then the second, and so on.
#[derive(Debug, Clone)]
pub struct CbindFrame {
    children: Vec<FrameRef>,
    /// (child, child column) for every output column.
    mapping: Vec<(usize, usize)>,
    num_rows: u64,
}

impl CbindFrame {
    pub fn try_new(children: Vec<FrameRef>) -> Result<Self> {
        let num_rows = match children.first() {
            Some(child) => child.num_rows(),
            None => return Err(FunctionError::runtime("Cannot cbind zero frames")),
        };

        let mut mapping = Vec::new();
        for (idx, child) in children.iter().enumerate() {
            if child.num_rows() != num_rows {
                return Err(FunctionError::runtime(format!(
                    "Frame {idx} has {} rows, expected {num_rows}",
                    child.num_rows()
                )));
            }
            mapping.extend((0..child.num_cols()).map(|col| (idx, col)));
        }

        Ok(CbindFrame {
            children,
            mapping,
            num_rows,
        })
    }

    pub fn children(&self) -> &[FrameRef] {
        &self.children
    }
}

impl LazyFrame for CbindFrame {
    fn num_cols(&self) -> usize {
        self.mapping.len()
    }

    fn num_rows(&self) -> u64 {
        self.num_rows
    }

    fn column_type(&self, col: usize) -> ColumnType {
        let (child, child_col) = self.mapping[col];
        self.children[child].column_type(child_col)
    }

    fn name(&self, col: usize) -> &str {
        let (child, child_col) = self.mapping[col];
        self.children[child].name(child_col)
    }

    fn domain(&self, col: usize) -> Option<Arc<[String]>> {
        let (child, child_col) = self.mapping[col];
        self.children[child].domain(child_col)
    }

    fn prepare_inputs(&self, inputs: &mut Vec<ColumnKey>) {
        for child in &self.children {
            child.prepare_inputs(inputs);
        }
    }

    fn prepare_per_chunk<'a>(
        &'a self,
        chunks: &mut ChunkInputs<'a>,
    ) -> Result<Box<dyn ChunkReader + 'a>> {
        let readers = self
            .children
            .iter()
            .map(|child| child.prepare_per_chunk(chunks))
            .collect::<Result<Vec<_>>>()?;

        Ok(Box::new(CbindReader {
            readers,
            mapping: &self.mapping,
        }))
    }
}

struct CbindReader<'a> {
    readers: Vec<Box<dyn ChunkReader + 'a>>,
    mapping: &'a [(usize, usize)],
}

impl ChunkReader for CbindReader<'_> {
    fn num_value(&mut self, row: usize, col: usize) -> Result<f64> {
        let (child, child_col) = self.mapping[col];
        self.readers[child].num_value(row, child_col)
    }

    fn text_value(&mut self, row: usize, col: usize) -> Result<Option<String>> {
        let (child, child_col) = self.mapping[col];
        self.readers[child].text_value(row, child_col)
    }
}
