use std::sync::Arc;

use cascade_error::{FunctionError, Result};

use super::{ChunkInputs, ChunkReader, LazyFrame};
use crate::datatype::ColumnType;
use crate::storage::chunk::Chunk;
use crate::storage::{ColumnKey, ColumnStore, ColumnVec, FrameKey, StoredFrame};

#[derive(Debug, Clone)]
struct MaterializedColumn {
    key: ColumnKey,
    name: String,
    column_type: ColumnType,
    domain: Option<Arc<[String]>>,
}

/// A frame whose columns already exist in the store.
///
/// Only the schema is held here, cell data is always read through the store
/// by column key.
#[derive(Debug, Clone)]
pub struct MaterializedFrame {
    key: FrameKey,
    num_rows: u64,
    columns: Arc<[MaterializedColumn]>,
}

impl MaterializedFrame {
    /// Open a frame that exists in the store.
    pub fn open(store: &dyn ColumnStore, key: &FrameKey) -> Result<Self> {
        let frame = store.frame(key)?;
        let vecs = frame
            .columns
            .iter()
            .map(|key| store.column(key).map(|c| ColumnVec::clone(&c)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_parts(&frame, &vecs))
    }

    /// Build from a frame record and its columns, in order.
    pub(crate) fn from_parts(frame: &StoredFrame, columns: &[ColumnVec]) -> Self {
        let columns = frame
            .names
            .iter()
            .zip(columns)
            .map(|(name, col)| MaterializedColumn {
                key: col.key,
                name: name.clone(),
                column_type: col.column_type,
                domain: col.domain.clone(),
            })
            .collect();

        MaterializedFrame {
            key: frame.key,
            num_rows: frame.num_rows,
            columns,
        }
    }

    pub fn key(&self) -> &FrameKey {
        &self.key
    }

    pub fn column_key(&self, col: usize) -> &ColumnKey {
        &self.columns[col].key
    }

    pub fn column_keys(&self) -> impl ExactSizeIterator<Item = &ColumnKey> + '_ {
        self.columns.iter().map(|c| &c.key)
    }

    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Read all values of a numeric-like column across every partition.
    pub fn collect_numeric(&self, store: &dyn ColumnStore, col: usize) -> Result<Vec<f64>> {
        let vec = self.stored_column(store, col)?;
        let mut out = Vec::with_capacity(self.num_rows as usize);
        for chunk in &vec.chunks {
            match chunk.as_ref() {
                Chunk::Numeric(values) => out.extend_from_slice(values),
                Chunk::Text(_) => {
                    return Err(FunctionError::runtime(format!(
                        "Column '{}' is not numeric",
                        self.columns[col].name
                    )));
                }
            }
        }
        Ok(out)
    }

    /// Read all values of a text-like column across every partition.
    pub fn collect_text(
        &self,
        store: &dyn ColumnStore,
        col: usize,
    ) -> Result<Vec<Option<String>>> {
        let vec = self.stored_column(store, col)?;
        let mut out = Vec::with_capacity(self.num_rows as usize);
        for chunk in &vec.chunks {
            match chunk.as_ref() {
                Chunk::Text(values) => out.extend_from_slice(values),
                Chunk::Numeric(_) => {
                    return Err(FunctionError::runtime(format!(
                        "Column '{}' is not text",
                        self.columns[col].name
                    )));
                }
            }
        }
        Ok(out)
    }

    fn stored_column(&self, store: &dyn ColumnStore, col: usize) -> Result<Arc<ColumnVec>> {
        let column = self.columns.get(col).ok_or_else(|| {
            FunctionError::runtime(format!(
                "Column index {col} out of bounds for frame with {} columns",
                self.columns.len()
            ))
        })?;
        store.column(&column.key)
    }
}

impl LazyFrame for MaterializedFrame {
    fn num_cols(&self) -> usize {
        self.columns.len()
    }

    fn num_rows(&self) -> u64 {
        self.num_rows
    }

    fn column_type(&self, col: usize) -> ColumnType {
        self.columns[col].column_type
    }

    fn name(&self, col: usize) -> &str {
        &self.columns[col].name
    }

    fn domain(&self, col: usize) -> Option<Arc<[String]>> {
        self.columns[col].domain.clone()
    }

    fn prepare_inputs(&self, inputs: &mut Vec<ColumnKey>) {
        inputs.extend(self.columns.iter().map(|c| c.key));
    }

    fn prepare_per_chunk<'a>(
        &'a self,
        chunks: &mut ChunkInputs<'a>,
    ) -> Result<Box<dyn ChunkReader + 'a>> {
        let chunks = chunks.take(self.columns.len())?;
        Ok(Box::new(StoredChunkReader { chunks }))
    }

    fn as_materialized(&self) -> Option<&MaterializedFrame> {
        Some(self)
    }
}

#[derive(Debug)]
struct StoredChunkReader<'a> {
    chunks: &'a [Arc<Chunk>],
}

impl ChunkReader for StoredChunkReader<'_> {
    fn num_value(&mut self, row: usize, col: usize) -> Result<f64> {
        self.chunks[col].try_num(row)
    }

    fn text_value(&mut self, row: usize, col: usize) -> Result<Option<String>> {
        Ok(self.chunks[col].try_text(row)?.map(str::to_string))
    }
}
