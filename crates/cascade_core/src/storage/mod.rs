//! Interface to the partitioned columnar store.
//!
//! Stored columns are addressed by key and split into chunks according to a
//! row layout. Every column of a stored frame shares the same layout, which is
//! what lets the materializer hand a frame one chunk per input column for each
//! partition.

pub mod chunk;
pub mod layout;
pub mod memory;

use std::fmt::{self, Debug};
use std::sync::Arc;

use cascade_error::{FunctionError, Result};
use tracing::debug;
use uuid::Uuid;

use self::chunk::Chunk;
use self::layout::RowLayout;
use crate::datatype::ColumnType;
use crate::engine::scope::Scope;
use crate::frame::materialized::MaterializedFrame;

/// Key of a stored frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameKey(Uuid);

impl FrameKey {
    pub fn new_v4() -> Self {
        FrameKey(Uuid::new_v4())
    }
}

impl fmt::Display for FrameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame_{}", self.0.simple())
    }
}

/// Key of a stored column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey(Uuid);

impl ColumnKey {
    pub fn new_v4() -> Self {
        ColumnKey(Uuid::new_v4())
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col_{}", self.0.simple())
    }
}

/// A stored column split into per-partition chunks.
#[derive(Debug, Clone)]
pub struct ColumnVec {
    pub key: ColumnKey,
    pub column_type: ColumnType,
    /// Labels for categorical codes.
    pub domain: Option<Arc<[String]>>,
    pub layout: Arc<RowLayout>,
    pub chunks: Vec<Arc<Chunk>>,
}

impl ColumnVec {
    /// Create a new column, checking that the chunks agree with the layout
    /// and column type.
    pub fn try_new(
        key: ColumnKey,
        column_type: ColumnType,
        domain: Option<Arc<[String]>>,
        layout: Arc<RowLayout>,
        chunks: Vec<Arc<Chunk>>,
    ) -> Result<Self> {
        if chunks.len() != layout.num_partitions() {
            return Err(FunctionError::runtime(format!(
                "Column {key} has {} chunks, layout expects {}",
                chunks.len(),
                layout.num_partitions()
            )));
        }

        for (partition, chunk) in chunks.iter().enumerate() {
            if chunk.kind() != column_type.value_kind() {
                return Err(FunctionError::runtime(format!(
                    "Chunk {partition} of column {key} holds {} values, column type {column_type} expects {}",
                    chunk.kind(),
                    column_type.value_kind(),
                )));
            }
            if chunk.len() != layout.partition_len(partition) {
                return Err(FunctionError::runtime(format!(
                    "Chunk {partition} of column {key} has {} rows, layout expects {}",
                    chunk.len(),
                    layout.partition_len(partition),
                )));
            }
        }

        Ok(ColumnVec {
            key,
            column_type,
            domain,
            layout,
            chunks,
        })
    }

    pub fn num_rows(&self) -> u64 {
        self.layout.num_rows()
    }

    pub fn chunk(&self, partition: usize) -> Result<&Arc<Chunk>> {
        self.chunks.get(partition).ok_or_else(|| {
            FunctionError::runtime(format!(
                "Missing chunk {partition} for column {}, column has {} chunks",
                self.key,
                self.chunks.len()
            ))
        })
    }
}

/// Schema record for a stored frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFrame {
    pub key: FrameKey,
    pub num_rows: u64,
    pub names: Vec<String>,
    pub columns: Vec<ColumnKey>,
}

/// Key-addressed column storage.
pub trait ColumnStore: Debug + Sync + Send {
    /// Get a column by key.
    fn column(&self, key: &ColumnKey) -> Result<Arc<ColumnVec>>;

    /// Get a frame's schema record by key.
    fn frame(&self, key: &FrameKey) -> Result<Arc<StoredFrame>>;

    /// Allocate keys for `n` new columns.
    fn allocate_column_keys(&self, n: usize) -> Vec<ColumnKey>;

    /// Publish a frame along with all its columns.
    ///
    /// Either everything becomes visible or nothing does. The frame's column
    /// keys must match `columns` in order.
    fn commit(&self, frame: StoredFrame, columns: Vec<ColumnVec>) -> Result<()>;

    /// Replace a single chunk of a stored column.
    ///
    /// The replacement must have the same kind and length as the existing
    /// chunk. Readers holding the previous chunk are unaffected.
    fn update_chunk(&self, key: &ColumnKey, partition: usize, chunk: Chunk) -> Result<()>;

    /// Remove a frame and all of its columns.
    fn remove_frame(&self, key: &FrameKey) -> Result<()>;
}

/// Full-length values for a column being loaded into the store.
#[derive(Debug, Clone)]
pub struct ColumnData {
    pub name: String,
    pub column_type: ColumnType,
    pub domain: Option<Arc<[String]>>,
    pub values: Chunk,
}

impl ColumnData {
    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        ColumnData {
            name: name.into(),
            column_type: ColumnType::Numeric,
            domain: None,
            values: Chunk::Numeric(values.into_iter().collect()),
        }
    }

    pub fn text<S>(name: impl Into<String>, values: impl IntoIterator<Item = Option<S>>) -> Self
    where
        S: Into<String>,
    {
        ColumnData {
            name: name.into(),
            column_type: ColumnType::Text,
            domain: None,
            values: Chunk::Text(values.into_iter().map(|v| v.map(Into::into)).collect()),
        }
    }

    pub fn categorical(
        name: impl Into<String>,
        codes: impl IntoIterator<Item = f64>,
        domain: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        ColumnData {
            name: name.into(),
            column_type: ColumnType::Categorical,
            domain: Some(domain.into_iter().map(Into::into).collect()),
            values: Chunk::Numeric(codes.into_iter().collect()),
        }
    }
}

/// Load columns into the store as a new frame, partitioned by the session's
/// configured chunk size.
pub fn ingest(scope: &Scope, columns: Vec<ColumnData>) -> Result<MaterializedFrame> {
    let num_rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
    let layout = RowLayout::even(num_rows as u64, scope.config().chunk_rows)?;
    ingest_with_layout(scope, columns, layout)
}

/// Load columns into the store as a new frame using an explicit layout.
pub fn ingest_with_layout(
    scope: &Scope,
    columns: Vec<ColumnData>,
    layout: RowLayout,
) -> Result<MaterializedFrame> {
    let store = scope.store();
    let layout = Arc::new(layout);
    let keys = store.allocate_column_keys(columns.len());

    let mut names = Vec::with_capacity(columns.len());
    let mut vecs = Vec::with_capacity(columns.len());

    for (data, key) in columns.into_iter().zip(&keys) {
        if data.values.len() as u64 != layout.num_rows() {
            return Err(FunctionError::runtime(format!(
                "Column '{}' has {} rows, layout expects {}",
                data.name,
                data.values.len(),
                layout.num_rows()
            )));
        }

        let chunks = (0..layout.num_partitions())
            .map(|p| {
                let range = layout.partition_range(p);
                let chunk = data
                    .values
                    .slice((range.start as usize)..(range.end as usize))?;
                Ok(Arc::new(chunk))
            })
            .collect::<Result<Vec<_>>>()?;

        names.push(data.name);
        vecs.push(ColumnVec::try_new(
            *key,
            data.column_type,
            data.domain,
            layout.clone(),
            chunks,
        )?);
    }

    let frame = StoredFrame {
        key: scope.mint_key(),
        num_rows: layout.num_rows(),
        names,
        columns: keys,
    };
    debug!(key = %frame.key, rows = frame.num_rows, cols = frame.columns.len(), partitions = layout.num_partitions(), "ingesting frame");

    let materialized = MaterializedFrame::from_parts(&frame, &vecs);
    store.commit(frame, vecs)?;

    Ok(materialized)
}
