use std::sync::Arc;

use cascade_error::{FunctionError, Result};
use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::trace;

use super::chunk::Chunk;
use super::{ColumnKey, ColumnStore, ColumnVec, FrameKey, StoredFrame};

/// Column store keeping everything in memory.
#[derive(Debug, Default)]
pub struct MemoryColumnStore {
    state: RwLock<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    frames: HashMap<FrameKey, Arc<StoredFrame>>,
    columns: HashMap<ColumnKey, Arc<ColumnVec>>,
}

impl MemoryColumnStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_frames(&self) -> usize {
        self.state.read().frames.len()
    }

    pub fn num_columns(&self) -> usize {
        self.state.read().columns.len()
    }
}

impl ColumnStore for MemoryColumnStore {
    fn column(&self, key: &ColumnKey) -> Result<Arc<ColumnVec>> {
        self.state
            .read()
            .columns
            .get(key)
            .cloned()
            .ok_or_else(|| FunctionError::runtime(format!("Missing column '{key}'")))
    }

    fn frame(&self, key: &FrameKey) -> Result<Arc<StoredFrame>> {
        self.state
            .read()
            .frames
            .get(key)
            .cloned()
            .ok_or_else(|| FunctionError::runtime(format!("Missing frame '{key}'")))
    }

    fn allocate_column_keys(&self, n: usize) -> Vec<ColumnKey> {
        (0..n).map(|_| ColumnKey::new_v4()).collect()
    }

    fn commit(&self, frame: StoredFrame, columns: Vec<ColumnVec>) -> Result<()> {
        if frame.names.len() != frame.columns.len() {
            return Err(FunctionError::runtime(format!(
                "Frame {} has {} names for {} columns",
                frame.key,
                frame.names.len(),
                frame.columns.len()
            )));
        }
        if frame.columns.len() != columns.len()
            || frame.columns.iter().zip(&columns).any(|(k, c)| *k != c.key)
        {
            return Err(FunctionError::runtime(format!(
                "Column keys for frame {} do not match the provided columns",
                frame.key
            )));
        }
        if let Some(col) = columns.iter().find(|c| c.num_rows() != frame.num_rows) {
            return Err(FunctionError::runtime(format!(
                "Column {} has {} rows, frame {} has {}",
                col.key,
                col.num_rows(),
                frame.key,
                frame.num_rows
            )));
        }

        let mut state = self.state.write();
        if state.frames.contains_key(&frame.key) {
            return Err(FunctionError::runtime(format!(
                "Frame {} already exists",
                frame.key
            )));
        }
        if let Some(col) = columns.iter().find(|c| state.columns.contains_key(&c.key)) {
            return Err(FunctionError::runtime(format!(
                "Column {} already exists",
                col.key
            )));
        }

        trace!(key = %frame.key, cols = columns.len(), "committing frame");
        for col in columns {
            state.columns.insert(col.key, Arc::new(col));
        }
        state.frames.insert(frame.key, Arc::new(frame));

        Ok(())
    }

    fn update_chunk(&self, key: &ColumnKey, partition: usize, chunk: Chunk) -> Result<()> {
        let mut state = self.state.write();
        let existing = state
            .columns
            .get(key)
            .ok_or_else(|| FunctionError::runtime(format!("Missing column '{key}'")))?;

        let old = existing.chunk(partition)?;
        if old.kind() != chunk.kind() || old.len() != chunk.len() {
            return Err(FunctionError::runtime(format!(
                "Replacement chunk for partition {partition} of column {key} does not match existing chunk"
            )));
        }

        let mut updated = ColumnVec::clone(existing);
        updated.chunks[partition] = Arc::new(chunk);
        state.columns.insert(*key, Arc::new(updated));

        Ok(())
    }

    fn remove_frame(&self, key: &FrameKey) -> Result<()> {
        let mut state = self.state.write();
        let frame = state
            .frames
            .remove(key)
            .ok_or_else(|| FunctionError::runtime(format!("Missing frame '{key}'")))?;
        for col in &frame.columns {
            state.columns.remove(col);
        }
        Ok(())
    }
}
