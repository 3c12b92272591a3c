//! Helpers for unit tests.

use std::sync::Arc;

use crate::config::session::SessionConfig;
use crate::engine::scope::Scope;
use crate::engine::session::Session;
use crate::frame::materialized::MaterializedFrame;
use crate::storage::memory::MemoryColumnStore;
use crate::storage::{ColumnData, ingest};

/// Scope over a fresh in-memory store.
///
/// Uses two rows per partition so that even tiny test frames span several
/// partitions.
pub fn test_scope() -> Arc<Scope> {
    logutil::init_test();

    let config = SessionConfig {
        threads: 2,
        chunk_rows: 2,
        verify_inputs: true,
    };
    let session = Session::try_new(config, Arc::new(MemoryColumnStore::new())).unwrap();
    session.new_scope()
}

/// Ingest a single numeric column.
pub fn numeric(scope: &Scope, name: &str, values: &[f64]) -> MaterializedFrame {
    ingest(scope, vec![ColumnData::numeric(name, values.iter().copied())]).unwrap()
}

/// Ingest a single text column.
pub fn text(scope: &Scope, name: &str, values: &[Option<&str>]) -> MaterializedFrame {
    ingest(scope, vec![ColumnData::text(name, values.iter().copied())]).unwrap()
}

pub fn read_numeric(scope: &Scope, frame: &MaterializedFrame, col: usize) -> Vec<f64> {
    frame.collect_numeric(scope.store().as_ref(), col).unwrap()
}

pub fn read_text(scope: &Scope, frame: &MaterializedFrame, col: usize) -> Vec<Option<String>> {
    frame.collect_text(scope.store().as_ref(), col).unwrap()
}
