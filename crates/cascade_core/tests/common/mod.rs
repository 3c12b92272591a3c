#![allow(dead_code)]

use std::sync::Arc;

use cascade_core::config::session::SessionConfig;
use cascade_core::engine::scope::Scope;
use cascade_core::engine::session::Session;
use cascade_core::frame::materialized::MaterializedFrame;
use cascade_core::storage::memory::MemoryColumnStore;

/// Scope over a fresh in-memory store with a small partition size.
pub fn scope_with_chunk_rows(chunk_rows: usize) -> Arc<Scope> {
    logutil::init_test();

    let config = SessionConfig {
        threads: 4,
        chunk_rows,
        verify_inputs: true,
    };
    Session::try_new(config, Arc::new(MemoryColumnStore::new()))
        .unwrap()
        .new_scope()
}

pub fn numbers(scope: &Scope, frame: &MaterializedFrame, col: usize) -> Vec<f64> {
    frame.collect_numeric(scope.store().as_ref(), col).unwrap()
}

pub fn texts(scope: &Scope, frame: &MaterializedFrame, col: usize) -> Vec<Option<String>> {
    frame.collect_text(scope.store().as_ref(), col).unwrap()
}
