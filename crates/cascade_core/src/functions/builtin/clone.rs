use std::sync::Arc;

use cascade_error::Result;
use tracing::debug;

use crate::engine::scope::Scope;
use crate::execution::execute_partitions;
use crate::execution::materialize::{commit_partitions, materialize};
use crate::frame::LazyFrame;
use crate::frame::materialized::MaterializedFrame;
use crate::functions::{Function, check_arity, frame_arg};
use crate::storage::chunk::Chunk;
use crate::storage::layout::RowLayout;
use crate::value::Value;

/// `clone(frame)`: an independent, materialized copy of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FnClone;

impl Function for FnClone {
    fn name(&self) -> &'static str {
        "clone"
    }

    fn apply(&self, scope: &Scope, args: &[Value]) -> Result<Value> {
        check_arity(self.name(), args, 1)?;
        let frame = frame_arg(self.name(), args, 0)?;
        let cloned = clone_frame(frame.as_ref(), scope)?;
        Ok(Value::from(cloned))
    }
}

/// Produce a materialized copy of `frame` that shares no storage with it.
///
/// Lazy frames describe a fresh computation, so materializing them already
/// yields an independent copy.
pub fn clone_frame(frame: &dyn LazyFrame, scope: &Scope) -> Result<MaterializedFrame> {
    match frame.as_materialized() {
        Some(materialized) => deep_copy(materialized, scope),
        None => materialize(frame, scope),
    }
}

/// Copy the stored columns of a materialized frame partition by partition.
fn deep_copy(source: &MaterializedFrame, scope: &Scope) -> Result<MaterializedFrame> {
    let store = scope.store();
    let columns = source
        .column_keys()
        .map(|key| store.column(key))
        .collect::<Result<Vec<_>>>()?;

    let layout = match columns.first() {
        Some(col) => col.layout.clone(),
        None => Arc::new(RowLayout::even(
            source.num_rows(),
            scope.config().chunk_rows,
        )?),
    };

    let key = scope.mint_key();
    debug!(source = %source.key(), %key, cols = columns.len(), partitions = layout.num_partitions(), "cloning frame");

    let outputs = execute_partitions(scope.pool(), layout.num_partitions(), |partition| {
        columns
            .iter()
            .map(|col| col.chunk(partition).map(|chunk| Chunk::clone(chunk)))
            .collect::<Result<Vec<_>>>()
    })?;

    let names = source.names().map(str::to_string).collect();
    let schema = columns
        .iter()
        .map(|col| (col.column_type, col.domain.clone()))
        .collect();

    commit_partitions(scope, key, names, schema, layout, outputs)
}
