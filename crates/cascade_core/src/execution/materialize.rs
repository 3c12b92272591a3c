use std::sync::Arc;

use cascade_error::{FunctionError, Result};
use tracing::{debug, trace};

use super::execute_partitions;
use crate::datatype::{ColumnType, ValueKind};
use crate::engine::scope::Scope;
use crate::frame::materialized::MaterializedFrame;
use crate::frame::{ChunkInputs, LazyFrame};
use crate::storage::chunk::{Chunk, ChunkBuilder};
use crate::storage::layout::RowLayout;
use crate::storage::{ColumnVec, FrameKey, StoredFrame};

/// Output columns of a frame split by how their values are produced.
///
/// Decided once from the frame's declared schema before any row is read.
#[derive(Debug)]
struct OutputPlan {
    types: Vec<ColumnType>,
    names: Vec<String>,
    domains: Vec<Option<Arc<[String]>>>,
    numeric: Vec<usize>,
    text: Vec<usize>,
}

impl OutputPlan {
    fn new(frame: &dyn LazyFrame) -> Self {
        let num_cols = frame.num_cols();
        let mut plan = OutputPlan {
            types: Vec::with_capacity(num_cols),
            names: Vec::with_capacity(num_cols),
            domains: Vec::with_capacity(num_cols),
            numeric: Vec::new(),
            text: Vec::new(),
        };

        for col in 0..num_cols {
            let column_type = frame.column_type(col);
            plan.types.push(column_type);
            plan.names.push(frame.name(col).to_string());
            // Domains only make sense for categorical columns. Frames that
            // can't know their labels up front report none.
            plan.domains.push(match column_type {
                ColumnType::Categorical => frame.domain(col),
                _ => None,
            });

            match column_type.value_kind() {
                ValueKind::Numeric => plan.numeric.push(col),
                ValueKind::Text => plan.text.push(col),
            }
        }

        plan
    }
}

/// Compute every cell of `frame`, producing a new frame in the store.
///
/// Inputs are read partition by partition on the scope's thread pool. The new
/// frame is committed only after every partition succeeded, and has the same
/// column names, types and row count as `frame`.
pub fn materialize(frame: &dyn LazyFrame, scope: &Scope) -> Result<MaterializedFrame> {
    let mut input_keys = Vec::new();
    frame.prepare_inputs(&mut input_keys);

    let plan = OutputPlan::new(frame);
    let store = scope.store();

    let inputs = input_keys
        .iter()
        .map(|key| store.column(key))
        .collect::<Result<Vec<_>>>()?;
    let layout = input_layout(frame, &inputs, scope.config().chunk_rows)?;

    let key = scope.mint_key();
    debug!(
        %key,
        inputs = inputs.len(),
        cols = plan.types.len(),
        rows = layout.num_rows(),
        partitions = layout.num_partitions(),
        "materializing frame"
    );

    let verify = cfg!(debug_assertions) || scope.config().verify_inputs;
    let outputs = execute_partitions(scope.pool(), layout.num_partitions(), |partition| {
        let chunks = inputs
            .iter()
            .map(|col| col.chunk(partition).cloned())
            .collect::<Result<Vec<_>>>()?;
        materialize_partition(frame, &plan, &chunks, layout.partition_len(partition), verify)
    })?;

    // All partitions succeeded, assemble and publish.
    let materialized = commit_partitions(
        scope,
        key,
        plan.names,
        plan.types.into_iter().zip(plan.domains).collect(),
        layout,
        outputs,
    )?;
    debug!(%key, "committed materialized frame");

    Ok(materialized)
}

/// Assemble per-partition output chunks into columns and commit them as a
/// single frame.
///
/// `outputs` holds one entry per partition, each with one chunk per column.
pub(crate) fn commit_partitions(
    scope: &Scope,
    key: FrameKey,
    names: Vec<String>,
    schema: Vec<(ColumnType, Option<Arc<[String]>>)>,
    layout: Arc<RowLayout>,
    outputs: Vec<Vec<Chunk>>,
) -> Result<MaterializedFrame> {
    let store = scope.store();
    let column_keys = store.allocate_column_keys(schema.len());
    let mut partition_chunks: Vec<_> = outputs.into_iter().map(Vec::into_iter).collect();

    let mut columns = Vec::with_capacity(schema.len());
    for ((column_type, domain), column_key) in schema.into_iter().zip(&column_keys) {
        let chunks = partition_chunks
            .iter_mut()
            .map(|chunks| {
                chunks
                    .next()
                    .map(Arc::new)
                    .ok_or_else(|| FunctionError::runtime("Partition produced too few columns"))
            })
            .collect::<Result<Vec<_>>>()?;

        columns.push(ColumnVec::try_new(
            *column_key,
            column_type,
            domain,
            layout.clone(),
            chunks,
        )?);
    }

    let stored = StoredFrame {
        key,
        num_rows: layout.num_rows(),
        names,
        columns: column_keys,
    };
    let materialized = MaterializedFrame::from_parts(&stored, &columns);
    store.commit(stored, columns)?;

    Ok(materialized)
}

/// Determine the partitioning to execute on.
///
/// Every input column has to share a single layout. Frames that read no
/// stored columns get an even layout over their declared row count.
fn input_layout(
    frame: &dyn LazyFrame,
    inputs: &[Arc<ColumnVec>],
    chunk_rows: usize,
) -> Result<Arc<RowLayout>> {
    let layout = match inputs.first() {
        Some(first) => {
            if let Some(other) = inputs[1..]
                .iter()
                .find(|col| !Arc::ptr_eq(&col.layout, &first.layout) && col.layout != first.layout)
            {
                return Err(FunctionError::runtime(format!(
                    "Input columns {} and {} have incompatible partition layouts",
                    first.key, other.key
                )));
            }
            first.layout.clone()
        }
        None => Arc::new(RowLayout::even(frame.num_rows(), chunk_rows)?),
    };

    if layout.num_rows() != frame.num_rows() {
        return Err(FunctionError::runtime(format!(
            "Frame declares {} rows, its inputs have {}",
            frame.num_rows(),
            layout.num_rows()
        )));
    }

    Ok(layout)
}

/// Compute all output chunks for a single partition.
fn materialize_partition(
    frame: &dyn LazyFrame,
    plan: &OutputPlan,
    chunks: &[Arc<Chunk>],
    num_rows: usize,
    verify: bool,
) -> Result<Vec<Chunk>> {
    let mut inputs = ChunkInputs::new(chunks);
    let mut reader = frame.prepare_per_chunk(&mut inputs)?;

    if verify && !inputs.is_exhausted() {
        return Err(FunctionError::runtime(format!(
            "Frame consumed {} of {} input chunks",
            inputs.position(),
            inputs.len()
        )));
    }

    let mut builders: Vec<_> = plan
        .types
        .iter()
        .map(|t| ChunkBuilder::with_capacity(t.value_kind(), num_rows))
        .collect();

    for row in 0..num_rows {
        for &col in &plan.numeric {
            let value = reader.num_value(row, col)?;
            builders[col].push_num(value)?;
        }
        for &col in &plan.text {
            let value = reader.text_value(row, col)?;
            builders[col].push_text(value)?;
        }
    }
    trace!(rows = num_rows, "materialized partition");

    Ok(builders.into_iter().map(ChunkBuilder::finish).collect())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cascade_error::ErrorKind;
    use parking_lot::Mutex;

    use super::*;
    use crate::frame::binary::{BinaryOpFrame, BinaryOperator, Operand};
    use crate::frame::cbind::CbindFrame;
    use crate::frame::{ChunkReader, FrameRef};
    use crate::storage::{ColumnData, ColumnKey, ingest, ingest_with_layout};
    use crate::testutil::{numeric, read_numeric, read_text, test_scope, text};

    #[test]
    fn sum_of_two_columns() {
        let scope = test_scope();
        let leaf: FrameRef = Arc::new(
            ingest(
                &scope,
                vec![
                    ColumnData::numeric("a", [1.0, 2.0, 3.0]),
                    ColumnData::numeric("b", [10.0, 20.0, 30.0]),
                ],
            )
            .unwrap(),
        );

        let sum = BinaryOpFrame::try_new(
            "sum",
            BinaryOperator::Add,
            Operand::column(leaf.clone(), 0),
            Operand::column(leaf, 1),
        )
        .unwrap();

        let out = materialize(&sum, &scope).unwrap();
        assert_eq!(3, out.num_rows());
        assert_eq!(1, out.num_cols());
        assert_eq!(ColumnType::Numeric, out.column_type(0));
        assert_eq!("sum", out.name(0));
        assert_eq!(
            vec![11.0, 22.0, 33.0],
            out.collect_numeric(scope.store().as_ref(), 0).unwrap()
        );
    }

    #[test]
    fn materialize_twice_distinct_keys() {
        let scope = test_scope();
        let frame = numeric(&scope, "a", &[1.0, 2.0]);

        let m1 = materialize(&frame, &scope).unwrap();
        let m2 = materialize(&frame, &scope).unwrap();
        assert_ne!(m1.key(), m2.key());
        assert_ne!(m1.column_key(0), m2.column_key(0));
        assert_eq!(read_numeric(&scope, &m1, 0), read_numeric(&scope, &m2, 0));
    }

    #[test]
    fn text_values_with_nulls() {
        let scope = test_scope();
        let frame = text(&scope, "t", &[Some("a"), None, Some("c"), None, Some("e")]);

        let out = materialize(&frame, &scope).unwrap();
        assert_eq!(read_text(&scope, &frame, 0), read_text(&scope, &out, 0));
    }

    #[test]
    fn schema_preserved() {
        let scope = test_scope();
        let frame = ingest(
            &scope,
            vec![
                ColumnData::text("name", [Some("a"), None, Some("c")]),
                ColumnData::categorical("cat", [0.0, 1.0, 0.0], ["lo", "hi"]),
                ColumnData::numeric("x", [0.5, 1.5, 2.5]),
            ],
        )
        .unwrap();

        let out = materialize(&frame, &scope).unwrap();
        assert_eq!(frame.num_cols(), out.num_cols());
        assert_eq!(frame.num_rows(), out.num_rows());
        for col in 0..frame.num_cols() {
            assert_eq!(frame.column_type(col), out.column_type(col));
            assert_eq!(frame.name(col), out.name(col));
        }
        assert_eq!(
            vec!["lo".to_string(), "hi".to_string()],
            out.domain(1).unwrap().to_vec()
        );
    }

    #[test]
    fn zero_rows() {
        let scope = test_scope();
        let frame = ingest(&scope, vec![ColumnData::numeric("a", [])]).unwrap();
        let out = materialize(&frame, &scope).unwrap();
        assert_eq!(0, out.num_rows());
        assert!(
            out.collect_numeric(scope.store().as_ref(), 0)
                .unwrap()
                .is_empty()
        );
    }

    /// Frame with no stored inputs that records which accessor was used for
    /// which column.
    #[derive(Debug)]
    struct RecordingFrame {
        types: Vec<ColumnType>,
        rows: u64,
        wrong_accessor: Arc<AtomicUsize>,
        rows_seen: Arc<Mutex<Vec<usize>>>,
    }

    struct RecordingReader<'a> {
        frame: &'a RecordingFrame,
        last_row: Option<usize>,
    }

    impl RecordingReader<'_> {
        fn observe(&mut self, row: usize, col: usize, kind: ValueKind) {
            if self.frame.types[col].value_kind() != kind {
                self.frame.wrong_accessor.fetch_add(1, Ordering::SeqCst);
            }
            if let Some(last) = self.last_row {
                assert!(row >= last, "rows must be non-decreasing");
            }
            if self.last_row != Some(row) {
                self.frame.rows_seen.lock().push(row);
            }
            self.last_row = Some(row);
        }
    }

    impl ChunkReader for RecordingReader<'_> {
        fn num_value(&mut self, row: usize, col: usize) -> Result<f64> {
            self.observe(row, col, ValueKind::Numeric);
            Ok(row as f64)
        }

        fn text_value(&mut self, row: usize, col: usize) -> Result<Option<String>> {
            self.observe(row, col, ValueKind::Text);
            Ok(Some(format!("r{row}")))
        }
    }

    impl LazyFrame for RecordingFrame {
        fn num_cols(&self) -> usize {
            self.types.len()
        }

        fn num_rows(&self) -> u64 {
            self.rows
        }

        fn column_type(&self, col: usize) -> ColumnType {
            self.types[col]
        }

        fn name(&self, col: usize) -> &str {
            ["c0", "c1", "c2", "c3"][col]
        }

        fn prepare_inputs(&self, _inputs: &mut Vec<ColumnKey>) {}

        fn prepare_per_chunk<'a>(
            &'a self,
            _chunks: &mut ChunkInputs<'a>,
        ) -> Result<Box<dyn ChunkReader + 'a>> {
            Ok(Box::new(RecordingReader {
                frame: self,
                last_row: None,
            }))
        }
    }

    #[test]
    fn accessors_match_column_kinds() {
        let scope = test_scope();
        let frame = RecordingFrame {
            types: vec![
                ColumnType::Text,
                ColumnType::Numeric,
                ColumnType::Uuid,
                ColumnType::Time,
            ],
            rows: 5,
            wrong_accessor: Arc::new(AtomicUsize::new(0)),
            rows_seen: Arc::new(Mutex::new(Vec::new())),
        };

        let out = materialize(&frame, &scope).unwrap();
        assert_eq!(0, frame.wrong_accessor.load(Ordering::SeqCst));

        // Test scope uses 2 rows per chunk, rows are partition-local.
        let mut rows = frame.rows_seen.lock().clone();
        rows.sort();
        assert_eq!(vec![0, 0, 0, 1, 1], rows);

        let store = scope.store().as_ref();
        assert_eq!(
            vec![0.0, 1.0, 0.0, 1.0, 0.0],
            out.collect_numeric(store, 3).unwrap()
        );
        assert_eq!(Some("r1".to_string()), out.collect_text(store, 0).unwrap()[3]);
    }

    #[derive(Debug)]
    struct FailingFrame {
        source: FrameRef,
        fail_above: f64,
    }

    struct FailingReader<'a> {
        source: Box<dyn ChunkReader + 'a>,
        fail_above: f64,
    }

    impl ChunkReader for FailingReader<'_> {
        fn num_value(&mut self, row: usize, col: usize) -> Result<f64> {
            let v = self.source.num_value(row, col)?;
            if v > self.fail_above {
                return Err(FunctionError::runtime(format!("value {v} too large")));
            }
            Ok(v)
        }
    }

    impl LazyFrame for FailingFrame {
        fn num_cols(&self) -> usize {
            self.source.num_cols()
        }

        fn num_rows(&self) -> u64 {
            self.source.num_rows()
        }

        fn column_type(&self, col: usize) -> ColumnType {
            self.source.column_type(col)
        }

        fn name(&self, col: usize) -> &str {
            self.source.name(col)
        }

        fn prepare_inputs(&self, inputs: &mut Vec<ColumnKey>) {
            self.source.prepare_inputs(inputs);
        }

        fn prepare_per_chunk<'a>(
            &'a self,
            chunks: &mut ChunkInputs<'a>,
        ) -> Result<Box<dyn ChunkReader + 'a>> {
            Ok(Box::new(FailingReader {
                source: self.source.prepare_per_chunk(chunks)?,
                fail_above: self.fail_above,
            }))
        }
    }

    #[test]
    fn failure_commits_nothing() {
        let scope = test_scope();
        let source = ingest(
            &scope,
            vec![ColumnData::numeric("a", [1.0, 2.0, 3.0, 4.0, 5.0])],
        )
        .unwrap();
        let store = scope.store();
        let columns_before = store_columns(&scope);

        let frame = FailingFrame {
            source: Arc::new(source),
            fail_above: 2.0,
        };
        let err = materialize(&frame, &scope).unwrap_err();
        assert_eq!(ErrorKind::Runtime, err.kind());
        // Partitions [3, 4] and [5] both fail.
        assert!(err.message().starts_with("2 of 3 partitions failed"));

        assert_eq!(columns_before, store_columns(&scope));
        let minted = scope.minted_keys();
        store.frame(minted.last().unwrap()).unwrap_err();
    }

    fn store_columns(scope: &Scope) -> usize {
        scope
            .minted_keys()
            .iter()
            .filter_map(|key| scope.store().frame(key).ok())
            .map(|f| f.columns.len())
            .sum()
    }

    /// Frame that declares an input but never takes its chunk.
    #[derive(Debug)]
    struct GreedyFrame {
        source: FrameRef,
    }

    impl LazyFrame for GreedyFrame {
        fn num_cols(&self) -> usize {
            1
        }

        fn num_rows(&self) -> u64 {
            self.source.num_rows()
        }

        fn column_type(&self, _col: usize) -> ColumnType {
            ColumnType::Numeric
        }

        fn name(&self, _col: usize) -> &str {
            "greedy"
        }

        fn prepare_inputs(&self, inputs: &mut Vec<ColumnKey>) {
            self.source.prepare_inputs(inputs);
        }

        fn prepare_per_chunk<'a>(
            &'a self,
            _chunks: &mut ChunkInputs<'a>,
        ) -> Result<Box<dyn ChunkReader + 'a>> {
            struct Nothing;
            impl ChunkReader for Nothing {}
            Ok(Box::new(Nothing))
        }
    }

    #[test]
    fn unconsumed_inputs_rejected() {
        let scope = test_scope();
        let source = ingest(&scope, vec![ColumnData::numeric("a", [1.0])]).unwrap();
        let frame = GreedyFrame {
            source: Arc::new(source),
        };

        let err = materialize(&frame, &scope).unwrap_err();
        assert!(err.message().contains("consumed 0 of 1"));
    }

    #[test]
    fn incompatible_layouts_rejected() {
        let scope = test_scope();
        let a = ingest_with_layout(
            &scope,
            vec![ColumnData::numeric("a", [1.0, 2.0, 3.0])],
            RowLayout::from_lengths([1, 2]),
        )
        .unwrap();
        let b = ingest_with_layout(
            &scope,
            vec![ColumnData::numeric("b", [1.0, 2.0, 3.0])],
            RowLayout::from_lengths([2, 1]),
        )
        .unwrap();

        let frame = CbindFrame::try_new(vec![Arc::new(a), Arc::new(b)]).unwrap();
        let err = materialize(&frame, &scope).unwrap_err();
        assert!(err.message().contains("incompatible partition layouts"));
    }
}
