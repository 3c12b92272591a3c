use cascade_error::{FunctionError, Result};

use super::{ChunkInputs, ChunkReader, FrameRef, LazyFrame, check_column};
use crate::datatype::{ColumnType, ValueKind};
use crate::storage::ColumnKey;

const STAT_NAMES: [&str; 4] = ["sum", "mean", "min", "max"];

/// Row-wise statistics over a set of numeric columns of a frame.
///
/// Produces the columns `sum`, `mean`, `min` and `max`. A missing (NaN) input
/// makes every statistic for that row missing.
#[derive(Debug, Clone)]
pub struct RowStatsFrame {
    source: FrameRef,
    columns: Vec<usize>,
}

impl RowStatsFrame {
    /// Compute statistics over every numeric-like column of `source`.
    pub fn try_new(source: FrameRef) -> Result<Self> {
        let columns = (0..source.num_cols())
            .filter(|&col| source.column_type(col).value_kind() == ValueKind::Numeric)
            .collect();
        Self::try_new_with_columns(source, columns)
    }

    pub fn try_new_with_columns(source: FrameRef, columns: Vec<usize>) -> Result<Self> {
        if columns.is_empty() {
            return Err(FunctionError::runtime(
                "Row statistics require at least one numeric column",
            ));
        }
        for &col in &columns {
            check_column(source.as_ref(), col)?;
            if source.column_type(col).value_kind() != ValueKind::Numeric {
                return Err(FunctionError::runtime(format!(
                    "Column '{}' is not numeric",
                    source.name(col)
                )));
            }
        }
        Ok(RowStatsFrame { source, columns })
    }
}

impl LazyFrame for RowStatsFrame {
    fn num_cols(&self) -> usize {
        STAT_NAMES.len()
    }

    fn num_rows(&self) -> u64 {
        self.source.num_rows()
    }

    fn column_type(&self, col: usize) -> ColumnType {
        assert!(col < STAT_NAMES.len(), "column index out of bounds");
        ColumnType::Numeric
    }

    fn name(&self, col: usize) -> &str {
        STAT_NAMES[col]
    }

    fn prepare_inputs(&self, inputs: &mut Vec<ColumnKey>) {
        self.source.prepare_inputs(inputs);
    }

    fn prepare_per_chunk<'a>(
        &'a self,
        chunks: &mut ChunkInputs<'a>,
    ) -> Result<Box<dyn ChunkReader + 'a>> {
        let source = self.source.prepare_per_chunk(chunks)?;
        Ok(Box::new(RowStatsReader {
            source,
            columns: &self.columns,
            row: None,
            stats: [f64::NAN; 4],
        }))
    }
}

struct RowStatsReader<'a> {
    source: Box<dyn ChunkReader + 'a>,
    columns: &'a [usize],
    /// Row the cached stats were computed for.
    row: Option<usize>,
    stats: [f64; 4],
}

impl RowStatsReader<'_> {
    fn compute(&mut self, row: usize) -> Result<()> {
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut missing = false;

        for &col in self.columns {
            let v = self.source.num_value(row, col)?;
            if v.is_nan() {
                missing = true;
                break;
            }
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        self.stats = if missing {
            [f64::NAN; 4]
        } else {
            [sum, sum / self.columns.len() as f64, min, max]
        };
        self.row = Some(row);

        Ok(())
    }
}

impl ChunkReader for RowStatsReader<'_> {
    fn num_value(&mut self, row: usize, col: usize) -> Result<f64> {
        if self.row != Some(row) {
            self.compute(row)?;
        }
        Ok(self.stats[col])
    }
}
