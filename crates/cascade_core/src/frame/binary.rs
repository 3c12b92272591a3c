use std::fmt;

use cascade_error::{FunctionError, Result};

use super::{ChunkInputs, ChunkReader, FrameRef, LazyFrame, check_column};
use crate::datatype::{ColumnType, ValueKind};
use crate::storage::ColumnKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    /// Floored modulo, result has the sign of the divisor.
    Mod,
    Pow,
    Min,
    Max,
}

impl BinaryOperator {
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOperator::Add => left + right,
            BinaryOperator::Sub => left - right,
            BinaryOperator::Mul => left * right,
            BinaryOperator::Div => left / right,
            BinaryOperator::Mod => left - right * (left / right).floor(),
            BinaryOperator::Pow => left.powf(right),
            // NaN propagates, unlike f64::min/max.
            BinaryOperator::Min => {
                if left.is_nan() || right.is_nan() {
                    f64::NAN
                } else {
                    left.min(right)
                }
            }
            BinaryOperator::Max => {
                if left.is_nan() || right.is_nan() {
                    f64::NAN
                } else {
                    left.max(right)
                }
            }
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "^",
            BinaryOperator::Min => "min",
            BinaryOperator::Max => "max",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone)]
pub enum Operand {
    /// A numeric column of another frame.
    Column { frame: FrameRef, col: usize },
    /// A constant broadcast to every row.
    Scalar(f64),
}

impl Operand {
    pub fn column(frame: FrameRef, col: usize) -> Self {
        Operand::Column { frame, col }
    }

    fn num_rows(&self) -> Option<u64> {
        match self {
            Operand::Column { frame, .. } => Some(frame.num_rows()),
            Operand::Scalar(_) => None,
        }
    }

    fn prepare_inputs(&self, inputs: &mut Vec<ColumnKey>) {
        if let Operand::Column { frame, .. } = self {
            frame.prepare_inputs(inputs);
        }
    }

    fn prepare_per_chunk<'a>(&'a self, chunks: &mut ChunkInputs<'a>) -> Result<OperandReader<'a>> {
        Ok(match self {
            Operand::Column { frame, col } => OperandReader::Column {
                reader: frame.prepare_per_chunk(chunks)?,
                col: *col,
            },
            Operand::Scalar(v) => OperandReader::Scalar(*v),
        })
    }
}

/// Element-wise arithmetic producing a single numeric column.
#[derive(Debug, Clone)]
pub struct BinaryOpFrame {
    name: String,
    op: BinaryOperator,
    left: Operand,
    right: Operand,
    num_rows: u64,
}

impl BinaryOpFrame {
    pub fn try_new(
        name: impl Into<String>,
        op: BinaryOperator,
        left: Operand,
        right: Operand,
    ) -> Result<Self> {
        for operand in [&left, &right] {
            if let Operand::Column { frame, col } = operand {
                check_column(frame.as_ref(), *col)?;
                let column_type = frame.column_type(*col);
                if column_type.value_kind() != ValueKind::Numeric {
                    return Err(FunctionError::runtime(format!(
                        "Cannot apply '{op}' to {column_type} column '{}'",
                        frame.name(*col)
                    )));
                }
            }
        }

        let num_rows = match (left.num_rows(), right.num_rows()) {
            (Some(l), Some(r)) if l != r => {
                return Err(FunctionError::runtime(format!(
                    "Operands of '{op}' have different row counts: {l} and {r}"
                )));
            }
            (Some(n), _) | (None, Some(n)) => n,
            (None, None) => {
                return Err(FunctionError::runtime(format!(
                    "At least one operand of '{op}' must be a column"
                )));
            }
        };

        Ok(BinaryOpFrame {
            name: name.into(),
            op,
            left,
            right,
            num_rows,
        })
    }
}

impl LazyFrame for BinaryOpFrame {
    fn num_cols(&self) -> usize {
        1
    }

    fn num_rows(&self) -> u64 {
        self.num_rows
    }

    fn column_type(&self, col: usize) -> ColumnType {
        assert_eq!(0, col, "column index out of bounds");
        ColumnType::Numeric
    }

    fn name(&self, col: usize) -> &str {
        assert_eq!(0, col, "column index out of bounds");
        &self.name
    }

    fn prepare_inputs(&self, inputs: &mut Vec<ColumnKey>) {
        self.left.prepare_inputs(inputs);
        self.right.prepare_inputs(inputs);
    }

    fn prepare_per_chunk<'a>(
        &'a self,
        chunks: &mut ChunkInputs<'a>,
    ) -> Result<Box<dyn ChunkReader + 'a>> {
        let left = self.left.prepare_per_chunk(chunks)?;
        let right = self.right.prepare_per_chunk(chunks)?;
        Ok(Box::new(BinaryOpReader {
            op: self.op,
            left,
            right,
        }))
    }
}

enum OperandReader<'a> {
    Column {
        reader: Box<dyn ChunkReader + 'a>,
        col: usize,
    },
    Scalar(f64),
}

impl OperandReader<'_> {
    fn value(&mut self, row: usize) -> Result<f64> {
        match self {
            OperandReader::Column { reader, col } => reader.num_value(row, *col),
            OperandReader::Scalar(v) => Ok(*v),
        }
    }
}

struct BinaryOpReader<'a> {
    op: BinaryOperator,
    left: OperandReader<'a>,
    right: OperandReader<'a>,
}

impl ChunkReader for BinaryOpReader<'_> {
    fn num_value(&mut self, row: usize, _col: usize) -> Result<f64> {
        let left = self.left.value(row)?;
        let right = self.right.value(row)?;
        Ok(self.op.apply(left, right))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::execution::materialize::materialize;
    use crate::storage::{ColumnData, ingest};
    use crate::testutil::test_scope;

    #[test]
    fn operators() {
        assert_eq!(1.0, BinaryOperator::Mod.apply(-3.0, 2.0));
        assert_eq!(8.0, BinaryOperator::Pow.apply(2.0, 3.0));
        assert!(BinaryOperator::Min.apply(f64::NAN, 1.0).is_nan());
        assert_eq!(1.0, BinaryOperator::Min.apply(4.0, 1.0));
    }

    #[test]
    fn scalar_operand() {
        let scope = test_scope();
        let source: FrameRef =
            Arc::new(ingest(&scope, vec![ColumnData::numeric("a", [1.0, 2.0, 3.0])]).unwrap());

        let frame = BinaryOpFrame::try_new(
            "scaled",
            BinaryOperator::Mul,
            Operand::Scalar(10.0),
            Operand::column(source, 0),
        )
        .unwrap();

        let out = materialize(&frame, &scope).unwrap();
        assert_eq!(
            vec![10.0, 20.0, 30.0],
            out.collect_numeric(scope.store().as_ref(), 0).unwrap()
        );
    }

    #[test]
    fn rejects_text_column() {
        let scope = test_scope();
        let source: FrameRef =
            Arc::new(ingest(&scope, vec![ColumnData::text("t", [Some("a")])]).unwrap());

        BinaryOpFrame::try_new(
            "bad",
            BinaryOperator::Add,
            Operand::column(source, 0),
            Operand::Scalar(1.0),
        )
        .unwrap_err();
    }

    #[test]
    fn rejects_two_scalars() {
        BinaryOpFrame::try_new(
            "bad",
            BinaryOperator::Add,
            Operand::Scalar(1.0),
            Operand::Scalar(1.0),
        )
        .unwrap_err();
    }
}
