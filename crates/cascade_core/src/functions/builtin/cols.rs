use std::sync::Arc;

use cascade_error::{FunctionError, Result};

use crate::engine::scope::Scope;
use crate::frame::LazyFrame;
use crate::frame::select::ColumnSelectFrame;
use crate::functions::{Function, check_arity, frame_arg};
use crate::value::Value;

/// `cols(frame, selection)`: lazily select columns of a frame.
///
/// The selection is either a column index, a list of indices, a column name
/// or a list of names. Output columns follow the order of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FnCols;

impl Function for FnCols {
    fn name(&self) -> &'static str {
        "cols"
    }

    fn apply(&self, _scope: &Scope, args: &[Value]) -> Result<Value> {
        check_arity(self.name(), args, 2)?;
        let frame = frame_arg(self.name(), args, 0)?;

        let columns = match &args[1] {
            Value::Number(idx) => vec![column_index(frame.as_ref(), *idx)?],
            Value::Numbers(indices) => indices
                .iter()
                .map(|idx| column_index(frame.as_ref(), *idx))
                .collect::<Result<_>>()?,
            Value::Text(name) => vec![column_by_name(frame.as_ref(), name)?],
            Value::Texts(names) => names
                .iter()
                .map(|name| column_by_name(frame.as_ref(), name))
                .collect::<Result<_>>()?,
            other => {
                return Err(FunctionError::type_error(
                    1,
                    format!(
                        "'cols' expects column indices or names, got {}",
                        other.value_type()
                    ),
                ));
            }
        };

        let selected = ColumnSelectFrame::try_new(frame.clone(), columns)?;
        Ok(Value::Frame(Arc::new(selected)))
    }
}

fn column_index(frame: &dyn LazyFrame, idx: f64) -> Result<usize> {
    if idx.fract() != 0.0 || idx < 0.0 || idx >= frame.num_cols() as f64 {
        return Err(FunctionError::value_error(
            1,
            format!(
                "Column index {idx} is not valid for a frame with {} columns",
                frame.num_cols()
            ),
        ));
    }
    Ok(idx as usize)
}

fn column_by_name(frame: &dyn LazyFrame, name: &str) -> Result<usize> {
    frame
        .find_column_by_name(name)
        .ok_or_else(|| FunctionError::value_error(1, format!("Frame has no column '{name}'")))
}

#[cfg(test)]
mod tests {
    use cascade_error::{ErrorKind, ErrorTarget};

    use super::*;
    use crate::execution::materialize::materialize;
    use crate::functions::Callable;
    use crate::storage::{ColumnData, ingest};
    use crate::testutil::test_scope;

    fn frame_value(scope: &Scope) -> Value {
        Value::from(
            ingest(
                scope,
                vec![
                    ColumnData::numeric("a", [1.0, 2.0, 3.0]),
                    ColumnData::text("b", [Some("x"), Some("y"), None]),
                    ColumnData::numeric("c", [7.0, 8.0, 9.0]),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn select_by_index_and_name() {
        let scope = test_scope();
        let cols = Callable::bind(Arc::new(FnCols), &scope);
        let frame = frame_value(&scope);

        let out = cols.apply(&[frame.clone(), Value::from(2.0)]).unwrap();
        let selected = out.get_frame();
        assert_eq!(1, selected.num_cols());
        assert_eq!("c", selected.name(0));
        assert!(selected.as_materialized().is_none());

        let out = cols
            .apply(&[frame, Value::Texts(vec!["c".to_string(), "a".to_string()])])
            .unwrap();
        let materialized = materialize(out.get_frame().as_ref(), &scope).unwrap();
        let store = scope.store().as_ref();
        assert_eq!(
            vec![7.0, 8.0, 9.0],
            materialized.collect_numeric(store, 0).unwrap()
        );
        assert_eq!(
            vec![1.0, 2.0, 3.0],
            materialized.collect_numeric(store, 1).unwrap()
        );
    }

    #[test]
    fn wrong_variants_are_type_errors() {
        let scope = test_scope();
        let cols = Callable::bind(Arc::new(FnCols), &scope);

        let err = cols.apply(&[Value::from(1.0), Value::from(0.0)]).unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());
        assert_eq!(0, err.index());

        let err = cols.apply(&[frame_value(&scope), Value::Null]).unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());
        assert_eq!(1, err.index());

        let err = cols.apply(&[frame_value(&scope)]).unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());
        assert_eq!(ErrorTarget::Call, err.target());
    }

    #[test]
    fn invalid_selection_is_value_error() {
        let scope = test_scope();
        let cols = Callable::bind(Arc::new(FnCols), &scope);
        let frame = frame_value(&scope);

        for selection in [
            Value::from(3.0),
            Value::from(-1.0),
            Value::from(0.5),
            Value::Numbers(vec![0.0, 5.0]),
            Value::from("missing"),
        ] {
            let err = cols.apply(&[frame.clone(), selection]).unwrap_err();
            assert_eq!(ErrorKind::Value, err.kind());
            assert_eq!(ErrorTarget::Argument(1), err.target());
        }
    }
}
