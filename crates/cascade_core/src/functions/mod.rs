//! Functions callable from expressions.
//!
//! Functions report failures with [`FunctionError`] against the index of the
//! offending argument. Turning that into a source location is up to the
//! evaluator calling the function.

pub mod builtin;

use std::fmt::Debug;
use std::sync::{Arc, Weak};

use cascade_error::{FunctionError, Result};
use tracing::trace;

use crate::engine::scope::Scope;
use crate::frame::FrameRef;
use crate::value::Value;

pub trait Function: Debug + Sync + Send {
    /// Name of the function as written in expressions.
    fn name(&self) -> &'static str;

    /// Apply the function to already evaluated arguments.
    fn apply(&self, scope: &Scope, args: &[Value]) -> Result<Value>;
}

/// A function bound to the scope it will execute in.
///
/// Only a weak reference to the scope is held so that values referencing
/// callables don't keep a finished evaluation alive.
#[derive(Debug, Clone)]
pub struct Callable {
    function: Arc<dyn Function>,
    scope: Weak<Scope>,
}

impl Callable {
    pub fn bind(function: Arc<dyn Function>, scope: &Arc<Scope>) -> Self {
        Callable {
            function,
            scope: Arc::downgrade(scope),
        }
    }

    pub fn name(&self) -> &'static str {
        self.function.name()
    }

    pub fn apply(&self, args: &[Value]) -> Result<Value> {
        let scope = self.scope.upgrade().ok_or_else(|| {
            FunctionError::runtime(format!(
                "Scope for function '{}' no longer exists",
                self.function.name()
            ))
        })?;

        trace!(function = self.function.name(), args = args.len(), "applying function");
        self.function.apply(&scope, args)
    }
}

/// Check that a function received exactly `expected` arguments.
pub(crate) fn check_arity(name: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(FunctionError::call_type_error(format!(
            "'{name}' expects {expected} arguments, got {}",
            args.len()
        )));
    }
    Ok(())
}

/// Get the argument at `idx` as a frame.
pub(crate) fn frame_arg<'a>(name: &str, args: &'a [Value], idx: usize) -> Result<&'a FrameRef> {
    match &args[idx] {
        Value::Frame(frame) => Ok(frame),
        other => Err(FunctionError::type_error(
            idx,
            format!(
                "'{name}' expects a frame for argument {idx}, got {}",
                other.value_type()
            ),
        )),
    }
}
