//! Error types shared by cascade functions and the execution engine.
//!
//! Functions fail with a [`FunctionError`] that only knows _which_ argument
//! (if any) was at fault. The expression evaluator owns the source text, and
//! is the single place where a function error gets converted into a
//! positioned [`CascadeError`].

use std::error::Error as StdError;
use std::fmt;

pub type Result<T, E = FunctionError> = std::result::Result<T, E>;

/// What part of a function call an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorTarget {
    /// The overall shape of the call (e.g. wrong number of arguments).
    Call,
    /// A single positional argument.
    Argument(usize),
}

impl ErrorTarget {
    /// Index of the argument, with `-1` standing in for the whole call.
    pub const fn as_index(&self) -> isize {
        match self {
            ErrorTarget::Call => -1,
            ErrorTarget::Argument(idx) => *idx as isize,
        }
    }
}

impl fmt::Display for ErrorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorTarget::Call => write!(f, "call"),
            ErrorTarget::Argument(idx) => write!(f, "argument {idx}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Type,
    Value,
    Runtime,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Type => write!(f, "TypeError"),
            ErrorKind::Value => write!(f, "ValueError"),
            ErrorKind::Runtime => write!(f, "RuntimeError"),
        }
    }
}

/// Error raised while applying a function or materializing a frame.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    /// The argument at `target` has the wrong variant or shape.
    #[error("{message}")]
    Type {
        target: ErrorTarget,
        message: String,
    },
    /// The argument at `target` has an acceptable variant but an invalid
    /// value.
    #[error("{message}")]
    Value {
        target: ErrorTarget,
        message: String,
    },
    /// Failure unrelated to any argument in particular.
    #[error("{message}")]
    Runtime {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl FunctionError {
    pub fn type_error(index: usize, message: impl Into<String>) -> Self {
        FunctionError::Type {
            target: ErrorTarget::Argument(index),
            message: message.into(),
        }
    }

    /// Type error about the overall arity/shape of the call.
    pub fn call_type_error(message: impl Into<String>) -> Self {
        FunctionError::Type {
            target: ErrorTarget::Call,
            message: message.into(),
        }
    }

    pub fn value_error(index: usize, message: impl Into<String>) -> Self {
        FunctionError::Value {
            target: ErrorTarget::Argument(index),
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        FunctionError::Runtime {
            message: message.into(),
            source: None,
        }
    }

    pub fn runtime_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        FunctionError::Runtime {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            FunctionError::Type { .. } => ErrorKind::Type,
            FunctionError::Value { .. } => ErrorKind::Value,
            FunctionError::Runtime { .. } => ErrorKind::Runtime,
        }
    }

    /// The part of the call this error refers to.
    ///
    /// Runtime errors are not tied to an argument and always refer to the
    /// call.
    pub const fn target(&self) -> ErrorTarget {
        match self {
            FunctionError::Type { target, .. } | FunctionError::Value { target, .. } => *target,
            FunctionError::Runtime { .. } => ErrorTarget::Call,
        }
    }

    /// Argument index this error refers to, `-1` for the whole call.
    pub const fn index(&self) -> isize {
        self.target().as_index()
    }

    pub fn message(&self) -> &str {
        match self {
            FunctionError::Type { message, .. }
            | FunctionError::Value { message, .. }
            | FunctionError::Runtime { message, .. } => message,
        }
    }

    /// Convert into a diagnostic anchored at `start..start+length` in the
    /// expression source.
    pub fn to_cascade_error(&self, start: usize, length: usize) -> CascadeError {
        let message = match self {
            FunctionError::Runtime {
                message,
                source: Some(source),
            } => format!("{message}: {source}"),
            other => other.message().to_string(),
        };

        CascadeError {
            kind: self.kind(),
            start,
            length,
            message,
        }
    }

    /// Translate this error using the evaluator's view of the source.
    pub fn resolve(&self, resolver: &impl SpanResolver) -> CascadeError {
        let span = resolver.span_for(self.target());
        self.to_cascade_error(span.start, span.length)
    }
}

/// A region of expression source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceSpan {
    pub start: usize,
    pub length: usize,
}

impl SourceSpan {
    pub const fn new(start: usize, length: usize) -> Self {
        SourceSpan { start, length }
    }
}

/// Maps the targets of a function error onto source positions.
///
/// Implemented by whatever evaluated the function call and knows which
/// sub-expression produced each argument.
pub trait SpanResolver {
    fn span_for(&self, target: ErrorTarget) -> SourceSpan;
}

/// A function error anchored to a position in the expression source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {start}..{}: {message}", .start + .length)]
pub struct CascadeError {
    pub kind: ErrorKind,
    pub start: usize,
    pub length: usize,
    pub message: String,
}

pub trait ResultExt<T, E> {
    /// Wrap the error in a runtime error with the given message.
    fn context(self, msg: &str) -> Result<T>;

    /// Like `context`, but the message is only built on error.
    fn context_fn<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| FunctionError::runtime_with_source(msg, e))
    }

    fn context_fn<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| FunctionError::runtime_with_source(f(), e))
    }
}

pub trait OptionExt<T> {
    /// Return a runtime error if the option is `None`.
    fn required(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| FunctionError::runtime(format!("Missing required value: {msg}")))
    }
}
