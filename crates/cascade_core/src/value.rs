use std::fmt;
use std::sync::Arc;

use crate::frame::materialized::MaterializedFrame;
use crate::frame::{FrameRef, LazyFrame};
use crate::functions::Callable;

/// Tag for the variant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Number,
    Numbers,
    Text,
    Texts,
    Frame,
    Function,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Null => "null",
            ValueType::Number => "number",
            ValueType::Numbers => "numbers",
            ValueType::Text => "text",
            ValueType::Texts => "texts",
            ValueType::Frame => "frame",
            ValueType::Function => "function",
        };
        write!(f, "{s}")
    }
}

/// A value flowing through expression evaluation.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Number(f64),
    Numbers(Vec<f64>),
    Text(String),
    Texts(Vec<String>),
    Frame(FrameRef),
    Function(Callable),
}

#[track_caller]
fn mismatch(expected: ValueType, got: ValueType) -> ! {
    panic!("Expected {expected} value, got {got}")
}

impl Value {
    pub const fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Number(_) => ValueType::Number,
            Value::Numbers(_) => ValueType::Numbers,
            Value::Text(_) => ValueType::Text,
            Value::Texts(_) => ValueType::Texts,
            Value::Frame(_) => ValueType::Frame,
            Value::Function(_) => ValueType::Function,
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub const fn is_numbers(&self) -> bool {
        matches!(self, Value::Numbers(_))
    }

    pub const fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    pub const fn is_texts(&self) -> bool {
        matches!(self, Value::Texts(_))
    }

    pub const fn is_frame(&self) -> bool {
        matches!(self, Value::Frame(_))
    }

    pub const fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_numbers(&self) -> Option<&[f64]> {
        match self {
            Value::Numbers(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_texts(&self) -> Option<&[String]> {
        match self {
            Value::Texts(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&FrameRef> {
        match self {
            Value::Frame(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Callable> {
        match self {
            Value::Function(v) => Some(v),
            _ => None,
        }
    }

    /// Get the number.
    ///
    /// Panics if this isn't a number. Check with `is_number` first when the
    /// variant isn't already known.
    #[track_caller]
    pub fn get_number(&self) -> f64 {
        self.as_number()
            .unwrap_or_else(|| mismatch(ValueType::Number, self.value_type()))
    }

    #[track_caller]
    pub fn get_numbers(&self) -> &[f64] {
        self.as_numbers()
            .unwrap_or_else(|| mismatch(ValueType::Numbers, self.value_type()))
    }

    #[track_caller]
    pub fn get_text(&self) -> &str {
        self.as_text()
            .unwrap_or_else(|| mismatch(ValueType::Text, self.value_type()))
    }

    #[track_caller]
    pub fn get_texts(&self) -> &[String] {
        self.as_texts()
            .unwrap_or_else(|| mismatch(ValueType::Texts, self.value_type()))
    }

    #[track_caller]
    pub fn get_frame(&self) -> &FrameRef {
        self.as_frame()
            .unwrap_or_else(|| mismatch(ValueType::Frame, self.value_type()))
    }

    #[track_caller]
    pub fn get_function(&self) -> &Callable {
        self.as_function()
            .unwrap_or_else(|| mismatch(ValueType::Function, self.value_type()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Number(v) => write!(f, "{v}"),
            Value::Numbers(v) => write!(f, "{v:?}"),
            Value::Text(v) => write!(f, "'{v}'"),
            Value::Texts(v) => write!(f, "{v:?}"),
            Value::Frame(frame) => {
                write!(f, "frame[{} x {}]", frame.num_rows(), frame.num_cols())
            }
            Value::Function(func) => write!(f, "function {}", func.name()),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<MaterializedFrame> for Value {
    fn from(value: MaterializedFrame) -> Self {
        Value::Frame(Arc::new(value))
    }
}

impl From<FrameRef> for Value {
    fn from(value: FrameRef) -> Self {
        Value::Frame(value)
    }
}

impl From<Callable> for Value {
    fn from(value: Callable) -> Self {
        Value::Function(value)
    }
}
