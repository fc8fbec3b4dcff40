//! Typed tag values

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar value read from the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// Boolean (BOOL / single bit)
    Bool(bool),
    /// Integer (SINT, INT, DINT, LINT)
    Int(i64),
    /// Floating point (REAL, LREAL)
    Real(f64),
    /// String value
    Text(String),
}

impl TagValue {
    /// Interpret the value as a boolean signal.
    ///
    /// Numbers are true when non-zero; text has no boolean reading.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TagValue::Bool(v) => Some(*v),
            TagValue::Int(v) => Some(*v != 0),
            TagValue::Real(v) => Some(*v != 0.0),
            TagValue::Text(_) => None,
        }
    }

    /// Get as a floating point number, returning None for text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            TagValue::Int(v) => Some(*v as f64),
            TagValue::Real(v) => Some(*v),
            TagValue::Text(_) => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Bool(v) => write!(f, "{}", v),
            TagValue::Int(v) => write!(f, "{}", v),
            TagValue::Real(v) => write!(f, "{}", v),
            TagValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        TagValue::Bool(v)
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        TagValue::Int(v)
    }
}

impl From<f64> for TagValue {
    fn from(v: f64) -> Self {
        TagValue::Real(v)
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        TagValue::Text(v.to_string())
    }
}
