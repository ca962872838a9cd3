//! Scalar: the values stored in structure models.
//!
//! JSON numbers, booleans and strings convert into a Scalar; null, arrays and
//! objects do not. Numbers (including booleans) order numerically across
//! Int/Float/Bool, text orders lexicographically, and number vs text is
//! incomparable.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ModelError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Text,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    #[inline]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Int(_) => ScalarKind::Int,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Text(_) => ScalarKind::Text,
        }
    }

    /// Convert a JSON value. `op`/`argument` only feed the error message.
    pub fn from_json(value: &JsonValue, op: &str, argument: &str) -> Result<Self, ModelError> {
        match value {
            JsonValue::Bool(b) => Ok(Scalar::Bool(*b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Scalar::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Scalar::Float(f))
                } else {
                    Err(ModelError::invalid(op, argument, "number out of range"))
                }
            }
            JsonValue::String(s) => Ok(Scalar::Text(s.clone())),
            JsonValue::Null => Err(ModelError::missing(op, argument)),
            JsonValue::Array(_) => Err(ModelError::invalid(op, argument, "lists are not scalar")),
            JsonValue::Object(_) => Err(ModelError::invalid(op, argument, "maps are not scalar")),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Scalar::Bool(b) => JsonValue::Bool(*b),
            Scalar::Int(i) => JsonValue::from(*i),
            Scalar::Float(f) => JsonValue::from(*f),
            Scalar::Text(s) => JsonValue::String(s.clone()),
        }
    }

    /// Numeric view; `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(_) => None,
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Scalar::Text(_))
    }

    /// Text shown on a node.
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Total ordering used for BST keys.
    pub fn try_cmp(&self, other: &Scalar) -> Result<Ordering, ModelError> {
        match (self, other) {
            (Scalar::Text(a), Scalar::Text(b)) => Ok(a.cmp(b)),
            (Scalar::Int(a), Scalar::Int(b)) => Ok(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => Ok(a.total_cmp(&b)),
                _ => Err(ModelError::Incomparable {
                    left: self.label(),
                    right: other.label(),
                }),
            },
        }
    }

    /// Equality used by search/update: numbers compare by value, text by
    /// content, number vs text never matches.
    pub fn loose_eq(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

/// Integral floats keep one decimal (`3.0`).
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(v) => f.write_str(&format_number(*v)),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}
