//! Typed field values

use crate::field::FieldKind;
use serde::Serialize;
use std::fmt;

/// A value that passed coercion for its field
///
/// There is no "partially valid" state: a field either holds one of these
/// or is absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Decimal number, two decimal places
    Number(f64),
    /// Whole number
    Integer(i64),
    /// Feature flag
    Boolean(bool),
    /// Trimmed, non-empty text
    Text(String),
}

impl FieldValue {
    /// Build a number rounded to two decimal places
    pub fn number(value: f64) -> Self {
        FieldValue::Number((value * 100.0).round() / 100.0)
    }

    /// Build a text value
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// The kind of this value
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Boolean(_) => FieldKind::Boolean,
            FieldValue::Text(_) => FieldKind::Text,
        }
    }

    /// Numeric view (numbers and integers)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integer view
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Boolean view
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Text view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}
