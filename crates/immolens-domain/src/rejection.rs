//! Rejections - candidate values that were found but not accepted
//!
//! A rejection is data, not an error: extractors return them alongside the
//! fields they accepted so the reconciler can put them in the decision log.

use crate::field::{FieldKind, FieldName};
use crate::source::Source;
use serde::Serialize;
use std::fmt;

/// Why a candidate value was dropped
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The raw value could not be turned into a number
    Unparsable {
        /// Parser message
        detail: String,
    },

    /// The raw value has the wrong shape for the field
    TypeMismatch {
        /// Kind the field requires
        expected: FieldKind,
    },

    /// Numeric value outside the field's inclusive bounds
    OutOfRange {
        /// Parsed value
        value: f64,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Text value not in the field's vocabulary
    NotAllowed {
        /// Offending value
        value: String,
    },

    /// Placeholder such as "null", "n/a", or "unknown"
    NullLike,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::Unparsable { detail } => write!(f, "unparsable ({})", detail),
            RejectionReason::TypeMismatch { expected } => write!(f, "expected {}", expected),
            RejectionReason::OutOfRange { value, min, max } => {
                write!(f, "{} outside [{}, {}]", value, min, max)
            }
            RejectionReason::NotAllowed { value } => write!(f, "{:?} not an allowed value", value),
            RejectionReason::NullLike => f.write_str("placeholder value"),
        }
    }
}

/// A candidate value an extractor saw and discarded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    /// Field the value was meant for
    pub field: FieldName,

    /// Extractor that saw it
    pub source: Source,

    /// The raw text or JSON as found
    pub raw: String,

    /// Why it was dropped
    #[serde(flatten)]
    pub reason: RejectionReason,
}

impl Rejection {
    /// Create a rejection record
    pub fn new(field: FieldName, source: Source, raw: impl Into<String>, reason: RejectionReason) -> Self {
        Self {
            field,
            source,
            raw: raw.into(),
            reason,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {:?}: {}", self.field, self.source, self.raw, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_field_and_reason() {
        let rejection = Rejection::new(
            FieldName::MonthlyRecurringCost,
            Source::Pattern,
            "1",
            RejectionReason::OutOfRange {
                value: 1.0,
                min: 10.0,
                max: 2000.0,
            },
        );
        let text = rejection.to_string();
        assert!(text.contains("monthly_recurring_cost"));
        assert!(text.contains("outside [10, 2000]"));
    }

    #[test]
    fn test_serializes_flat() {
        let rejection = Rejection::new(FieldName::Price, Source::Llm, "null", RejectionReason::NullLike);
        let json = serde_json::to_value(&rejection).unwrap();
        assert_eq!(json["field"], "price");
        assert_eq!(json["source"], "llm");
        assert_eq!(json["reason"], "null_like");
    }
}
