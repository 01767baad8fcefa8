//! Field coercion and bounds checking shared by every extractor
//!
//! A candidate arrives either as text (regex capture, table cell) or as a
//! JSON value (structured data, model output). Both paths coerce to the
//! field's kind and then go through the same [`PlausibilityBounds`].

use immolens_domain::{
    parse_number_with_range, ExtractionResult, FieldKind, FieldName, FieldSet, FieldValue,
    PlausibilityBounds, Rejection, RejectionReason, Source,
};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

/// A plain dot-decimal number as models write it in JSON strings
static PLAIN_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid regex"));

/// Placeholders that mean "no value"
const NULL_LIKE: &[&str] = &[
    "null",
    "none",
    "n/a",
    "na",
    "unknown",
    "unbekannt",
    "-",
    "--",
    "?",
    "k.a.",
    "k. a.",
    "keine angabe",
    "nicht angegeben",
];

const TRUE_WORDS: &[&str] = &["true", "yes", "ja", "1", "vorhanden"];
const FALSE_WORDS: &[&str] = &["false", "no", "nein", "0", "nicht vorhanden", "keine", "kein"];

/// Floor names that stand for a number
const FLOOR_TERMS: &[(&str, i64)] = &[
    ("erdgeschoss", 0),
    ("erdgeschoß", 0),
    ("eg", 0),
    ("parterre", 0),
    ("hochparterre", 0),
    ("hp", 0),
    ("souterrain", -1),
    ("untergeschoss", -1),
    ("untergeschoß", -1),
    ("ug", -1),
    ("mezzanin", 1),
];

/// Keys the model sometimes uses instead of the field name
const KEY_ALIASES: &[(&str, FieldName)] = &[
    ("betriebskosten", FieldName::MonthlyRecurringCost),
    ("betriebskosten_monthly", FieldName::MonthlyRecurringCost),
    ("nebenkosten", FieldName::MonthlyRecurringCost),
    ("reparaturrucklage", FieldName::RepairFundContribution),
    ("reparaturruecklage", FieldName::RepairFundContribution),
    ("reparaturrücklage", FieldName::RepairFundContribution),
    ("size", FieldName::SizeSqm),
    ("wohnflaeche", FieldName::SizeSqm),
    ("baujahr", FieldName::YearBuilt),
];

/// Coerces raw candidates into field values and checks them against bounds
#[derive(Debug, Clone, Default)]
pub struct FieldValidator {
    bounds: PlausibilityBounds,
}

impl FieldValidator {
    /// Create a validator over a bounds table
    pub fn new(bounds: PlausibilityBounds) -> Self {
        Self { bounds }
    }

    /// The bounds in use
    pub fn bounds(&self) -> &PlausibilityBounds {
        &self.bounds
    }

    /// Map a JSON key to a field, accepting a few German aliases
    pub fn resolve_key(key: &str) -> Option<FieldName> {
        FieldName::parse(key).or_else(|| {
            let key = key.trim().to_lowercase();
            KEY_ALIASES
                .iter()
                .find(|(alias, _)| *alias == key)
                .map(|(_, field)| *field)
        })
    }

    /// Coerce a text candidate
    pub fn from_text(&self, field: FieldName, raw: &str) -> Result<FieldValue, RejectionReason> {
        let text = collapse_whitespace(raw);
        if is_null_like(&text) {
            return Err(RejectionReason::NullLike);
        }

        let value = match field.kind() {
            FieldKind::Number => {
                let n = parse_number_with_range(&text).map_err(unparsable)?;
                FieldValue::number(n)
            }
            FieldKind::Integer => {
                let special = if field == FieldName::Floor {
                    floor_term(&text)
                } else {
                    None
                };
                match special {
                    Some(n) => FieldValue::Integer(n),
                    None => whole(field, parse_number_with_range(&text).map_err(unparsable)?)?,
                }
            }
            FieldKind::Boolean => {
                let lower = text.to_lowercase();
                if TRUE_WORDS.contains(&lower.as_str()) {
                    FieldValue::Boolean(true)
                } else if FALSE_WORDS.contains(&lower.as_str()) {
                    FieldValue::Boolean(false)
                } else {
                    return Err(RejectionReason::TypeMismatch {
                        expected: FieldKind::Boolean,
                    });
                }
            }
            FieldKind::Text => FieldValue::Text(text),
        };

        self.bounds.check(field, value)
    }

    /// Coerce a JSON candidate; `null` means "not found" and yields `Ok(None)`
    pub fn from_json(
        &self,
        field: FieldName,
        raw: &Value,
    ) -> Result<Option<FieldValue>, RejectionReason> {
        let mismatch = || RejectionReason::TypeMismatch {
            expected: field.kind(),
        };

        let value = match (field.kind(), raw) {
            (_, Value::Null) => return Ok(None),
            (FieldKind::Number | FieldKind::Integer, Value::String(s))
                if PLAIN_DECIMAL.is_match(s.trim()) =>
            {
                let n: f64 = s.trim().parse().map_err(|_| mismatch())?;
                match field.kind() {
                    FieldKind::Integer => whole(field, n)?,
                    _ => FieldValue::number(n),
                }
            }
            (_, Value::String(s)) => return self.from_text(field, s).map(Some),
            (FieldKind::Number, Value::Number(n)) => {
                FieldValue::number(n.as_f64().ok_or_else(mismatch)?)
            }
            (FieldKind::Integer, Value::Number(n)) => whole(field, n.as_f64().ok_or_else(mismatch)?)?,
            (FieldKind::Boolean, Value::Bool(b)) => FieldValue::Boolean(*b),
            (FieldKind::Boolean, Value::Number(n)) => match n.as_i64() {
                Some(1) => FieldValue::Boolean(true),
                Some(0) => FieldValue::Boolean(false),
                _ => return Err(mismatch()),
            },
            // postal codes come back as bare numbers
            (FieldKind::Text, Value::Number(n)) if field == FieldName::PostalCode => {
                FieldValue::Text(n.to_string())
            }
            _ => return Err(mismatch()),
        };

        self.bounds.check(field, value).map(Some)
    }
}

/// Accumulates one extractor's accepted fields and rejections
pub(crate) struct Collector<'a> {
    validator: &'a FieldValidator,
    source: Source,
    fields: FieldSet,
    rejections: Vec<Rejection>,
}

impl<'a> Collector<'a> {
    pub(crate) fn new(validator: &'a FieldValidator, source: Source) -> Self {
        Self {
            validator,
            source,
            fields: FieldSet::new(),
            rejections: Vec::new(),
        }
    }

    pub(crate) fn has(&self, field: FieldName) -> bool {
        self.fields.contains(field)
    }

    /// Offer a text candidate; true when the field holds a value afterwards
    pub(crate) fn offer_text(&mut self, field: FieldName, raw: &str) -> bool {
        if self.has(field) {
            return true;
        }
        match self.validator.from_text(field, raw) {
            Ok(value) => {
                debug!(source = %self.source, %field, %value, "Accepted candidate");
                self.fields.set(field, value);
                true
            }
            Err(reason) => {
                self.reject(field, raw.trim().to_string(), reason);
                false
            }
        }
    }

    /// Offer a JSON candidate; true when the field holds a value afterwards
    pub(crate) fn offer_json(&mut self, field: FieldName, raw: &Value) -> bool {
        if self.has(field) {
            return true;
        }
        match self.validator.from_json(field, raw) {
            Ok(Some(value)) => {
                debug!(source = %self.source, %field, %value, "Accepted candidate");
                self.fields.set(field, value);
                true
            }
            Ok(None) => false,
            Err(reason) => {
                self.reject(field, raw.to_string(), reason);
                false
            }
        }
    }

    /// Set a keyword-detected flag; flags carry no bounds
    pub(crate) fn flag(&mut self, field: FieldName) {
        if !self.has(field) {
            self.fields.set(field, FieldValue::Boolean(true));
        }
    }

    fn reject(&mut self, field: FieldName, raw: String, reason: RejectionReason) {
        debug!(source = %self.source, %field, raw = %raw, %reason, "Rejected candidate");
        self.rejections
            .push(Rejection::new(field, self.source, raw, reason));
    }

    pub(crate) fn rejection_count(&self) -> usize {
        self.rejections.len()
    }

    pub(crate) fn finish(self) -> ExtractionResult {
        ExtractionResult::new(self.source, self.fields, self.rejections)
    }
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_null_like(text: &str) -> bool {
    text.is_empty() || NULL_LIKE.contains(&text.to_lowercase().as_str())
}

fn unparsable(e: immolens_domain::ParseError) -> RejectionReason {
    RejectionReason::Unparsable {
        detail: e.to_string(),
    }
}

fn whole(field: FieldName, n: f64) -> Result<FieldValue, RejectionReason> {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Ok(FieldValue::Integer(n as i64))
    } else {
        Err(RejectionReason::TypeMismatch {
            expected: field.kind(),
        })
    }
}

/// Look for a whole-word floor name such as "EG" or "Souterrain"
fn floor_term(text: &str) -> Option<i64> {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .find_map(|word| {
            FLOOR_TERMS
                .iter()
                .find(|(term, _)| *term == word)
                .map(|(_, n)| *n)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> FieldValidator {
        FieldValidator::new(PlausibilityBounds::default())
    }

    #[test]
    fn test_number_from_german_text() {
        let v = validator();
        assert_eq!(
            v.from_text(FieldName::MonthlyRecurringCost, "145,00"),
            Ok(FieldValue::Number(145.0))
        );
        assert_eq!(
            v.from_text(FieldName::Price, "250.000,50"),
            Ok(FieldValue::Number(250000.5))
        );
        assert_eq!(v.from_text(FieldName::Rooms, "2-3"), Ok(FieldValue::Number(2.0)));
    }

    #[test]
    fn test_number_below_floor_is_rejected() {
        let v = validator();
        assert!(matches!(
            v.from_text(FieldName::MonthlyRecurringCost, "1"),
            Err(RejectionReason::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_integer_rejects_fractions() {
        let v = validator();
        assert_eq!(v.from_text(FieldName::Bedrooms, "2"), Ok(FieldValue::Integer(2)));
        assert!(matches!(
            v.from_text(FieldName::Bedrooms, "2,5"),
            Err(RejectionReason::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_floor_terms() {
        let v = validator();
        assert_eq!(v.from_text(FieldName::Floor, "EG"), Ok(FieldValue::Integer(0)));
        assert_eq!(v.from_text(FieldName::Floor, "Hochparterre"), Ok(FieldValue::Integer(0)));
        assert_eq!(v.from_text(FieldName::Floor, "Souterrain"), Ok(FieldValue::Integer(-1)));
        assert_eq!(v.from_text(FieldName::Floor, "Mezzanin"), Ok(FieldValue::Integer(1)));
        assert_eq!(v.from_text(FieldName::Floor, "3. OG"), Ok(FieldValue::Integer(3)));
        // "Weg" contains "eg" but is not the word EG
        assert!(v.from_text(FieldName::Floor, "Weg").is_err());
    }

    #[test]
    fn test_booleans() {
        let v = validator();
        assert_eq!(v.from_text(FieldName::Elevator, "Ja"), Ok(FieldValue::Boolean(true)));
        assert_eq!(v.from_text(FieldName::Elevator, "nein"), Ok(FieldValue::Boolean(false)));
        assert!(v.from_text(FieldName::Elevator, "vielleicht").is_err());
        assert_eq!(
            v.from_json(FieldName::Balcony, &json!(1)),
            Ok(Some(FieldValue::Boolean(true)))
        );
    }

    #[test]
    fn test_null_like_text() {
        let v = validator();
        assert_eq!(v.from_text(FieldName::Title, "  n/a "), Err(RejectionReason::NullLike));
        assert_eq!(v.from_text(FieldName::Address, ""), Err(RejectionReason::NullLike));
        assert_eq!(
            v.from_text(FieldName::Title, "  Helle   Wohnung "),
            Ok(FieldValue::text("Helle Wohnung"))
        );
    }

    #[test]
    fn test_enumerated_text_is_canonicalized() {
        let v = validator();
        assert_eq!(
            v.from_text(FieldName::Parking, "Tiefgarage"),
            Ok(FieldValue::text("tiefgarage"))
        );
        assert!(matches!(
            v.from_text(FieldName::Parking, "Hubschrauberlandeplatz"),
            Err(RejectionReason::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_json_values() {
        let v = validator();
        assert_eq!(
            v.from_json(FieldName::Price, &json!(200000)),
            Ok(Some(FieldValue::Number(200000.0)))
        );
        assert_eq!(
            v.from_json(FieldName::YearBuilt, &json!(1985)),
            Ok(Some(FieldValue::Integer(1985)))
        );
        assert_eq!(v.from_json(FieldName::Price, &Value::Null), Ok(None));
        assert!(matches!(
            v.from_json(FieldName::Price, &json!(true)),
            Err(RejectionReason::TypeMismatch { .. })
        ));
        assert!(matches!(
            v.from_json(FieldName::Title, &json!({"a": 1})),
            Err(RejectionReason::TypeMismatch { .. })
        ));
        assert_eq!(
            v.from_json(FieldName::PostalCode, &json!(1030)),
            Ok(Some(FieldValue::text("1030")))
        );
    }

    #[test]
    fn test_json_strings_use_text_path() {
        let v = validator();
        assert_eq!(
            v.from_json(FieldName::SizeSqm, &json!("65,5 m²")),
            Ok(Some(FieldValue::Number(65.5)))
        );
    }

    #[test]
    fn test_json_strings_are_dot_decimal() {
        let v = validator();
        assert_eq!(
            v.from_json(FieldName::Rooms, &json!("1.5")),
            Ok(Some(FieldValue::Number(1.5)))
        );
        assert_eq!(
            v.from_json(FieldName::SizeSqm, &json!("65.5")),
            Ok(Some(FieldValue::Number(65.5)))
        );
        assert_eq!(
            v.from_json(FieldName::MonthlyRecurringCost, &json!("185.40")),
            Ok(Some(FieldValue::Number(185.4)))
        );
        assert_eq!(
            v.from_json(FieldName::YearBuilt, &json!(" 1972 ")),
            Ok(Some(FieldValue::Integer(1972)))
        );
        // anything else still takes the German text path
        assert_eq!(
            v.from_json(FieldName::Price, &json!("249.000 €")),
            Ok(Some(FieldValue::Number(249000.0)))
        );
    }

    #[test]
    fn test_resolve_key() {
        assert_eq!(FieldValidator::resolve_key("price"), Some(FieldName::Price));
        assert_eq!(
            FieldValidator::resolve_key("betriebskosten_monthly"),
            Some(FieldName::MonthlyRecurringCost)
        );
        assert_eq!(FieldValidator::resolve_key("haustiere"), None);
    }

    #[test]
    fn test_collector_keeps_first_value_and_records_rejections() {
        let v = validator();
        let mut collector = Collector::new(&v, Source::Pattern);
        assert!(!collector.offer_text(FieldName::MonthlyRecurringCost, "1"));
        assert!(collector.offer_text(FieldName::MonthlyRecurringCost, "145"));
        assert!(collector.offer_text(FieldName::MonthlyRecurringCost, "999"));
        let result = collector.finish();
        assert_eq!(
            result.get(FieldName::MonthlyRecurringCost),
            Some(&FieldValue::Number(145.0))
        );
        assert_eq!(result.rejections().len(), 1);
        assert_eq!(result.rejections()[0].raw, "1");
    }
}
