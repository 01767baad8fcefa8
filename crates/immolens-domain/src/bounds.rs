//! Plausibility bounds - per-field acceptance rules shared by every extractor
//!
//! Bounds are configuration: the defaults below can be replaced wholesale or
//! per field from a TOML table such as
//!
//! ```toml
//! [fields.monthly_recurring_cost]
//! min = 10.0
//! max = 2000.0
//!
//! [fields.energy_rating]
//! allowed = ["A++", "A+", "A", "B"]
//! ```

use crate::field::{FieldKind, FieldName};
use crate::rejection::RejectionReason;
use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Condition categories
pub const CONDITIONS: &[&str] = &[
    "erstbezug",
    "erstbezug_nach_sanierung",
    "saniert",
    "renovierungsbedurftig",
    "gut",
    "sehr_gut",
    "neuwertig",
    "gepflegt",
];

/// Building categories
pub const BUILDING_TYPES: &[&str] = &[
    "altbau",
    "neubau",
    "grunderzeit",
    "zwischenkrieg",
    "nachkrieg",
    "modern",
];

/// Heating systems
pub const HEATING_TYPES: &[&str] = &[
    "fernwarme",
    "gas",
    "zentralheizung",
    "etagenheizung",
    "fussbodenheizung",
    "elektro",
    "ol",
    "pellets",
    "warmepumpe",
    "solar",
];

/// Parking categories
pub const PARKING_TYPES: &[&str] = &["tiefgarage", "garage", "stellplatz", "carport", "parkplatz", "ohne"];

/// Energy efficiency classes, best first
pub const ENERGY_RATINGS: &[&str] = &["A++", "A+", "A", "B", "C", "D", "E", "F", "G"];

/// Acceptance rule for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    /// Inclusive numeric range
    Range {
        /// Smallest accepted value
        min: f64,
        /// Largest accepted value
        max: f64,
    },

    /// Enumerated vocabulary, matched case-insensitively
    OneOf {
        /// Canonical spellings
        allowed: Vec<String>,
    },
}

impl Bound {
    /// Inclusive numeric range
    pub fn range(min: f64, max: f64) -> Self {
        Bound::Range { min, max }
    }

    /// Vocabulary from a list of canonical spellings
    pub fn one_of(allowed: &[&str]) -> Self {
        Bound::OneOf {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Fold a vocabulary term for comparison: lowercase, umlauts to their base
/// letter, spaces and hyphens to underscores
pub fn fold_term(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.trim().chars() {
        match c {
            'ä' | 'Ä' => out.push('a'),
            'ö' | 'Ö' => out.push('o'),
            'ü' | 'Ü' => out.push('u'),
            'ß' => out.push_str("ss"),
            ' ' | '-' | '\t' => {
                if !out.ends_with('_') {
                    out.push('_');
                }
            }
            other => out.extend(other.to_lowercase()),
        }
    }
    out
}

/// Per-field bounds table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlausibilityBounds {
    /// Bound per field; fields without an entry are unbounded
    #[serde(default)]
    pub fields: BTreeMap<FieldName, Bound>,
}

impl Default for PlausibilityBounds {
    fn default() -> Self {
        use FieldName::*;
        let mut fields = BTreeMap::new();
        fields.insert(Price, Bound::range(1_000.0, 50_000_000.0));
        fields.insert(SizeSqm, Bound::range(10.0, 1_000.0));
        fields.insert(Rooms, Bound::range(0.5, 20.0));
        fields.insert(Bedrooms, Bound::range(0.0, 20.0));
        fields.insert(Bathrooms, Bound::range(0.0, 10.0));
        fields.insert(Floor, Bound::range(-2.0, 25.0));
        fields.insert(YearBuilt, Bound::range(1700.0, 2035.0));
        fields.insert(HwbValue, Bound::range(5.0, 1_000.0));
        fields.insert(FgeeValue, Bound::range(0.1, 5.0));
        fields.insert(MonthlyRecurringCost, Bound::range(10.0, 2_000.0));
        fields.insert(RepairFundContribution, Bound::range(1.0, 500.0));
        fields.insert(CommissionPercent, Bound::range(0.0, 10.0));
        fields.insert(EnergyRating, Bound::one_of(ENERGY_RATINGS));
        fields.insert(Condition, Bound::one_of(CONDITIONS));
        fields.insert(BuildingType, Bound::one_of(BUILDING_TYPES));
        fields.insert(HeatingType, Bound::one_of(HEATING_TYPES));
        fields.insert(Parking, Bound::one_of(PARKING_TYPES));
        Self { fields }
    }
}

impl PlausibilityBounds {
    /// A table with no bounds at all
    pub fn unbounded() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Bound for a field, if any
    pub fn get(&self, field: FieldName) -> Option<&Bound> {
        self.fields.get(&field)
    }

    /// Replace the bound for a field
    pub fn set(&mut self, field: FieldName, bound: Bound) {
        self.fields.insert(field, bound);
    }

    /// Builder-style variant of [`set`](Self::set)
    pub fn with(mut self, field: FieldName, bound: Bound) -> Self {
        self.set(field, bound);
        self
    }

    /// Check a coerced value against its field's bound
    ///
    /// Returns the value to store: unchanged for ranges, the canonical
    /// spelling for vocabularies.
    pub fn check(&self, field: FieldName, value: FieldValue) -> Result<FieldValue, RejectionReason> {
        match self.fields.get(&field) {
            None => Ok(value),
            Some(Bound::Range { min, max }) => {
                let n = value.as_f64().ok_or(RejectionReason::TypeMismatch {
                    expected: field.kind(),
                })?;
                if n.is_finite() && n >= *min && n <= *max {
                    Ok(value)
                } else {
                    Err(RejectionReason::OutOfRange {
                        value: n,
                        min: *min,
                        max: *max,
                    })
                }
            }
            Some(Bound::OneOf { allowed }) => {
                let text = value.as_str().ok_or(RejectionReason::TypeMismatch {
                    expected: FieldKind::Text,
                })?;
                let folded = fold_term(text);
                allowed
                    .iter()
                    .find(|a| fold_term(a) == folded)
                    .map(|a| FieldValue::Text(a.clone()))
                    .ok_or_else(|| RejectionReason::NotAllowed {
                        value: text.to_string(),
                    })
            }
        }
    }

    /// Whether a value would pass [`check`](Self::check)
    pub fn admits(&self, field: FieldName, value: &FieldValue) -> bool {
        self.check(field, value.clone()).is_ok()
    }

    /// Lower bound of a numeric field
    pub fn min(&self, field: FieldName) -> Option<f64> {
        match self.fields.get(&field) {
            Some(Bound::Range { min, .. }) => Some(*min),
            _ => None,
        }
    }

    /// Validate the table itself
    pub fn validate(&self) -> Result<(), String> {
        for (field, bound) in &self.fields {
            match bound {
                Bound::Range { min, max } => {
                    if !matches!(field.kind(), FieldKind::Number | FieldKind::Integer) {
                        return Err(format!("{}: numeric range on a {} field", field, field.kind()));
                    }
                    if !(min.is_finite() && max.is_finite()) || min > max {
                        return Err(format!("{}: invalid range [{}, {}]", field, min, max));
                    }
                }
                Bound::OneOf { allowed } => {
                    if field.kind() != FieldKind::Text {
                        return Err(format!("{}: vocabulary on a {} field", field, field.kind()));
                    }
                    if allowed.is_empty() {
                        return Err(format!("{}: empty vocabulary", field));
                    }
                }
            }
        }
        Ok(())
    }

    /// Load from a TOML string; entries override the defaults per field
    pub fn from_toml(s: &str) -> Result<Self, String> {
        let overrides: PlausibilityBounds =
            toml::from_str(s).map_err(|e| format!("Invalid bounds table: {}", e))?;
        let mut bounds = PlausibilityBounds::default();
        bounds.fields.extend(overrides.fields);
        bounds.validate()?;
        Ok(bounds)
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize bounds: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PlausibilityBounds::default().validate().is_ok());
    }

    #[test]
    fn test_range_is_inclusive() {
        let bounds = PlausibilityBounds::default();
        let cost = FieldName::MonthlyRecurringCost;
        assert!(bounds.admits(cost, &FieldValue::Number(10.0)));
        assert!(bounds.admits(cost, &FieldValue::Number(2000.0)));
        assert!(!bounds.admits(cost, &FieldValue::Number(1.0)));
        assert!(!bounds.admits(cost, &FieldValue::Number(f64::NAN)));
    }

    #[test]
    fn test_range_rejection_reports_bounds() {
        let bounds = PlausibilityBounds::default();
        let err = bounds
            .check(FieldName::SizeSqm, FieldValue::Number(5.0))
            .unwrap_err();
        assert_eq!(
            err,
            RejectionReason::OutOfRange {
                value: 5.0,
                min: 10.0,
                max: 1000.0
            }
        );
    }

    #[test]
    fn test_vocabulary_canonicalizes() {
        let bounds = PlausibilityBounds::default();
        assert_eq!(
            bounds.check(FieldName::HeatingType, FieldValue::text("Fernwärme")),
            Ok(FieldValue::text("fernwarme"))
        );
        assert_eq!(
            bounds.check(FieldName::Condition, FieldValue::text("Erstbezug nach Sanierung")),
            Ok(FieldValue::text("erstbezug_nach_sanierung"))
        );
        assert_eq!(
            bounds.check(FieldName::EnergyRating, FieldValue::text("a+")),
            Ok(FieldValue::text("A+"))
        );
        assert!(matches!(
            bounds.check(FieldName::EnergyRating, FieldValue::text("H")),
            Err(RejectionReason::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let bounds = PlausibilityBounds::default();
        assert!(matches!(
            bounds.check(FieldName::Price, FieldValue::text("teuer")),
            Err(RejectionReason::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unbounded_fields_pass() {
        let bounds = PlausibilityBounds::default();
        let title = FieldValue::text("Schöne Wohnung");
        assert_eq!(bounds.check(FieldName::Title, title.clone()), Ok(title));
    }

    #[test]
    fn test_toml_overrides_single_field() {
        let toml = r#"
            [fields.monthly_recurring_cost]
            min = 30.0
            max = 1500.0
        "#;
        let bounds = PlausibilityBounds::from_toml(toml).unwrap();
        assert_eq!(bounds.min(FieldName::MonthlyRecurringCost), Some(30.0));
        // untouched fields keep their defaults
        assert_eq!(bounds.min(FieldName::SizeSqm), Some(10.0));
    }

    #[test]
    fn test_toml_vocabulary() {
        let toml = r#"
            [fields.energy_rating]
            allowed = ["A", "B"]
        "#;
        let bounds = PlausibilityBounds::from_toml(toml).unwrap();
        assert!(!bounds.admits(FieldName::EnergyRating, &FieldValue::text("C")));
    }

    #[test]
    fn test_toml_rejects_inverted_range() {
        let toml = r#"
            [fields.price]
            min = 10.0
            max = 1.0
        "#;
        assert!(PlausibilityBounds::from_toml(toml).is_err());
    }

    #[test]
    fn test_toml_rejects_range_on_boolean() {
        let toml = r#"
            [fields.elevator]
            min = 0.0
            max = 1.0
        "#;
        assert!(PlausibilityBounds::from_toml(toml).is_err());
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let bounds = PlausibilityBounds::default();
        let text = bounds.to_toml().unwrap();
        assert!(text.contains("[fields.price]"));
        assert_eq!(PlausibilityBounds::from_toml(&text).unwrap(), bounds);
    }

    #[test]
    fn test_fold_term() {
        assert_eq!(fold_term("Fußbodenheizung"), "fussbodenheizung");
        assert_eq!(fold_term(" sehr  gut "), "sehr_gut");
        assert_eq!(fold_term("Wärme-Pumpe"), "warme_pumpe");
    }

    proptest! {
        #[test]
        fn prop_admitted_values_lie_within_range(v in -1.0e9f64..1.0e9) {
            let bounds = PlausibilityBounds::default();
            for field in FieldName::ALL {
                if let Some(Bound::Range { min, max }) = bounds.get(field) {
                    if bounds.admits(field, &FieldValue::Number(v)) {
                        prop_assert!(v >= *min && v <= *max);
                    }
                }
            }
        }
    }
}
