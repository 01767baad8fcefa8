//! Records - per-extractor results and the reconciled listing record

use crate::field::FieldName;
use crate::rejection::Rejection;
use crate::source::Source;
use crate::value::FieldValue;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// One optional slot per [`FieldName`]
///
/// Absence is explicit: a slot is `None` until a value is accepted into it.
/// Iteration always follows the canonical field order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    slots: [Option<FieldValue>; FieldName::COUNT],
}

impl FieldSet {
    /// An empty set
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Value of a field
    pub fn get(&self, field: FieldName) -> Option<&FieldValue> {
        self.slots[field.index()].as_ref()
    }

    /// Numeric value of a field
    pub fn number(&self, field: FieldName) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_f64)
    }

    /// Whether a field holds a value
    pub fn contains(&self, field: FieldName) -> bool {
        self.slots[field.index()].is_some()
    }

    /// Store a value, returning the previous one
    pub fn set(&mut self, field: FieldName, value: FieldValue) -> Option<FieldValue> {
        self.slots[field.index()].replace(value)
    }

    /// Clear a field, returning its value
    pub fn remove(&mut self, field: FieldName) -> Option<FieldValue> {
        self.slots[field.index()].take()
    }

    /// Present fields in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &FieldValue)> + '_ {
        FieldName::ALL
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(field, slot)| slot.as_ref().map(|v| (*field, v)))
    }

    /// Fields from `wanted` that have no value
    pub fn missing(&self, wanted: &[FieldName]) -> Vec<FieldName> {
        wanted.iter().copied().filter(|f| !self.contains(*f)).collect()
    }

    /// Number of present fields
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Whether no field is present
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<(FieldName, FieldValue)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (FieldName, FieldValue)>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for (field, value) in iter {
            set.set(field, value);
        }
        set
    }
}

impl Serialize for FieldSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}

/// What one extractor produced for one page
///
/// Immutable once built: fields and rejections are only readable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    source: Source,
    fields: FieldSet,
    rejections: Vec<Rejection>,
}

impl ExtractionResult {
    /// Create a result
    pub fn new(source: Source, fields: FieldSet, rejections: Vec<Rejection>) -> Self {
        Self {
            source,
            fields,
            rejections,
        }
    }

    /// A result with nothing in it
    pub fn empty(source: Source) -> Self {
        Self::new(source, FieldSet::new(), Vec::new())
    }

    /// Extractor that produced this result
    pub fn source(&self) -> Source {
        self.source
    }

    /// Accepted fields
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Candidate values that were found but dropped
    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }

    /// Value of one field
    pub fn get(&self, field: FieldName) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Whether no field was accepted
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Where a reconciled value came from (advisory)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    /// Extractor whose value was kept
    pub source: Source,

    /// Short reason, e.g. "baseline precedence" or the override predicate
    pub note: String,
}

/// The merged record for one listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRecord {
    listing_id: String,
    fields: FieldSet,
    provenance: BTreeMap<FieldName, Provenance>,
}

impl ReconciledRecord {
    /// Assemble a record; only the reconciler builds these
    pub fn new(
        listing_id: impl Into<String>,
        fields: FieldSet,
        provenance: BTreeMap<FieldName, Provenance>,
    ) -> Self {
        Self {
            listing_id: listing_id.into(),
            fields,
            provenance,
        }
    }

    /// Identifier of the listing
    pub fn listing_id(&self) -> &str {
        &self.listing_id
    }

    /// Merged fields
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Value of one field
    pub fn get(&self, field: FieldName) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Provenance per present field
    pub fn provenance(&self) -> &BTreeMap<FieldName, Provenance> {
        &self.provenance
    }

    /// Source of one field's value
    pub fn source_of(&self, field: FieldName) -> Option<Source> {
        self.provenance.get(&field).map(|p| p.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fieldset_set_and_get() {
        let mut set = FieldSet::new();
        assert!(set.is_empty());
        assert_eq!(set.set(FieldName::Price, FieldValue::Number(200000.0)), None);
        assert_eq!(
            set.set(FieldName::Price, FieldValue::Number(210000.0)),
            Some(FieldValue::Number(200000.0))
        );
        assert_eq!(set.number(FieldName::Price), Some(210000.0));
        assert_eq!(set.len(), 1);
        assert!(set.remove(FieldName::Price).is_some());
        assert!(set.is_empty());
    }

    #[test]
    fn test_fieldset_iterates_in_canonical_order() {
        let set: FieldSet = vec![
            (FieldName::City, FieldValue::text("Wien")),
            (FieldName::Title, FieldValue::text("Altbau")),
            (FieldName::Price, FieldValue::Number(1.0)),
        ]
        .into_iter()
        .collect();
        let order: Vec<FieldName> = set.iter().map(|(f, _)| f).collect();
        assert_eq!(order, vec![FieldName::Title, FieldName::Price, FieldName::City]);
    }

    #[test]
    fn test_missing() {
        let set: FieldSet = vec![(FieldName::Price, FieldValue::Number(1.0))]
            .into_iter()
            .collect();
        assert_eq!(
            set.missing(&[FieldName::Price, FieldName::SizeSqm]),
            vec![FieldName::SizeSqm]
        );
    }

    #[test]
    fn test_fieldset_serializes_as_map() {
        let set: FieldSet = vec![
            (FieldName::Rooms, FieldValue::Number(2.0)),
            (FieldName::Elevator, FieldValue::Boolean(true)),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["rooms"], 2.0);
        assert_eq!(json["elevator"], true);
        assert!(json.get("price").is_none());
    }

    #[test]
    fn test_record_provenance() {
        let mut provenance = BTreeMap::new();
        provenance.insert(
            FieldName::Price,
            Provenance {
                source: Source::StructuredData,
                note: "baseline precedence".to_string(),
            },
        );
        let fields: FieldSet = vec![(FieldName::Price, FieldValue::Number(1.0))]
            .into_iter()
            .collect();
        let record = ReconciledRecord::new("listing-1", fields, provenance);
        assert_eq!(record.listing_id(), "listing-1");
        assert_eq!(record.source_of(FieldName::Price), Some(Source::StructuredData));
        assert_eq!(record.source_of(FieldName::SizeSqm), None);
    }
}
