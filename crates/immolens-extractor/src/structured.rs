//! JSON-LD metadata published by the listing platform

use crate::validate::{Collector, FieldValidator};
use immolens_domain::{ExtractionResult, FieldExtractor, FieldName, Source};
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static LD_JSON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector")
});
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static OG_TITLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:title"]"#).expect("valid selector")
});

/// `@type` values that describe the listed unit
const LISTING_TYPES: &[&str] = &[
    "Product",
    "Offer",
    "Residence",
    "Apartment",
    "House",
    "SingleFamilyResidence",
    "Accommodation",
    "RealEstateListing",
];

/// Reads title, price, location and size from embedded JSON-LD
#[derive(Debug, Clone, Default)]
pub struct StructuredDataExtractor {
    validator: FieldValidator,
}

impl StructuredDataExtractor {
    /// Create an extractor that checks candidates with `validator`
    pub fn new(validator: FieldValidator) -> Self {
        Self { validator }
    }

    /// Extract from a parsed document
    pub fn extract_document(&self, document: &Html) -> ExtractionResult {
        let mut collector = Collector::new(&self.validator, Source::StructuredData);

        if let Some(listing) = find_listing(document) {
            self.read_listing(&mut collector, &listing);
        }

        if !collector.has(FieldName::Title) {
            if let Some(h1) = document.select(&H1).next() {
                collector.offer_text(FieldName::Title, &h1.text().collect::<String>());
            }
        }
        if !collector.has(FieldName::Title) {
            if let Some(content) = document
                .select(&OG_TITLE)
                .next()
                .and_then(|meta| meta.value().attr("content"))
            {
                collector.offer_text(FieldName::Title, content);
            }
        }

        collector.finish()
    }

    fn read_listing(&self, collector: &mut Collector<'_>, listing: &Value) {
        if let Some(name) = listing.get("name") {
            collector.offer_json(FieldName::Title, name);
        }

        let offer = match listing.get("offers") {
            Some(Value::Array(offers)) => offers.first(),
            other => other,
        };
        // an Offer can be the listing itself
        let offer = offer.or_else(|| listing.get("price").map(|_| listing));
        if let Some(price) = offer.and_then(|o| o.get("price")) {
            collector.offer_json(FieldName::Price, price);
        }

        let address = offer
            .and_then(|o| o.pointer("/availableAtOrFrom/address"))
            .or_else(|| listing.get("address"));
        match address {
            Some(Value::Object(parts)) => {
                for (key, field) in [
                    ("streetAddress", FieldName::Address),
                    ("postalCode", FieldName::PostalCode),
                    ("addressLocality", FieldName::City),
                ] {
                    if let Some(value) = parts.get(key) {
                        collector.offer_json(field, value);
                    }
                }
            }
            Some(value @ Value::String(_)) => {
                collector.offer_json(FieldName::Address, value);
            }
            _ => {}
        }

        if let Some(size) = listing.get("floorSize") {
            let size = size.get("value").unwrap_or(size);
            collector.offer_json(FieldName::SizeSqm, size);
        }

        for (key, field) in [
            ("numberOfRooms", FieldName::Rooms),
            ("numberOfBedrooms", FieldName::Bedrooms),
            ("numberOfBathroomsTotal", FieldName::Bathrooms),
            ("yearBuilt", FieldName::YearBuilt),
        ] {
            if let Some(value) = listing.get(key) {
                collector.offer_json(field, value);
            }
        }
    }
}

/// First listing-like object across all JSON-LD blocks
fn find_listing(document: &Html) -> Option<Value> {
    for (idx, script) in document.select(&LD_JSON).enumerate() {
        let raw = script.text().collect::<String>();
        let parsed: Value = match serde_json::from_str(raw.trim()) {
            Ok(v) => v,
            Err(e) => {
                debug!(block = idx, error = %e, "Skipping unparsable JSON-LD block");
                continue;
            }
        };
        if let Some(listing) = first_listing(parsed) {
            return Some(listing);
        }
    }
    None
}

fn first_listing(value: Value) -> Option<Value> {
    match value {
        Value::Array(items) => items.into_iter().find_map(first_listing),
        Value::Object(mut map) => {
            if is_listing_type(map.get("@type")) {
                return Some(Value::Object(map));
            }
            map.remove("@graph").and_then(first_listing)
        }
        _ => None,
    }
}

fn is_listing_type(ty: Option<&Value>) -> bool {
    match ty {
        Some(Value::String(s)) => LISTING_TYPES.contains(&s.as_str()),
        Some(Value::Array(types)) => types.iter().any(|t| is_listing_type(Some(t))),
        _ => false,
    }
}

impl FieldExtractor for StructuredDataExtractor {
    fn source(&self) -> Source {
        Source::StructuredData
    }

    fn extract(&self, html: &str) -> ExtractionResult {
        self.extract_document(&Html::parse_document(html))
    }
}
