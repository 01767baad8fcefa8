//! Ordered regex patterns over the flattened page text
//!
//! For every field the patterns are tried in declared order and the first
//! candidate that survives coercion and bounds wins. A candidate that parses
//! but is implausible does not end the search for that field; the next
//! pattern gets its turn. Enumerated fields and feature flags are keyword
//! lookups with no bounds beyond the field's vocabulary.

use crate::preprocess::visible_text;
use crate::validate::{Collector, FieldValidator};
use immolens_domain::{ExtractionResult, FieldExtractor, FieldName, Source};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// A German number, optionally followed by a range separator and a second number
const NUM: &str = r"(\d[\d.,]*(?:\s*(?:-|–|bis|~|to)\s*\d[\d.,]*)?)";

/// Optional currency marker between a label and its amount
const CUR: &str = r"(?:€|EUR)?\s*";

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("pattern table entries are valid regexes")
}

static VALUE_PATTERNS: LazyLock<Vec<(FieldName, Vec<Regex>)>> = LazyLock::new(|| {
    vec![
        (
            FieldName::Price,
            vec![
                re(&format!(r"(?i)Kaufpreis[:\s]*{CUR}{NUM}")),
                re(&format!(r"(?i)€\s*{NUM}")),
                re(&format!(r"(?i){NUM}\s*€")),
                re(&format!(r"(?i)EUR\s*{NUM}")),
                re(&format!(r"(?i){NUM}\s*EUR")),
            ],
        ),
        (
            FieldName::SizeSqm,
            vec![
                re(&format!(r"(?i){NUM}\s*m[²2]")),
                re(&format!(r"(?i)Wohnfläche[:\s]*(?:ca\.?\s*)?{NUM}")),
                re(&format!(r"(?i)Nutzfläche[:\s]*(?:ca\.?\s*)?{NUM}")),
                re(&format!(r"(?i)Fläche[:\s]*(?:ca\.?\s*)?{NUM}")),
            ],
        ),
        (
            FieldName::Rooms,
            vec![
                re(&format!(r"(?i){NUM}\s*Zimmer")),
                re(&format!(r"(?i){NUM}\s*Zi\b")),
                re(&format!(r"(?i){NUM}\s*Räume")),
                re(&format!(r"(?i)\bZimmer(?:anzahl)?[:\s]+{NUM}")),
            ],
        ),
        (
            FieldName::Bedrooms,
            vec![
                re(r"(?i)(\d+)\s*Schlafzimmer"),
                re(r"(?i)Schlafzimmer[:\s]+(\d+)"),
            ],
        ),
        (
            FieldName::Bathrooms,
            vec![
                re(r"(?i)(\d+)\s*(?:Badezimmer|Bäder|Bad)\b"),
                re(r"(?i)(?:Badezimmer|Bäder)[:\s]+(\d+)"),
            ],
        ),
        (
            FieldName::Floor,
            vec![
                re(r"(?i)(\d{1,2})\.\s*(?:Stock|OG|Obergeschoss|Etage)\b"),
                re(r"(?i)\b(?:Stockwerk|Stock|Etage)[:\s]+(\d{1,2})\b"),
                re(r"(?i)\b(Erdgeschoss|Erdgeschoß|Hochparterre|Parterre|EG|HP|Souterrain|Untergeschoss|UG|Mezzanin)\b"),
            ],
        ),
        (
            FieldName::YearBuilt,
            vec![
                re(r"(?i)Baujahr[:\s]*(?:ca\.?\s*)?(\d{4})"),
                re(r"(?i)(?:erbaut|gebaut)[:\s]*(?:im\s+)?(?:Jahr\s+)?(\d{4})"),
                re(r"(?i)\baus\s+(?:dem\s+Jahr\s+)?(\d{4})\b"),
            ],
        ),
        (
            FieldName::EnergyRating,
            vec![re(
                r"(?i)(?:Energieeffizienzklasse|Energieklasse|HWB-Klasse)[:\s]*([A-G]\+{0,2})(?:[\s,;.)/]|$)",
            )],
        ),
        (
            FieldName::HwbValue,
            vec![
                re(&format!(r"(?i)\bHWB[:\s]*(?:Wert)?[:\s]*{NUM}\s*kWh")),
                re(&format!(r"(?i)Heizwärmebedarf[:\s]*{NUM}")),
            ],
        ),
        (
            FieldName::FgeeValue,
            vec![re(&format!(r"(?i)\bfGEE[:\s]*(?:Wert)?[:\s]*{NUM}"))],
        ),
        (
            FieldName::MonthlyRecurringCost,
            vec![
                re(&format!(r"(?i)Betriebskosten[:\s]*{CUR}{NUM}")),
                re(&format!(r"(?i)Nebenkosten[:\s]*{CUR}{NUM}")),
                re(&format!(r"(?i)\bBK[:\s]*{CUR}{NUM}")),
                re(&format!(r"(?i)\bNK[:\s]*{CUR}{NUM}")),
                re(&format!(r"(?i)monatl\.?\s*(?:Betriebs|Neben)kosten[:\s]*{CUR}{NUM}")),
                re(&format!(r"(?is)(?:Betriebs|Neben)kosten.*?€\s*{NUM}")),
                re(&format!(r"(?is)\b(?:BK|NK)\b.*?€\s*{NUM}")),
            ],
        ),
        (
            FieldName::RepairFundContribution,
            vec![
                re(&format!(r"(?i)Reparaturrücklage[:\s]*{CUR}{NUM}")),
                re(&format!(r"(?i)Reparaturfonds[:\s]*{CUR}{NUM}")),
                re(&format!(r"(?i)Rep\.?\s*Rücklage[:\s]*{CUR}{NUM}")),
                re(&format!(r"(?i)Rücklage[:\s]*{CUR}{NUM}")),
            ],
        ),
        (
            FieldName::CommissionPercent,
            vec![re(r"(?i)(?:Makler)?provision[:\s]*(\d[\d.,]*)\s*%")],
        ),
    ]
});

/// Keyword tables for enumerated fields; the more specific phrase comes first
static KEYWORD_TABLES: LazyLock<Vec<(FieldName, Vec<(&'static str, Regex)>)>> =
    LazyLock::new(|| {
        vec![
            (
                FieldName::Condition,
                vec![
                    ("erstbezug_nach_sanierung", re(r"(?i)Erstbezug\s+nach\s+(?:Sanierung|Renovierung)")),
                    ("erstbezug", re(r"(?i)Erstbezug")),
                    ("renovierungsbedurftig", re(r"(?i)(?:renovierungs|sanierungs)bedürftig")),
                    ("saniert", re(r"(?i)\b(?:frisch\s+)?(?:saniert|renoviert)\b")),
                    ("neuwertig", re(r"(?i)neuwertig")),
                    ("sehr_gut", re(r"(?i)sehr\s+gut(?:er|em)?\s+Zustand")),
                    ("gut", re(r"(?i)\bgut(?:er|em)?\s+Zustand")),
                    ("gepflegt", re(r"(?i)gepflegt")),
                ],
            ),
            (
                FieldName::BuildingType,
                vec![
                    ("altbau", re(r"(?i)Altbau")),
                    ("neubau", re(r"(?i)Neubau")),
                    ("grunderzeit", re(r"(?i)Gründerzeit")),
                    ("zwischenkrieg", re(r"(?i)Zwischenkriegs")),
                    ("nachkrieg", re(r"(?i)Nachkriegs")),
                ],
            ),
            (
                FieldName::HeatingType,
                vec![
                    ("fernwarme", re(r"(?i)Fernwärme")),
                    ("gas", re(r"(?i)\bGas(?:heizung|therme)?\b")),
                    ("zentralheizung", re(r"(?i)Zentralheizung")),
                    ("etagenheizung", re(r"(?i)Etagenheizung")),
                    ("fussbodenheizung", re(r"(?i)Fu(?:ß|ss)bodenheizung")),
                    ("elektro", re(r"(?i)\bElektro(?:heizung)?\b")),
                    ("warmepumpe", re(r"(?i)Wärmepumpe")),
                    ("ol", re(r"(?i)\bÖl(?:heizung)?\b")),
                    ("pellets", re(r"(?i)Pellets?(?:heizung)?")),
                    ("solar", re(r"(?i)\bSolar(?:thermie|anlage)?\b")),
                ],
            ),
            (
                FieldName::Parking,
                vec![
                    ("tiefgarage", re(r"(?i)Tiefgarage")),
                    ("garage", re(r"(?i)\bGarage")),
                    ("stellplatz", re(r"(?i)Stellplatz")),
                    ("carport", re(r"(?i)Carport")),
                    ("parkplatz", re(r"(?i)Parkplatz")),
                ],
            ),
        ]
    });

/// Feature flags detected by keyword presence
static FLAG_PATTERNS: LazyLock<Vec<(FieldName, Regex)>> = LazyLock::new(|| {
    vec![
        (FieldName::Elevator, re(r"(?i)\b(?:Aufzug|Lift|Fahrstuhl|Personenaufzug)")),
        (FieldName::Balcony, re(r"(?i)Balkon")),
        (FieldName::Terrace, re(r"(?i)Terrasse")),
        (FieldName::Loggia, re(r"(?i)Loggia")),
        (FieldName::Garden, re(r"(?i)\b(?:Eigen)?garten(?:anteil|nutzung|benützung)?\b")),
        (FieldName::Cellar, re(r"(?i)Keller(?:abteil)?")),
        (FieldName::Storage, re(r"(?i)(?:Abstell|Lager)raum")),
        (FieldName::Furnished, re(r"(?i)\b(?:teil)?möbliert|\bvoll\s+eingerichtet")),
        (FieldName::BarrierFree, re(r"(?i)barrierefrei")),
        (FieldName::CommissionFree, re(r"(?i)provisions?frei|keine\s+(?:Makler)?provision")),
    ]
});

/// Map free text to a vocabulary key using the field's keyword table
///
/// Returns `None` for fields without a table or when nothing matches.
pub fn classify(field: FieldName, text: &str) -> Option<&'static str> {
    KEYWORD_TABLES
        .iter()
        .find(|(f, _)| *f == field)
        .and_then(|(_, table)| {
            table
                .iter()
                .find(|(_, pattern)| pattern.is_match(text))
                .map(|(key, _)| *key)
        })
}

/// Regex-based extractor over the visible page text
#[derive(Debug, Clone, Default)]
pub struct PatternExtractor {
    validator: FieldValidator,
}

impl PatternExtractor {
    /// Create an extractor that checks candidates with `validator`
    pub fn new(validator: FieldValidator) -> Self {
        Self { validator }
    }

    /// Extract from already-flattened text
    pub fn extract_text(&self, text: &str) -> ExtractionResult {
        let mut collector = Collector::new(&self.validator, Source::Pattern);

        for (field, patterns) in VALUE_PATTERNS.iter() {
            for pattern in patterns {
                let Some(captured) = pattern.captures(text).and_then(|c| c.get(1)) else {
                    continue;
                };
                if collector.offer_text(*field, captured.as_str()) {
                    break;
                }
            }
        }

        for (field, _) in KEYWORD_TABLES.iter() {
            if let Some(key) = classify(*field, text) {
                collector.offer_text(*field, key);
            }
        }

        for (field, pattern) in FLAG_PATTERNS.iter() {
            if pattern.is_match(text) {
                collector.flag(*field);
            }
        }

        let rejected = collector.rejection_count();
        let result = collector.finish();
        debug!(
            fields = result.fields().len(),
            rejected, "Pattern extraction complete"
        );
        result
    }
}

impl FieldExtractor for PatternExtractor {
    fn source(&self) -> Source {
        Source::Pattern
    }

    fn extract(&self, html: &str) -> ExtractionResult {
        self.extract_text(&visible_text(html))
    }
}
