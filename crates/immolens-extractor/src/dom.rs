//! Label/value scanning over table-like markup
//!
//! Many listing pages lay out attributes as `<tr><td>Label</td><td>Value</td></tr>`,
//! `<dt>/<dd>` pairs, or `<div><span>Label</span><span>Value</span></div>`.
//! Flattening such markup can put unrelated text between a label and its
//! value, so this extractor pairs each label cell with the next cell in the
//! same row instead.

use crate::patterns::classify;
use crate::validate::{collapse_whitespace, Collector, FieldValidator};
use immolens_domain::{ExtractionResult, FieldExtractor, FieldName, Source};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

static ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr, dl, div, li").expect("valid selector"));

const ROW_TAGS: &[&str] = &["tr", "dl", "div", "li"];

/// Element names treated as cells inside a row
const CELL_TAGS: &[&str] = &["td", "th", "dt", "dd", "div", "span", "li", "p", "strong", "b"];

/// How a label keyword is compared with a cell's text
#[derive(Debug, Clone, Copy)]
enum Label {
    /// Cell text contains the keyword
    Contains(&'static str),
    /// Cell text has the keyword as a whole word
    Token(&'static str),
}

impl Label {
    fn matches(&self, lower: &str) -> bool {
        match self {
            Label::Contains(keyword) => lower.contains(keyword),
            Label::Token(keyword) => lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == *keyword),
        }
    }
}

/// Label keywords per field, lowercase
const LABELS: &[(FieldName, &[Label])] = &[
    (
        FieldName::Price,
        &[Label::Contains("kaufpreis"), Label::Token("preis")],
    ),
    (
        FieldName::SizeSqm,
        &[
            Label::Contains("wohnfläche"),
            Label::Contains("nutzfläche"),
            Label::Token("fläche"),
        ],
    ),
    (
        FieldName::Rooms,
        &[Label::Token("zimmer"), Label::Token("zimmeranzahl"), Label::Token("räume")],
    ),
    (FieldName::Bedrooms, &[Label::Contains("schlafzimmer")]),
    (
        FieldName::Bathrooms,
        &[Label::Contains("badezimmer"), Label::Token("bäder")],
    ),
    (
        FieldName::Floor,
        &[Label::Token("stockwerk"), Label::Token("etage"), Label::Token("stock"), Label::Token("geschoss")],
    ),
    (FieldName::YearBuilt, &[Label::Contains("baujahr")]),
    (FieldName::Condition, &[Label::Contains("zustand")]),
    (
        FieldName::BuildingType,
        &[Label::Contains("bauart"), Label::Contains("gebäudetyp"), Label::Contains("objekttyp")],
    ),
    (
        FieldName::EnergyRating,
        &[Label::Contains("energieklasse"), Label::Contains("energieeffizienzklasse")],
    ),
    (
        FieldName::HwbValue,
        &[Label::Token("hwb"), Label::Contains("heizwärmebedarf")],
    ),
    (FieldName::FgeeValue, &[Label::Contains("fgee")]),
    (
        FieldName::HeatingType,
        &[Label::Contains("heizung"), Label::Contains("heizungsart"), Label::Contains("befeuerung")],
    ),
    (
        FieldName::MonthlyRecurringCost,
        &[
            Label::Contains("betriebskosten"),
            Label::Contains("nebenkosten"),
            Label::Token("bk"),
            Label::Token("nk"),
        ],
    ),
    (
        FieldName::RepairFundContribution,
        &[Label::Contains("reparaturrücklage"), Label::Contains("reparaturfonds"), Label::Contains("rücklage")],
    ),
    (FieldName::CommissionPercent, &[Label::Contains("provision")]),
    (
        FieldName::Parking,
        &[Label::Contains("parken"), Label::Contains("stellplatz"), Label::Contains("garage")],
    ),
    (FieldName::Elevator, &[Label::Contains("aufzug"), Label::Token("lift")]),
    (FieldName::Balcony, &[Label::Contains("balkon")]),
    (FieldName::Terrace, &[Label::Contains("terrasse")]),
    (FieldName::Garden, &[Label::Contains("garten")]),
    (FieldName::Cellar, &[Label::Contains("keller")]),
];

/// Pairs label cells with the following cell in row-like elements
#[derive(Debug, Clone, Default)]
pub struct DomHeuristicExtractor {
    validator: FieldValidator,
}

impl DomHeuristicExtractor {
    /// Create an extractor that checks candidates with `validator`
    pub fn new(validator: FieldValidator) -> Self {
        Self { validator }
    }

    /// Extract from a parsed document
    pub fn extract_document(&self, document: &Html) -> ExtractionResult {
        let mut collector = Collector::new(&self.validator, Source::DomHeuristic);
        let mut rows = 0usize;

        for row in document.select(&ROWS) {
            let cells = cell_texts(row);
            if cells.len() < 2 {
                continue;
            }
            rows += 1;

            for pair in cells.windows(2) {
                let (label, value) = (&pair[0], &pair[1]);
                let lower = label.to_lowercase();
                // a label cell is short; long cells are prose
                if lower.chars().count() > 60 {
                    continue;
                }
                for (field, keywords) in LABELS {
                    if collector.has(*field) || !keywords.iter().any(|k| k.matches(&lower)) {
                        continue;
                    }
                    offer(&mut collector, *field, value);
                }
            }
        }

        let rejected = collector.rejection_count();
        let result = collector.finish();
        debug!(
            rows,
            fields = result.fields().len(),
            rejected,
            "DOM heuristic extraction complete"
        );
        result
    }
}

/// Enumerated fields go through the keyword tables first so that
/// "Gas-Zentralheizung" becomes "gas" rather than a vocabulary miss
fn offer(collector: &mut Collector<'_>, field: FieldName, value: &str) {
    let candidate = classify(field, value).unwrap_or(value);
    collector.offer_text(field, candidate);
}

/// Texts of the row's direct child cells, skipping empty ones
///
/// A row whose cells contain rows of their own is a container; its inner
/// rows are visited separately.
fn cell_texts(row: ElementRef<'_>) -> Vec<String> {
    let cells: Vec<ElementRef<'_>> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| CELL_TAGS.contains(&child.value().name()))
        .collect();

    let nested = cells.iter().any(|cell| {
        cell.descendants()
            .filter_map(ElementRef::wrap)
            .any(|el| is_row(el))
    });
    if nested {
        return Vec::new();
    }

    cells
        .into_iter()
        .map(|cell| collapse_whitespace(&cell.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
        .collect()
}

/// A row-like element with at least two cells of its own
fn is_row(el: ElementRef<'_>) -> bool {
    ROW_TAGS.contains(&el.value().name())
        && el
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| CELL_TAGS.contains(&child.value().name()))
            .count()
            >= 2
}

impl FieldExtractor for DomHeuristicExtractor {
    fn source(&self) -> Source {
        Source::DomHeuristic
    }

    fn extract(&self, html: &str) -> ExtractionResult {
        self.extract_document(&Html::parse_document(html))
    }
}
