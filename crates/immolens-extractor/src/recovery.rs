//! Recover a field dictionary from free-form model output
//!
//! Models asked for JSON still wrap it in prose, fence it in Markdown, leave
//! trailing commas, or use single quotes. The strategies below are tried in
//! order and the first one that yields a JSON object wins.

use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

static FENCED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid regex"));
static UNQUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*:)").expect("valid regex")
});
static SINGLE_QUOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{\[,:]\s*)'((?:[^'\\]|\\.|'[^,:}\]\s])*)'").expect("valid regex")
});
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));
static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#""([A-Za-z_][A-Za-z0-9_]*)"\s*:\s*("(?:[^"\\]|\\.)*"|-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?|true|false|null)"#,
    )
    .expect("valid regex")
});

/// Which recovery step produced the dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Whole response parsed as JSON
    Direct,
    /// First fenced code block parsed
    FencedBlock,
    /// Outermost `{...}` span parsed
    BraceSpan,
    /// Brace span parsed after textual repairs
    Repaired,
    /// `"key": value` pairs collected one by one
    KeyValueScan,
}

impl RecoveryStrategy {
    /// Snake-case name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStrategy::Direct => "direct",
            RecoveryStrategy::FencedBlock => "fenced_block",
            RecoveryStrategy::BraceSpan => "brace_span",
            RecoveryStrategy::Repaired => "repaired",
            RecoveryStrategy::KeyValueScan => "key_value_scan",
        }
    }
}

impl fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dictionary recovered from model output
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    /// Step that succeeded
    pub strategy: RecoveryStrategy,
    /// Raw key/value pairs, not yet validated
    pub fields: Map<String, Value>,
}

/// Run the recovery cascade; `None` when every strategy fails
///
/// # Examples
///
/// ```
/// use immolens_extractor::{recover, RecoveryStrategy};
///
/// let text = "Hier das Ergebnis:\n```json\n{\"price\": 200000}\n```\nViel Erfolg!";
/// let recovered = recover(text).unwrap();
/// assert_eq!(recovered.strategy, RecoveryStrategy::FencedBlock);
/// assert_eq!(recovered.fields["price"], 200000);
/// ```
pub fn recover(text: &str) -> Option<Recovered> {
    let found = |strategy, fields| Some(Recovered { strategy, fields });

    if let Some(fields) = parse_object(text) {
        return found(RecoveryStrategy::Direct, fields);
    }

    if let Some(block) = FENCED.captures(text).and_then(|c| c.get(1)) {
        if let Some(fields) = parse_object(block.as_str()) {
            return found(RecoveryStrategy::FencedBlock, fields);
        }
    }

    if let Some(span) = brace_span(text) {
        if let Some(fields) = parse_object(span) {
            return found(RecoveryStrategy::BraceSpan, fields);
        }
        if let Some(fields) = parse_object(&repair(span)) {
            return found(RecoveryStrategy::Repaired, fields);
        }
    }

    let scanned = scan_pairs(text);
    if !scanned.is_empty() {
        return found(RecoveryStrategy::KeyValueScan, scanned);
    }

    None
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// From the first `{` to the last `}`
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Quote bare keys, drop trailing commas, and switch single-quoted strings to
/// double quotes; an apostrophe inside a string is left alone
fn repair(span: &str) -> String {
    let fixed = SINGLE_QUOTE.replace_all(span, "$1\"$2\"");
    let fixed = UNQUOTED_KEY.replace_all(&fixed, "$1\"$2\"$3");
    TRAILING_COMMA.replace_all(&fixed, "$1").into_owned()
}

/// Collect `"key": value` pairs; the first occurrence of a key wins
fn scan_pairs(text: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    for caps in KEY_VALUE.captures_iter(text) {
        let key = caps[1].to_string();
        if fields.contains_key(&key) {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(&caps[2]) {
            fields.insert(key, value);
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct() {
        let recovered = recover(r#" {"price": 200000, "elevator": true} "#).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::Direct);
        assert_eq!(recovered.fields["elevator"], json!(true));
    }

    #[test]
    fn test_fenced_block_matches_direct_parse() {
        let text = "prose... ```json\n{\"price\": 200000}\n``` ...prose";
        let recovered = recover(text).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::FencedBlock);
        assert_eq!(
            recovered.fields,
            recover("{\"price\": 200000}").unwrap().fields
        );
    }

    #[test]
    fn test_brace_span_inside_prose() {
        let text = r#"Ich habe folgende Werte gefunden: {"rooms": 3, "city": "Graz"} Hoffe das hilft."#;
        let recovered = recover(text).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::BraceSpan);
        assert_eq!(recovered.fields["city"], json!("Graz"));
    }

    #[test]
    fn test_repairs() {
        let text = "Ergebnis: {price: 199000, 'city': 'Linz', balcony: true,}";
        let recovered = recover(text).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::Repaired);
        assert_eq!(recovered.fields["price"], json!(199000));
        assert_eq!(recovered.fields["city"], json!("Linz"));
        assert_eq!(recovered.fields["balcony"], json!(true));
    }

    #[test]
    fn test_repair_keeps_apostrophes_inside_values() {
        let text = "{'address': 'Top 3, Hof', 'title': 'Wohnen im d'Or', rooms: 2}";
        let recovered = recover(text).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::Repaired);
        assert_eq!(recovered.fields["address"], json!("Top 3, Hof"));
        assert_eq!(recovered.fields["title"], json!("Wohnen im d'Or"));
        assert_eq!(recovered.fields["rooms"], json!(2));
    }

    #[test]
    fn test_key_value_scan_as_last_resort() {
        let text = r#"price is "price": 250000 and "elevator": false, also "price": 1 "note": "x"#;
        let recovered = recover(text).unwrap();
        assert_eq!(recovered.strategy, RecoveryStrategy::KeyValueScan);
        assert_eq!(recovered.fields["price"], json!(250000));
        assert_eq!(recovered.fields["elevator"], json!(false));
    }

    #[test]
    fn test_arrays_are_not_dictionaries() {
        assert!(recover("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_nothing_recoverable() {
        assert!(recover("Leider konnte ich keine Daten finden.").is_none());
        assert!(recover("").is_none());
    }
}
