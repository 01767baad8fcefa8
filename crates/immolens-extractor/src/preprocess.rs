//! Page text preparation
//!
//! Two views of a page are needed: the visible text for pattern matching,
//! and a compacted HTML string for the model that keeps JSON-LD blocks and
//! attribute tables while staying inside a character budget.

use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;
use tracing::debug;

/// Elements whose text is never shown to the reader
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Marker appended when the page did not fit the budget
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

static LD_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type=["']application/ld\+json["'][^>]*>.*?</script>"#)
        .expect("valid regex")
});
static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").expect("valid regex"));
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x00LD(\d+)\x00").expect("valid regex"));

/// Sections that carry listing attributes, in priority order
static PRIORITY_SECTIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?is)<script[^>]*type=["']application/ld\+json["'][^>]*>.*?</script>"#,
        r"(?is)<table[^>]*>.*?</table>",
        r#"(?is)<div[^>]*class="[^"]*(?:specification|attributes)[^"]*"[^>]*>.*?</div>"#,
        r"(?is)<dl[^>]*>.*?</dl>",
        r"(?is)<ul[^>]*>.*?</ul>",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// How the page was shortened to fit the budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// Page fit as is
    None,
    /// Only priority sections were kept
    Priority,
    /// Content was cut at the budget
    Hard,
}

/// Compacted page text for the model
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    /// Text to embed in the prompt
    pub text: String,
    /// What was done to fit the budget
    pub truncation: Truncation,
}

/// Strip scripts and styles (keeping JSON-LD), collapse whitespace, and fit
/// the result into `max_chars`
pub fn preprocess_html(html: &str, max_chars: usize) -> Preprocessed {
    let mut kept = Vec::new();
    let protected = LD_JSON.replace_all(html, |caps: &regex::Captures| {
        kept.push(caps[0].to_string());
        format!("\x00LD{}\x00", kept.len() - 1)
    });

    let stripped = SCRIPT.replace_all(&protected, "");
    let stripped = STYLE.replace_all(&stripped, "");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let collapsed = BETWEEN_TAGS.replace_all(&collapsed, "><");

    let cleaned = PLACEHOLDER
        .replace_all(&collapsed, |caps: &regex::Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| kept.get(i).cloned())
                .unwrap_or_default()
        })
        .trim()
        .to_string();

    let original_chars = cleaned.chars().count();
    if original_chars <= max_chars {
        return Preprocessed {
            text: cleaned,
            truncation: Truncation::None,
        };
    }

    let priority: Vec<&str> = PRIORITY_SECTIONS
        .iter()
        .flat_map(|pattern| pattern.find_iter(&cleaned).map(|m| m.as_str()))
        .collect();
    let priority = priority.join("\n");

    let (mut text, truncation) = if !priority.is_empty() && priority.chars().count() <= max_chars {
        (priority, Truncation::Priority)
    } else if !priority.is_empty() {
        (truncate_chars(&priority, max_chars).to_string(), Truncation::Hard)
    } else {
        (truncate_chars(&cleaned, max_chars).to_string(), Truncation::Hard)
    };

    debug!(
        from = original_chars,
        to = text.chars().count(),
        ?truncation,
        "Truncated page for model"
    );
    text.push_str(TRUNCATION_MARKER);
    Preprocessed { text, truncation }
}

/// The first `max_chars` characters of `s`
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Visible text of a page: text nodes outside scripts and styles, joined by
/// single spaces
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::with_capacity(html.len() / 2);

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        for word in text.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><style>.x { color: red }</style></head>
        <body>
          <script>track("Betriebskosten 1");</script>
          <script type="application/ld+json">{"@type": "Product", "name": "Wohnung"}</script>
          <h1>  Helle   Wohnung  </h1>
          <table><tr><td>Betriebskosten</td><td>€ 145,00</td></tr></table>
        </body></html>"#;

    #[test]
    fn test_scripts_removed_json_ld_kept() {
        let out = preprocess_html(PAGE, 10_000);
        assert_eq!(out.truncation, Truncation::None);
        assert!(!out.text.contains("track("));
        assert!(!out.text.contains("color: red"));
        assert!(out.text.contains(r#""@type": "Product""#));
        assert!(out.text.contains("<td>Betriebskosten</td><td>€ 145,00</td>"));
    }

    #[test]
    fn test_priority_truncation_keeps_tables() {
        let filler = "<p>Lorem ipsum dolor sit amet.</p>".repeat(200);
        let html = format!("<body>{}<table><tr><td>BK</td><td>€ 99</td></tr></table></body>", filler);
        let out = preprocess_html(&html, 500);
        assert_eq!(out.truncation, Truncation::Priority);
        assert!(out.text.starts_with("<table>"));
        assert!(out.text.ends_with(TRUNCATION_MARKER));
        assert!(!out.text.contains("Lorem"));
    }

    #[test]
    fn test_hard_truncation_without_priority_sections() {
        let html = format!("<body>{}</body>", "<p>Text ohne Tabelle</p>".repeat(100));
        let out = preprocess_html(&html, 100);
        assert_eq!(out.truncation, Truncation::Hard);
        assert_eq!(out.text.chars().count(), 100 + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("Fläche", 3), "Flä");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_visible_text() {
        let text = visible_text(PAGE);
        assert!(text.contains("Helle Wohnung"));
        assert!(text.contains("Betriebskosten € 145,00"));
        assert!(!text.contains("track"));
        assert!(!text.contains("Product"));
    }

    #[test]
    fn test_visible_text_of_plain_text() {
        assert_eq!(visible_text("2-3 Zimmer"), "2-3 Zimmer");
    }
}
