//! Source module - which extractor produced a value

use serde::{Deserialize, Serialize};
use std::fmt;

/// The extractor a candidate value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Embedded JSON-LD metadata published by the listing platform
    StructuredData,

    /// Ordered regex patterns over the page text
    Pattern,

    /// Label/value pairs found in table-like markup
    DomHeuristic,

    /// Text-generation model
    Llm,
}

impl Source {
    /// Get the source name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::StructuredData => "structured_data",
            Source::Pattern => "pattern",
            Source::DomHeuristic => "dom_heuristic",
            Source::Llm => "llm",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
