//! Immolens Extractor
//!
//! Four independent ways of reading listing fields out of a page.
//!
//! # Overview
//!
//! No single strategy is reliable on its own. JSON-LD metadata is accurate but
//! sparse, regex patterns over the visible text are broad but easily fooled by
//! placeholders, table scanning catches labels separated from their values,
//! and the model reads everything but answers in free text. Each extractor
//! produces an [`ExtractionResult`](immolens_domain::ExtractionResult) whose
//! values have all passed the same coercion and plausibility bounds.
//!
//! # Architecture
//!
//! ```text
//!          ┌─ StructuredDataExtractor ─┐
//! HTML ────┼─ PatternExtractor ────────┼──→ Reconciler
//!          ├─ DomHeuristicExtractor ───┤
//!          └─ LlmExtractor (async) ────┘
//! ```
//!
//! # Example Usage
//!
//! ```
//! use immolens_domain::{FieldExtractor, FieldName, FieldValue};
//! use immolens_extractor::PatternExtractor;
//!
//! let result = PatternExtractor::default().extract("<p>Betriebskosten: € 145,00</p>");
//! assert_eq!(
//!     result.get(FieldName::MonthlyRecurringCost),
//!     Some(&FieldValue::Number(145.0))
//! );
//! ```

#![warn(missing_docs)]

mod config;
mod dom;
mod error;
mod llm;
mod patterns;
mod preprocess;
mod prompt;
mod recovery;
mod structured;
mod validate;


pub use config::ExtractorConfig;
pub use dom::DomHeuristicExtractor;
pub use error::ExtractorError;
pub use llm::LlmExtractor;
pub use patterns::{classify, PatternExtractor};
pub use preprocess::{preprocess_html, visible_text, Preprocessed, Truncation};
pub use prompt::PromptBuilder;
pub use recovery::{recover, Recovered, RecoveryStrategy};
pub use structured::StructuredDataExtractor;
pub use validate::FieldValidator;
