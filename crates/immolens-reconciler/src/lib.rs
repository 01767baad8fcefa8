//! Immolens Reconciler
//!
//! Turns the partial, sometimes contradictory results of the extractors into
//! one record per listing, and explains every choice it made.
//!
//! # Precedence
//!
//! | Field group | Order |
//! |---|---|
//! | title, price, address, postal code, city | structured, pattern, DOM |
//! | recurring costs | pattern, DOM, structured |
//! | everything else | structured, pattern, DOM |
//!
//! The model's result comes last. It fills fields that are still empty, and
//! replaces a present value only when [`SuspicionRules`] flag that value and
//! not the candidate. For costs the candidate must also clear the floor and
//! exceed the current value by the override margin.
//!
//! # Examples
//!
//! ```
//! use immolens_domain::{DecisionKind, ExtractionResult, FieldName, FieldSet, FieldValue, Source};
//! use immolens_reconciler::{MergeInputs, ReconciliationEngine};
//!
//! let mut pattern = FieldSet::new();
//! pattern.set(FieldName::MonthlyRecurringCost, FieldValue::number(12.0));
//! let pattern = ExtractionResult::new(Source::Pattern, pattern, Vec::new());
//!
//! let mut llm = FieldSet::new();
//! llm.set(FieldName::MonthlyRecurringCost, FieldValue::number(145.0));
//! let llm = ExtractionResult::new(Source::Llm, llm, Vec::new());
//!
//! let empty = |s| ExtractionResult::empty(s);
//! let (record, log) = ReconciliationEngine::default().merge(
//!     "listing-1",
//!     MergeInputs {
//!         structured: &empty(Source::StructuredData),
//!         pattern: &pattern,
//!         dom: &empty(Source::DomHeuristic),
//!         llm: Some(&llm),
//!     },
//! );
//!
//! assert_eq!(record.get(FieldName::MonthlyRecurringCost), Some(&FieldValue::Number(145.0)));
//! assert_eq!(log.count(DecisionKind::Overwritten), 1);
//! ```

#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod suspicion;

#[cfg(test)]
mod tests;

pub use config::{ReconcilerConfig, SuspicionRules};
pub use engine::{MergeInputs, ReconciliationEngine};
pub use error::ReconcilerError;
pub use suspicion::Suspicion;
