//! Immolens Domain Layer
//!
//! This crate contains the core data model for Immolens, a pipeline that
//! turns a single apartment listing page into one reconciled record.
//! It defines the field vocabulary, the typed values, plausibility bounds,
//! German number and range parsing, and the trait seams that the extractor,
//! reconciler, and LLM layers plug into.
//!
//! ## Key Concepts
//!
//! - **FieldName**: The closed set of listing attributes the pipeline knows
//! - **ExtractionResult**: What one extractor found, plus what it threw away
//! - **ReconciledRecord**: One value per field, each tagged with its origin
//! - **DecisionLog**: Every accept, overwrite, and rejection, in order
//! - **PlausibilityBounds**: Per-field ranges and vocabularies, tunable via TOML
//!
//! ## Architecture
//!
//! - Only `serde` and `toml` as external dependencies
//! - No I/O, no async runtime
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bounds;
pub mod decision;
pub mod field;
pub mod policy;
pub mod range;
pub mod record;
pub mod rejection;
pub mod source;
pub mod traits;
pub mod value;

// Re-exports for convenience
pub use bounds::{Bound, PlausibilityBounds};
pub use decision::{Decision, DecisionKind, DecisionLog};
pub use field::{FieldKind, FieldName};
pub use policy::RetryPolicy;
pub use range::{parse_german_number, parse_number_with_range, ParseError, RangeValue};
pub use record::{ExtractionResult, FieldSet, Provenance, ReconciledRecord};
pub use rejection::{Rejection, RejectionReason};
pub use source::Source;
pub use traits::{FieldExtractor, GenerationRequest, LlmProvider, ProviderError};
pub use value::FieldValue;
