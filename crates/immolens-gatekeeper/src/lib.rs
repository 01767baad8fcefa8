//! Immolens Gatekeeper
//!
//! Decides whether a reconciled record is complete enough for scoring.
//!
//! A record that fails is never dropped. It is returned as a
//! [`ValidatedRecord`] flagged for review, with the missing and invalid
//! required fields named, so partial data survives for reprocessing.
//!
//! # Examples
//!
//! ```
//! use immolens_domain::{DecisionLog, FieldName, FieldSet, FieldValue, ReconciledRecord};
//! use immolens_gatekeeper::ValidationGate;
//! use std::collections::BTreeMap;
//!
//! let mut fields = FieldSet::new();
//! fields.set(FieldName::SizeSqm, FieldValue::number(70.0));
//! let record = ReconciledRecord::new("listing-1", fields, BTreeMap::new());
//!
//! let gate = ValidationGate::default();
//! let outcome = gate.check(&record);
//! assert!(!outcome.usable);
//! assert!(outcome.reason.unwrap().contains("price"));
//!
//! let sealed = gate.seal(record, DecisionLog::new());
//! assert_eq!(sealed.record.get(FieldName::SizeSqm), Some(&FieldValue::Number(70.0)));
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::GateConfig;
pub use error::GatekeeperError;
pub use validator::{GateOutcome, ReviewStatus, ValidatedRecord, ValidationGate};
