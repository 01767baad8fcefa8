//! Reconciler error types

use thiserror::Error;

/// Errors that can occur while setting up the reconciler
///
/// Merging itself cannot fail; it always produces a record.
#[derive(Error, Debug)]
pub enum ReconcilerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
