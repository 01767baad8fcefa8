//! Gatekeeper error types

use thiserror::Error;

/// Errors that can occur during gatekeeper setup
///
/// A record that fails the gate is not an error; it comes back flagged.
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
