//! Immolens CLI library.
//!
//! This library provides the command-line surface of Immolens: the
//! configuration file, the per-listing pipeline that drives the extractors,
//! the reconciler and the gate, persistence of validated records, and
//! output formatting.

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod tracker;

pub use cli::{Cli, Command};
pub use config::{Config, TriggerMode};
pub use error::{CliError, Result};
pub use output::Formatter;
pub use pipeline::{BatchReport, ListingSummary, Pipeline};
pub use tracker::TopNTracker;
