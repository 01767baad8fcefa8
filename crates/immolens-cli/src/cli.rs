//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Immolens - Turn apartment listing pages into reconciled records.
#[derive(Debug, Parser)]
#[command(name = "immolens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "IMMOLENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs and paths only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process listing pages and print the records
    Extract(ExtractArgs),

    /// Process a folder of listing pages and persist the records
    Run(RunArgs),

    /// Print the effective plausibility bounds
    Bounds,

    /// Check that the text-generation endpoint is up
    CheckLlm,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// HTML files, one listing each
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Skip the model even if the configuration enables it
    #[arg(long)]
    pub no_llm: bool,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Folder of *.html listing pages
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output folder (defaults to the configured one)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the model even if the configuration enables it
    #[arg(long)]
    pub no_llm: bool,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
