//! Configuration management for the CLI.
//!
//! One TOML file holds every tunable of the pipeline. Each section maps onto
//! the configuration type of the crate that consumes it, so a file can be as
//! short as one line:
//!
//! ```toml
//! [llm]
//! trigger = "aggressive"
//!
//! [bounds.fields.monthly_recurring_cost]
//! min = 20.0
//! max = 1500.0
//! ```

use crate::error::{CliError, Result};
use immolens_domain::PlausibilityBounds;
use immolens_extractor::ExtractorConfig;
use immolens_gatekeeper::GateConfig;
use immolens_reconciler::ReconcilerConfig;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Terminal output settings
    pub settings: Settings,

    /// Text-generation endpoint
    pub llm: LlmSettings,

    /// Batch processing
    pub pipeline: PipelineSettings,

    /// Per-field plausibility bounds shared by every stage
    ///
    /// Entries override the built-in table field by field.
    #[serde(deserialize_with = "bounds_over_defaults")]
    pub bounds: PlausibilityBounds,

    /// LLM extractor tuning
    pub extractor: ExtractorConfig,

    /// Suspicion thresholds for the merge
    pub reconciler: ReconcilerConfig,

    /// Required fields
    pub gate: GateConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Enable colored output
    pub color: bool,

    /// Default output format
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

/// When the model is asked about a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Never
    Off,
    /// Only for missing critical fields or suspicious values
    #[default]
    Conservative,
    /// Also whenever any prompt field is missing
    Aggressive,
    /// Every listing
    Always,
}

/// Text-generation endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Use the model at all
    pub enabled: bool,

    /// Base URL of the Ollama server
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// When to call it
    pub trigger: TriggerMode,
}

/// Batch processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Fixed pause between listings (milliseconds)
    pub delay_ms: u64,

    /// Size of the best-records report
    pub top_n: usize,

    /// Where validated records are written
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: immolens_llm::ollama::DEFAULT_ENDPOINT.to_string(),
            model: "qwen3:8b".to_string(),
            trigger: TriggerMode::Conservative,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            delay_ms: 500,
            top_n: 20,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl PipelineSettings {
    /// Get the inter-listing delay as a Duration
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".immolens").join("config.toml"))
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file at the default location yields defaults; a missing
    /// file that was named explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        let section = |name: &str, result: std::result::Result<(), String>| {
            result.map_err(|e| CliError::Config(format!("[{}] {}", name, e)))
        };

        section("bounds", self.bounds.validate())?;
        section("extractor", self.extractor.validate())?;
        section("reconciler", self.reconciler.validate())?;
        section("gate", self.gate.validate())?;

        if self.llm.enabled && self.llm.model.trim().is_empty() {
            return Err(CliError::Config("[llm] model must not be empty".into()));
        }
        if self.pipeline.top_n == 0 {
            return Err(CliError::Config("[pipeline] top_n must be greater than 0".into()));
        }
        Ok(())
    }
}

fn bounds_over_defaults<'de, D>(deserializer: D) -> std::result::Result<PlausibilityBounds, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = PlausibilityBounds::deserialize(deserializer)?;
    let mut bounds = PlausibilityBounds::default();
    bounds.fields.extend(overrides.fields);
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use immolens_domain::{Bound, FieldName};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.color);
        assert!(config.llm.enabled);
        assert_eq!(config.llm.trigger, TriggerMode::Conservative);
        assert_eq!(config.pipeline.top_n, 20);
        assert_eq!(config.pipeline.delay(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [llm]
            trigger = "always"

            [pipeline]
            delay_ms = 0

            [bounds.fields.monthly_recurring_cost]
            min = 20.0
            max = 1500.0
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.trigger, TriggerMode::Always);
        assert_eq!(config.llm.model, "qwen3:8b");
        assert_eq!(config.pipeline.delay_ms, 0);
        assert_eq!(config.pipeline.top_n, 20);
        assert_eq!(
            config.bounds.get(FieldName::MonthlyRecurringCost),
            Some(&Bound::range(20.0, 1500.0))
        );
        assert_eq!(
            config.bounds.get(FieldName::Price),
            PlausibilityBounds::default().get(FieldName::Price)
        );
        assert_eq!(config.gate, GateConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.llm.enabled = false;
        config.gate = GateConfig::strict();
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CliError::Io(_))));
    }

    #[test]
    fn test_invalid_section_is_named() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[gate]\nrequired_fields = []\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("[gate]"));
    }

    #[test]
    fn test_unknown_trigger_is_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[llm]\ntrigger = \"sometimes\"\n");
        assert!(result.is_err());
    }
}
