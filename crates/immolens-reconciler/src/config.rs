//! Reconciler configuration

use serde::{Deserialize, Serialize};

/// Thresholds that mark a present value as a likely extraction failure
///
/// These are softer than the plausibility bounds: a value that trips one is
/// still kept unless the model offers a clearly better candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspicionRules {
    /// Monthly recurring cost below this is suspicious (EUR)
    pub recurring_cost_floor: f64,

    /// Monthly repair fund contribution below this is suspicious (EUR)
    pub repair_fund_floor: f64,

    /// A replacement cost must exceed the suspicious one by this factor
    pub cost_override_margin: f64,

    /// Recurring cost per m² below this is suspicious (EUR/m²)
    pub cost_per_sqm_floor: f64,

    /// Earliest plausible construction year
    pub year_min: i64,

    /// Latest plausible construction year
    pub year_max: i64,

    /// Highest floor number taken at face value
    pub max_plausible_floor: i64,

    /// Zero bedrooms is suspicious once the room count reaches this
    pub bedroom_rooms_threshold: f64,

    /// Zero bathrooms is suspicious once the size exceeds this (m²)
    pub bathroom_size_threshold: f64,
}

impl Default for SuspicionRules {
    fn default() -> Self {
        Self {
            recurring_cost_floor: 30.0,
            repair_fund_floor: 10.0,
            cost_override_margin: 2.0,
            cost_per_sqm_floor: 0.5,
            year_min: 1800,
            year_max: 2030,
            max_plausible_floor: 20,
            bedroom_rooms_threshold: 1.5,
            bathroom_size_threshold: 25.0,
        }
    }
}

impl SuspicionRules {
    /// Validate the thresholds
    pub fn validate(&self) -> Result<(), String> {
        if self.recurring_cost_floor < 0.0 || self.repair_fund_floor < 0.0 {
            return Err("cost floors must not be negative".to_string());
        }
        if self.cost_override_margin < 1.0 {
            return Err("cost_override_margin must be at least 1.0".to_string());
        }
        if self.cost_per_sqm_floor < 0.0 {
            return Err("cost_per_sqm_floor must not be negative".to_string());
        }
        if self.year_min > self.year_max {
            return Err(format!(
                "year_min ({}) must not exceed year_max ({})",
                self.year_min, self.year_max
            ));
        }
        if self.bedroom_rooms_threshold <= 0.0 || self.bathroom_size_threshold <= 0.0 {
            return Err("bedroom and bathroom thresholds must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Configuration for the reconciliation engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// When a present value may be replaced by the model's candidate
    pub suspicion: SuspicionRules,
}

impl ReconcilerConfig {
    /// Aggressive preset: more values count as suspicious, smaller margin
    pub fn aggressive() -> Self {
        Self {
            suspicion: SuspicionRules {
                recurring_cost_floor: 50.0,
                repair_fund_floor: 15.0,
                cost_override_margin: 1.5,
                cost_per_sqm_floor: 1.0,
                year_min: 1850,
                max_plausible_floor: 15,
                ..SuspicionRules::default()
            },
        }
    }

    /// Lenient preset: only blatant failures are replaced
    pub fn lenient() -> Self {
        Self {
            suspicion: SuspicionRules {
                recurring_cost_floor: 20.0,
                repair_fund_floor: 5.0,
                cost_override_margin: 3.0,
                cost_per_sqm_floor: 0.25,
                year_min: 1700,
                year_max: 2035,
                max_plausible_floor: 25,
                ..SuspicionRules::default()
            },
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.suspicion.validate()
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
