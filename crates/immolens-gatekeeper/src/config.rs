//! Gate configuration

use immolens_domain::FieldName;
use serde::{Deserialize, Serialize};

/// Fields a record needs before downstream scoring may use it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Must be present and within bounds
    pub required_fields: Vec<FieldName>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            required_fields: vec![
                FieldName::Price,
                FieldName::SizeSqm,
                FieldName::MonthlyRecurringCost,
            ],
        }
    }
}

impl GateConfig {
    /// Create a permissive configuration (price only)
    pub fn permissive() -> Self {
        Self {
            required_fields: vec![FieldName::Price],
        }
    }

    /// Create a strict configuration (everything scoring looks at)
    pub fn strict() -> Self {
        Self {
            required_fields: vec![
                FieldName::Price,
                FieldName::SizeSqm,
                FieldName::Rooms,
                FieldName::MonthlyRecurringCost,
                FieldName::PostalCode,
            ],
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.required_fields.is_empty() {
            return Err("required_fields must name at least one field".to_string());
        }
        for (i, field) in self.required_fields.iter().enumerate() {
            if self.required_fields[..i].contains(field) {
                return Err(format!("required field {} listed twice", field));
            }
        }
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GateConfig::default();
        assert_eq!(
            config.required_fields,
            vec![FieldName::Price, FieldName::SizeSqm, FieldName::MonthlyRecurringCost]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert_eq!(GateConfig::permissive().required_fields, vec![FieldName::Price]);
        assert!(GateConfig::strict().required_fields.contains(&FieldName::PostalCode));
        assert!(GateConfig::strict().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        assert!(GateConfig { required_fields: vec![] }.validate().is_err());
        assert!(GateConfig {
            required_fields: vec![FieldName::Price, FieldName::Price]
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = GateConfig::from_toml(r#"required_fields = ["price", "rooms"]"#).unwrap();
        assert_eq!(config.required_fields, vec![FieldName::Price, FieldName::Rooms]);
        assert!(GateConfig::from_toml(r#"required_fields = ["pool"]"#).is_err());
    }
}
