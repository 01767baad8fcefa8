//! Completeness check for reconciled records

use crate::{GateConfig, GatekeeperError};
use immolens_domain::{DecisionLog, FieldName, PlausibilityBounds, ReconciledRecord};
use serde::Serialize;
use tracing::{debug, info};

/// Result of checking one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    /// Record may be used by downstream scoring
    pub usable: bool,

    /// Why not, when it may not
    pub reason: Option<String>,

    /// Required fields with no value
    pub missing: Vec<FieldName>,

    /// Required fields whose value is outside bounds
    pub invalid: Vec<FieldName>,
}

/// Review status attached to a validated record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Complete enough for scoring
    Usable,

    /// Kept for a human to look at
    FlaggedForReview {
        /// Human-readable summary
        reason: String,
        /// Required fields with no value
        missing: Vec<FieldName>,
        /// Required fields whose value is outside bounds
        invalid: Vec<FieldName>,
    },
}

/// A record with its decision log and review status
///
/// Flagged records keep every field that was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedRecord {
    /// The merged record, unchanged
    pub record: ReconciledRecord,

    /// How each field was decided
    pub decisions: DecisionLog,

    /// Outcome of the gate
    pub review: ReviewStatus,
}

impl ValidatedRecord {
    /// True when the record passed the gate
    pub fn is_usable(&self) -> bool {
        self.review == ReviewStatus::Usable
    }
}

/// Checks reconciled records against the required-field contract
pub struct ValidationGate {
    config: GateConfig,
    bounds: PlausibilityBounds,
}

impl ValidationGate {
    /// Create a new gate with the given configuration
    pub fn new(config: GateConfig, bounds: PlausibilityBounds) -> Result<Self, GatekeeperError> {
        config.validate().map_err(GatekeeperError::Config)?;
        Ok(Self { config, bounds })
    }

    /// Create a gate with default configuration
    pub fn default_config() -> Self {
        Self {
            config: GateConfig::default(),
            bounds: PlausibilityBounds::default(),
        }
    }

    /// The configuration in use
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Check a record against the required fields
    pub fn check(&self, record: &ReconciledRecord) -> GateOutcome {
        let mut missing = Vec::new();
        let mut invalid = Vec::new();

        for field in &self.config.required_fields {
            match record.get(*field) {
                None => missing.push(*field),
                Some(value) if !self.bounds.admits(*field, value) => invalid.push(*field),
                Some(_) => {}
            }
        }

        let mut parts = Vec::new();
        if !missing.is_empty() {
            parts.push(format!("Missing critical fields: {}", join(&missing)));
        }
        if !invalid.is_empty() {
            parts.push(format!("Invalid critical fields: {}", join(&invalid)));
        }

        let usable = parts.is_empty();
        debug!(listing = record.listing_id(), usable, "Gate check");
        GateOutcome {
            usable,
            reason: (!usable).then(|| parts.join("; ")),
            missing,
            invalid,
        }
    }

    /// Check a record and attach the outcome; never drops the record
    pub fn seal(&self, record: ReconciledRecord, decisions: DecisionLog) -> ValidatedRecord {
        let outcome = self.check(&record);
        let review = match outcome.reason {
            None => ReviewStatus::Usable,
            Some(reason) => {
                info!(listing = record.listing_id(), %reason, "Flagged for review");
                ReviewStatus::FlaggedForReview {
                    reason,
                    missing: outcome.missing,
                    invalid: outcome.invalid,
                }
            }
        };
        ValidatedRecord {
            record,
            decisions,
            review,
        }
    }
}

impl Default for ValidationGate {
    fn default() -> Self {
        Self::default_config()
    }
}

fn join(fields: &[FieldName]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
