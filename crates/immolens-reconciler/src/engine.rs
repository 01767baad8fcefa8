//! Field-by-field merge of extractor results

use crate::config::ReconcilerConfig;
use crate::error::ReconcilerError;
use crate::suspicion::Suspicion;
use immolens_domain::{
    Decision, DecisionKind, DecisionLog, ExtractionResult, FieldName, FieldSet, FieldValue,
    PlausibilityBounds, Provenance, ReconciledRecord, Source,
};
use std::collections::BTreeMap;
use tracing::debug;

/// The inputs of one merge, one slot per extractor
#[derive(Debug, Clone, Copy)]
pub struct MergeInputs<'a> {
    /// JSON-LD metadata
    pub structured: &'a ExtractionResult,
    /// Regex patterns over visible text
    pub pattern: &'a ExtractionResult,
    /// Label/value table scanning
    pub dom: &'a ExtractionResult,
    /// Model output, when the model ran and answered
    pub llm: Option<&'a ExtractionResult>,
}

impl<'a> MergeInputs<'a> {
    /// Baseline sources in precedence order for `field`
    fn baseline(&self, field: FieldName) -> [&'a ExtractionResult; 3] {
        if field.is_recurring_cost() {
            [self.pattern, self.dom, self.structured]
        } else {
            [self.structured, self.pattern, self.dom]
        }
    }
}

/// Merges extractor results into one record and logs every decision
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    config: ReconcilerConfig,
    bounds: PlausibilityBounds,
}

/// Record under construction plus its audit trail
struct Merge {
    fields: FieldSet,
    provenance: BTreeMap<FieldName, Provenance>,
    log: DecisionLog,
}

impl Merge {
    fn decide(
        &mut self,
        field: FieldName,
        source: Source,
        kind: DecisionKind,
        after: Option<FieldValue>,
        predicate: impl Into<String>,
    ) {
        let decision = Decision {
            field,
            source,
            kind,
            before: self.fields.get(field).cloned(),
            after,
            predicate: predicate.into(),
        };
        debug!(decision = %decision, "Reconciliation decision");
        self.log.record(decision);
    }

    fn keep(&mut self, field: FieldName, source: Source, value: FieldValue, note: &str) {
        self.fields.set(field, value);
        self.provenance.insert(
            field,
            Provenance {
                source,
                note: note.to_string(),
            },
        );
    }
}

impl ReconciliationEngine {
    /// Create an engine; fails if `config` does not validate
    pub fn new(config: ReconcilerConfig, bounds: PlausibilityBounds) -> Result<Self, ReconcilerError> {
        config.validate().map_err(ReconcilerError::Config)?;
        bounds.validate().map_err(ReconcilerError::Config)?;
        Ok(Self { config, bounds })
    }

    /// Engine with default thresholds and bounds
    pub fn default_config() -> Self {
        Self {
            config: ReconcilerConfig::default(),
            bounds: PlausibilityBounds::default(),
        }
    }

    /// The configuration in use
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Suspicious values in a (partial) record, in canonical field order
    pub fn suspicions(&self, fields: &FieldSet) -> Vec<(FieldName, Suspicion)> {
        self.config.suspicion.scan(fields)
    }

    /// Merge extractor results for one listing
    ///
    /// The merge is a pure function of its inputs: fields are visited in
    /// canonical order and sources in fixed precedence, so the same inputs
    /// always give the same record and the same log.
    pub fn merge(&self, listing_id: &str, inputs: MergeInputs<'_>) -> (ReconciledRecord, DecisionLog) {
        let mut merge = Merge {
            fields: FieldSet::new(),
            provenance: BTreeMap::new(),
            log: DecisionLog::new(),
        };

        for field in FieldName::ALL {
            self.merge_baseline(&mut merge, field, &inputs);
        }

        if let Some(llm) = inputs.llm {
            for field in FieldName::ALL {
                self.merge_llm(&mut merge, field, llm);
            }
        }

        debug!(
            listing = listing_id,
            fields = merge.fields.len(),
            decisions = merge.log.len(),
            "Merged listing"
        );

        let record = ReconciledRecord::new(listing_id, merge.fields, merge.provenance);
        (record, merge.log)
    }

    /// Highest-precedence baseline candidate wins; the rest are superseded
    fn merge_baseline(&self, merge: &mut Merge, field: FieldName, inputs: &MergeInputs<'_>) {
        for result in inputs.baseline(field) {
            self.log_rejections(merge, field, result);

            let Some(candidate) = result.get(field) else {
                continue;
            };
            if !self.admitted(merge, field, result.source(), candidate) {
                continue;
            }

            match merge.fields.get(field) {
                None => {
                    merge.decide(field, result.source(), DecisionKind::Accepted, Some(candidate.clone()), "precedence");
                    merge.keep(field, result.source(), candidate.clone(), "baseline precedence");
                }
                Some(current) => {
                    let current = current.clone();
                    let predicate = if &current == candidate {
                        "lower_precedence, agrees".to_string()
                    } else {
                        format!("lower_precedence, candidate {}", candidate)
                    };
                    merge.decide(field, result.source(), DecisionKind::Superseded, Some(current), predicate);
                }
            }
        }
    }

    /// The model fills gaps, and replaces a present value only when that
    /// value is suspicious and the candidate is not
    fn merge_llm(&self, merge: &mut Merge, field: FieldName, llm: &ExtractionResult) {
        self.log_rejections(merge, field, llm);

        let Some(candidate) = llm.get(field) else {
            return;
        };
        if !self.admitted(merge, field, llm.source(), candidate) {
            return;
        }

        let Some(current) = merge.fields.get(field).cloned() else {
            merge.decide(field, llm.source(), DecisionKind::Accepted, Some(candidate.clone()), "filled_missing");
            merge.keep(field, llm.source(), candidate.clone(), "filled by model");
            return;
        };

        if &current == candidate {
            merge.decide(field, llm.source(), DecisionKind::Retained, Some(current), "confirmed");
            return;
        }

        let rules = &self.config.suspicion;
        let Some(suspicion) = rules.check(field, &current, &merge.fields) else {
            let predicate = format!("existing_not_suspicious, candidate {}", candidate);
            merge.decide(field, llm.source(), DecisionKind::Retained, Some(current), predicate);
            return;
        };

        let candidate_suspicious = rules.check(field, candidate, &merge.fields).is_some();
        let clears_margin = match (current.as_f64(), candidate.as_f64()) {
            (Some(cur), Some(cand)) => rules.cost_replacement_ok(field, cur, cand),
            _ => true,
        };

        if !candidate_suspicious && clears_margin {
            merge.decide(field, llm.source(), DecisionKind::Overwritten, Some(candidate.clone()), suspicion.as_str());
            merge.keep(field, llm.source(), candidate.clone(), suspicion.as_str());
        } else {
            let predicate = format!("{}, candidate {} not more plausible", suspicion, candidate);
            merge.decide(field, llm.source(), DecisionKind::Retained, Some(current), predicate);
        }
    }

    /// Bounds are re-checked here so no record can hold an out-of-range value,
    /// whatever produced the result
    fn admitted(&self, merge: &mut Merge, field: FieldName, source: Source, candidate: &FieldValue) -> bool {
        if self.bounds.admits(field, candidate) {
            return true;
        }
        let after = merge.fields.get(field).cloned();
        merge.decide(field, source, DecisionKind::Rejected, after, format!("out_of_bounds {}", candidate));
        false
    }

    fn log_rejections(&self, merge: &mut Merge, field: FieldName, result: &ExtractionResult) {
        for rejection in result.rejections().iter().filter(|r| r.field == field) {
            let after = merge.fields.get(field).cloned();
            let predicate = format!("{} (raw {:?})", rejection.reason, rejection.raw);
            merge.decide(field, rejection.source, DecisionKind::Rejected, after, predicate);
        }
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::default_config()
    }
}
