//! Decision log - the audit trail of one reconciliation pass

use crate::field::FieldName;
use crate::source::Source;
use crate::value::FieldValue;
use serde::Serialize;
use std::fmt;

/// What happened to a candidate value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Candidate filled an empty field
    Accepted,
    /// Candidate lost to a higher-precedence value already present
    Superseded,
    /// Candidate replaced a suspicious existing value
    Overwritten,
    /// Candidate differed from a present value that was kept
    Retained,
    /// Candidate never reached the merge (failed coercion or bounds)
    Rejected,
}

impl DecisionKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Accepted => "accepted",
            DecisionKind::Superseded => "superseded",
            DecisionKind::Overwritten => "overwritten",
            DecisionKind::Retained => "retained",
            DecisionKind::Rejected => "rejected",
        }
    }
}

/// One merge decision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// Field decided on
    pub field: FieldName,
    /// Source of the candidate
    pub source: Source,
    /// Outcome
    pub kind: DecisionKind,
    /// Field value before the decision
    pub before: Option<FieldValue>,
    /// Field value after the decision
    pub after: Option<FieldValue>,
    /// Rule that triggered the outcome
    pub predicate: String,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<FieldValue>| match v {
            Some(v) => v.to_string(),
            None => "-".to_string(),
        };
        write!(
            f,
            "{} [{}] {}: {} -> {} ({})",
            self.field,
            self.source,
            self.kind.as_str(),
            show(&self.before),
            show(&self.after),
            self.predicate
        )
    }
}

/// Ordered list of decisions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DecisionLog {
    entries: Vec<Decision>,
}

impl DecisionLog {
    /// An empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decision
    pub fn record(&mut self, decision: Decision) {
        self.entries.push(decision);
    }

    /// All decisions in order
    pub fn entries(&self) -> &[Decision] {
        &self.entries
    }

    /// Decisions about one field
    pub fn for_field(&self, field: FieldName) -> impl Iterator<Item = &Decision> + '_ {
        self.entries.iter().filter(move |d| d.field == field)
    }

    /// Number of decisions of one kind
    pub fn count(&self, kind: DecisionKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Number of decisions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
