//! Listing pipeline.
//!
//! Listings are processed one at a time. For each one the three page
//! extractors run side by side on the blocking pool and are joined before
//! the baseline merge. The model is consulted only when the baseline record
//! calls for it, under the extractor's own hard deadline, and any failure
//! there leaves the baseline record as it was. Every record then passes the
//! gate and is kept, flagged or not.

use crate::config::{Config, TriggerMode};
use crate::error::{CliError, Result};
use crate::tracker::TopNTracker;
use immolens_domain::{ExtractionResult, FieldExtractor, FieldName, FieldSet, LlmProvider};
use immolens_extractor::{
    DomHeuristicExtractor, FieldValidator, LlmExtractor, PatternExtractor, StructuredDataExtractor,
};
use immolens_gatekeeper::{ReviewStatus, ValidatedRecord, ValidationGate};
use immolens_reconciler::{MergeInputs, ReconciliationEngine, Suspicion};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fields whose absence always justifies a model call
pub const CRITICAL_FIELDS: [FieldName; 2] = [FieldName::Price, FieldName::SizeSqm];

/// Subdirectory for records that passed the gate
pub const USABLE_DIR: &str = "usable";

/// Subdirectory for records kept for review
pub const FLAGGED_DIR: &str = "flagged";

/// Reasons to ask the model about a listing; empty means don't
pub fn llm_trigger(
    mode: TriggerMode,
    baseline: &FieldSet,
    suspicions: &[(FieldName, Suspicion)],
    prompt_fields: &[FieldName],
) -> Vec<String> {
    match mode {
        TriggerMode::Off => return Vec::new(),
        TriggerMode::Always => return vec!["trigger mode always".to_string()],
        TriggerMode::Conservative | TriggerMode::Aggressive => {}
    }

    let mut reasons = Vec::new();

    let critical = baseline.missing(&CRITICAL_FIELDS);
    if !critical.is_empty() {
        reasons.push(format!("missing critical fields: {}", join(&critical)));
    }

    if !baseline.contains(FieldName::MonthlyRecurringCost) {
        reasons.push(format!("missing {}", FieldName::MonthlyRecurringCost));
    }

    for (field, suspicion) in suspicions {
        reasons.push(format!("suspicious {}: {}", field, suspicion));
    }

    if mode == TriggerMode::Aggressive {
        let missing = baseline.missing(prompt_fields);
        if !missing.is_empty() {
            reasons.push(format!("{} prompt fields missing", missing.len()));
        }
    }

    reasons
}

/// Share of the known fields a record has values for, in `0.0..=1.0`
pub fn completeness(fields: &FieldSet) -> f64 {
    fields.len() as f64 / FieldName::COUNT as f64
}

/// Listing identifier for a page file: its file stem
pub fn listing_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Every `*.html` / `*.htm` file in `dir`, sorted by name
pub fn listing_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CliError::InvalidInput(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_page = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
        if path.is_file() && is_page {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Write a validated record as pretty JSON under `usable/` or `flagged/`
pub fn persist(record: &ValidatedRecord, output_dir: &Path) -> Result<PathBuf> {
    let subdir = if record.is_usable() { USABLE_DIR } else { FLAGGED_DIR };
    let dir = output_dir.join(subdir);
    fs::create_dir_all(&dir)?;

    let path = dir.join(format!("{}.json", record.record.listing_id()));
    fs::write(&path, serde_json::to_string_pretty(record)?)?;
    debug!(path = %path.display(), "Persisted record");
    Ok(path)
}

/// One line of a batch report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingSummary {
    /// Listing identifier
    pub listing_id: String,

    /// Passed the gate
    pub usable: bool,

    /// Number of fields with a value
    pub field_count: usize,

    /// Gate reason for flagged records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Required fields with no value
    pub missing: Vec<FieldName>,

    /// Where the record was written, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ListingSummary {
    /// Summarize a validated record
    pub fn of(record: &ValidatedRecord) -> Self {
        let (reason, missing) = match &record.review {
            ReviewStatus::Usable => (None, Vec::new()),
            ReviewStatus::FlaggedForReview { reason, missing, .. } => {
                (Some(reason.clone()), missing.clone())
            }
        };
        Self {
            listing_id: record.record.listing_id().to_string(),
            usable: record.is_usable(),
            field_count: record.record.fields().len(),
            reason,
            missing,
            path: None,
        }
    }
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// One entry per processed listing, in processing order
    pub listings: Vec<ListingSummary>,

    /// Files that could not be read
    pub skipped: Vec<PathBuf>,

    /// Most complete usable records as (completeness, listing id), best first
    pub top: Vec<(f64, String)>,
}

impl BatchReport {
    /// Number of records that passed the gate
    pub fn usable_count(&self) -> usize {
        self.listings.iter().filter(|l| l.usable).count()
    }

    /// Number of records kept for review
    pub fn flagged_count(&self) -> usize {
        self.listings.len() - self.usable_count()
    }
}

/// Extract, reconcile, and validate listing pages
pub struct Pipeline<L: LlmProvider> {
    structured: Arc<StructuredDataExtractor>,
    pattern: Arc<PatternExtractor>,
    dom: Arc<DomHeuristicExtractor>,
    llm: Option<LlmExtractor<L>>,
    trigger: TriggerMode,
    engine: ReconciliationEngine,
    gate: ValidationGate,
    delay: Duration,
}

impl<L: LlmProvider> Pipeline<L> {
    /// Build a pipeline without a model
    pub fn new(config: &Config) -> Result<Self> {
        let validator = FieldValidator::new(config.bounds.clone());
        Ok(Self {
            structured: Arc::new(StructuredDataExtractor::new(validator.clone())),
            pattern: Arc::new(PatternExtractor::new(validator.clone())),
            dom: Arc::new(DomHeuristicExtractor::new(validator)),
            llm: None,
            trigger: config.llm.trigger,
            engine: ReconciliationEngine::new(config.reconciler.clone(), config.bounds.clone())?,
            gate: ValidationGate::new(config.gate.clone(), config.bounds.clone())?,
            delay: config.pipeline.delay(),
        })
    }

    /// Attach a model extractor
    pub fn with_llm(mut self, llm: LlmExtractor<L>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// The model extractor, if one is attached
    pub fn llm(&self) -> Option<&LlmExtractor<L>> {
        self.llm.as_ref()
    }

    /// Process one listing page
    ///
    /// Never fails: extractor problems only cost fields, and an incomplete
    /// record comes back flagged.
    pub async fn process(&self, listing_id: &str, html: &str) -> ValidatedRecord {
        let html: Arc<str> = Arc::from(html);
        let (structured, pattern, dom) = tokio::join!(
            run_blocking(self.structured.clone(), html.clone()),
            run_blocking(self.pattern.clone(), html.clone()),
            run_blocking(self.dom.clone(), html.clone()),
        );

        let inputs = MergeInputs {
            structured: &structured,
            pattern: &pattern,
            dom: &dom,
            llm: None,
        };
        let (baseline, baseline_log) = self.engine.merge(listing_id, inputs);

        let llm_result = self.consult_model(listing_id, &html, baseline.fields()).await;
        let (record, log) = match &llm_result {
            Some(result) => self.engine.merge(
                listing_id,
                MergeInputs {
                    llm: Some(result),
                    ..inputs
                },
            ),
            None => (baseline, baseline_log),
        };

        info!(
            listing = listing_id,
            fields = record.fields().len(),
            decisions = log.len(),
            "Reconciled listing"
        );
        self.gate.seal(record, log)
    }

    async fn consult_model(&self, listing_id: &str, html: &str, baseline: &FieldSet) -> Option<ExtractionResult> {
        let llm = self.llm.as_ref()?;
        if llm.is_disabled() {
            debug!(listing = listing_id, "Model disabled for this run");
            return None;
        }

        let suspicions = self.engine.suspicions(baseline);
        let reasons = llm_trigger(self.trigger, baseline, &suspicions, llm.fields());
        if reasons.is_empty() {
            debug!(listing = listing_id, "Baseline record complete; model not needed");
            return None;
        }
        info!(listing = listing_id, reasons = %reasons.join("; "), "Asking the model");

        match llm.extract(html, baseline).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(listing = listing_id, error = %e, "Model extraction failed; keeping baseline record");
                None
            }
        }
    }

    /// Process page files in order, persisting every record
    ///
    /// Sleeps the configured delay between listings. Unreadable files are
    /// skipped and reported; only failures to write output abort the run.
    pub async fn run_batch(&self, files: &[PathBuf], output_dir: &Path, top_n: usize) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let mut tracker = TopNTracker::new(top_n);

        for (i, path) in files.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let html = match fs::read_to_string(path) {
                Ok(html) => html,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable listing");
                    report.skipped.push(path.clone());
                    continue;
                }
            };

            let id = listing_id(path);
            let validated = self.process(&id, &html).await;
            let mut summary = ListingSummary::of(&validated);
            summary.path = Some(persist(&validated, output_dir)?);

            if validated.is_usable() {
                tracker.push(completeness(validated.record.fields()), id);
            }
            report.listings.push(summary);
        }

        report.top = tracker.into_sorted();
        info!(
            processed = report.listings.len(),
            usable = report.usable_count(),
            flagged = report.flagged_count(),
            skipped = report.skipped.len(),
            "Batch finished"
        );
        Ok(report)
    }
}

async fn run_blocking<E>(extractor: Arc<E>, html: Arc<str>) -> ExtractionResult
where
    E: FieldExtractor + 'static,
{
    let source = extractor.source();
    match tokio::task::spawn_blocking(move || extractor.extract(&html)).await {
        Ok(result) => result,
        Err(e) => {
            warn!(%source, error = %e, "Extractor task failed");
            ExtractionResult::empty(source)
        }
    }
}

fn join(fields: &[FieldName]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
