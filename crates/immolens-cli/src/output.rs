//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::{CliError, Result};
use crate::pipeline::BatchReport;
use colored::*;
use immolens_domain::{DecisionKind, PlausibilityBounds};
use immolens_gatekeeper::{ReviewStatus, ValidatedRecord};
use immolens_llm::ModelStatus;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
    Table,
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// The format in use.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format validated records.
    pub fn format_records(&self, records: &[ValidatedRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
            OutputFormat::Table => Ok(records
                .iter()
                .map(|r| self.format_record_table(r))
                .collect::<Vec<_>>()
                .join("\n\n")),
            OutputFormat::Quiet => Ok(records
                .iter()
                .map(|r| format!("{}\t{}", r.record.listing_id(), status_word(r)))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format one record as a field table followed by its status.
    fn format_record_table(&self, validated: &ValidatedRecord) -> String {
        let record = &validated.record;
        let mut out = self.colorize(record.listing_id(), "cyan");
        out.push('\n');

        if record.fields().is_empty() {
            out.push_str(&self.colorize("No fields found.", "yellow"));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value", "Source"]);
            for (field, value) in record.fields().iter() {
                let source = record.source_of(field).map(|s| s.as_str()).unwrap_or("-");
                builder.push_record([field.as_str(), &value.to_string(), source]);
            }
            out.push_str(&styled(builder.build()));
        }
        out.push('\n');

        let log = &validated.decisions;
        out.push_str(&format!(
            "Decisions: {} accepted, {} overwritten, {} rejected\n",
            log.count(DecisionKind::Accepted),
            log.count(DecisionKind::Overwritten),
            log.count(DecisionKind::Rejected),
        ));

        out.push_str(&match &validated.review {
            ReviewStatus::Usable => self.success("Usable"),
            ReviewStatus::FlaggedForReview { reason, .. } => {
                self.warning(&format!("Flagged for review: {}", reason))
            }
        });
        out
    }

    /// Format a batch report.
    pub fn format_report(&self, report: &BatchReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(report
                .listings
                .iter()
                .filter_map(|l| l.path.as_ref())
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => Ok(self.format_report_table(report)),
        }
    }

    fn format_report_table(&self, report: &BatchReport) -> String {
        if report.listings.is_empty() {
            return self.colorize("No listings processed.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Listing", "Status", "Fields", "Missing"]);
        for listing in &report.listings {
            let status = if listing.usable { "usable" } else { "flagged" };
            let missing = listing
                .missing
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            builder.push_record([
                listing.listing_id.as_str(),
                status,
                &listing.field_count.to_string(),
                &missing,
            ]);
        }

        let mut out = styled(builder.build());
        out.push('\n');
        out.push_str(&self.info(&format!(
            "{} usable, {} flagged for review",
            report.usable_count(),
            report.flagged_count()
        )));

        if !report.skipped.is_empty() {
            out.push('\n');
            out.push_str(&self.warning(&format!("{} file(s) could not be read", report.skipped.len())));
        }

        if !report.top.is_empty() {
            out.push_str("\n\nMost complete usable records:\n");
            for (rank, (score, id)) in report.top.iter().enumerate() {
                out.push_str(&format!("{:>3}. {} ({:.0}%)\n", rank + 1, id, score * 100.0));
            }
        }
        out
    }

    /// Format the bounds table.
    pub fn format_bounds(&self, bounds: &PlausibilityBounds) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(bounds)?),
            OutputFormat::Table | OutputFormat::Quiet => bounds.to_toml().map_err(CliError::Config),
        }
    }

    /// Format an endpoint probe result.
    pub fn format_model_status(&self, endpoint: &str, model: &str, status: &ModelStatus) -> String {
        if !status.reachable {
            return self.error(&format!("{} is not reachable", endpoint));
        }
        if status.model_installed {
            return self.success(&format!("{} is reachable and has {}", endpoint, model));
        }

        let mut out = self.warning(&format!("{} is reachable but {} is not installed", endpoint, model));
        if !status.installed.is_empty() {
            out.push_str(&format!("\nInstalled: {}", status.installed.join(", ")));
        }
        out
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn styled(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn status_word(record: &ValidatedRecord) -> &'static str {
    if record.is_usable() {
        "usable"
    } else {
        "flagged"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ListingSummary;
    use immolens_domain::{DecisionLog, FieldName, FieldSet, FieldValue, ReconciledRecord};
    use immolens_gatekeeper::ValidationGate;
    use std::collections::BTreeMap;

    fn flagged_record() -> ValidatedRecord {
        let mut fields = FieldSet::new();
        fields.set(FieldName::Rooms, FieldValue::number(3.0));
        let record = ReconciledRecord::new("wien-742", fields, BTreeMap::new());
        ValidationGate::default().seal(record, DecisionLog::new())
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_records(&[flagged_record()]).unwrap();
        assert!(output.contains("wien-742"));
        assert!(output.contains("rooms"));
        assert!(output.contains("Flagged for review: Missing critical fields: price"));
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_records(&[flagged_record()]).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json[0]["review"]["status"], "flagged_for_review");
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_records(&[flagged_record()]).unwrap();
        assert_eq!(output, "wien-742\tflagged");
    }

    #[test]
    fn test_report_lists_missing_fields() {
        let report = BatchReport {
            listings: vec![ListingSummary::of(&flagged_record())],
            skipped: Vec::new(),
            top: Vec::new(),
        };
        let output = Formatter::new(OutputFormat::Table, false)
            .format_report(&report)
            .unwrap();
        assert!(output.contains("flagged"));
        assert!(output.contains("price, size_sqm, monthly_recurring_cost"));
        assert!(output.contains("0 usable, 1 flagged for review"));
    }

    #[test]
    fn test_bounds_as_toml() {
        let output = Formatter::new(OutputFormat::Table, false)
            .format_bounds(&PlausibilityBounds::default())
            .unwrap();
        assert!(output.contains("monthly_recurring_cost"));
    }

    #[test]
    fn test_unreachable_endpoint() {
        let status = ModelStatus {
            reachable: false,
            model_installed: false,
            installed: Vec::new(),
        };
        let output = Formatter::new(OutputFormat::Table, false).format_model_status(
            "http://localhost:11434",
            "qwen3:8b",
            &status,
        );
        assert_eq!(output, "✗ http://localhost:11434 is not reachable");
    }
}
