//! Analysis pipeline shared by the CLI and embedding applications.
//! All I/O apart from reading files on request stays with the caller.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::path::Path;

use crate::ai::{AIError, GroqClassifier, PathClassifier, RuleBasedClassifier};
use crate::config::{ClassifierSettings, ProviderKind};
use crate::parser::{ParseOutcome, ReportParser, TimingPath};
use crate::report::{
    AnalysisReport, ClassifierOutcome, PdfRenderer, RenderError, ReportAssembler,
};
use crate::services::{ActionLog, JsonKeyFile};

#[derive(Debug, thiserror::Error)]
pub enum StaDebugError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No valid timing paths found in report")]
    NoPaths,
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Classifier error: {0}")]
    Classifier(#[from] AIError),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Options for one analysis run.
#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    /// Only classify `VIOLATED` paths. The report still carries every
    /// parsed path in `original_paths`.
    pub violations_only: bool,
    /// Maximum classifier calls in flight.
    pub concurrency: usize,
    /// Name recorded in the action log.
    pub actor: String,
    /// Also mark paths with negative slack but no textual marker as violated.
    pub treat_negative_slack_as_violation: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            violations_only: true,
            concurrency: 4,
            actor: "cli".to_string(),
            treat_negative_slack_as_violation: false,
        }
    }
}

impl AnalysisOptions {
    pub fn parser(&self) -> ReportParser {
        ReportParser::new().negative_slack_violates(self.treat_negative_slack_as_violation)
    }
}

/// Pipeline entry points.
pub struct StaDebugCore;

impl StaDebugCore {
    pub fn parse_report(text: &str, options: &AnalysisOptions) -> ParseOutcome {
        options.parser().parse_with_diagnostics(text)
    }

    pub fn parse_file(path: &Path, options: &AnalysisOptions) -> Result<ParseOutcome, StaDebugError> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(Self::parse_report(&text, options))
    }

    /// Classify every path, at most `concurrency` at a time. Outcomes come
    /// back in completion order, tagged with the index of their path.
    pub async fn classify_all(
        paths: &[TimingPath],
        classifier: &dyn PathClassifier,
        concurrency: usize,
    ) -> Vec<ClassifierOutcome> {
        tracing::info!(
            "Classifying {} paths with {} (concurrency {})",
            paths.len(),
            classifier.name(),
            concurrency.max(1)
        );
        stream::iter(paths.iter().enumerate())
            .map(|(index, path)| async move { (index, classifier.classify(path).await) })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }

    /// Merge classifier outcomes into a report stamped with `timestamp`.
    pub fn assemble_report(
        parsed: Vec<TimingPath>,
        analyzed: &[TimingPath],
        outcomes: Vec<ClassifierOutcome>,
        timestamp: DateTime<Utc>,
    ) -> AnalysisReport {
        let analyses = ReportAssembler::new().assemble(analyzed, outcomes);
        AnalysisReport::new(analyses, parsed, timestamp)
    }

    /// Parse, classify and assemble one report.
    ///
    /// Fails only when the text contains no usable path; classification
    /// failures are folded into degraded records.
    pub async fn analyze_report(
        text: &str,
        classifier: &dyn PathClassifier,
        options: &AnalysisOptions,
        log: &dyn ActionLog,
    ) -> Result<AnalysisReport, StaDebugError> {
        log.record(
            &options.actor,
            "Run STA Analysis",
            Some(json!({
                "bytes": text.len(),
                "classifier": classifier.name(),
                "violations_only": options.violations_only,
            })),
        );

        let outcome = Self::parse_report(text, options);
        if outcome.skipped_blocks() > 0 {
            tracing::warn!("Skipped {} malformed path blocks", outcome.skipped_blocks());
        }
        if outcome.paths.is_empty() {
            log.record(
                &options.actor,
                "STA Analysis Failed",
                Some(json!({ "error": StaDebugError::NoPaths.to_string() })),
            );
            return Err(StaDebugError::NoPaths);
        }

        let analyzed: Vec<TimingPath> = if options.violations_only {
            outcome.paths.iter().filter(|p| p.is_violated()).cloned().collect()
        } else {
            outcome.paths.clone()
        };

        let outcomes = Self::classify_all(&analyzed, classifier, options.concurrency).await;
        let report = Self::assemble_report(outcome.paths, &analyzed, outcomes, Utc::now());

        log.record(
            &options.actor,
            "STA Analysis Completed",
            Some(json!({
                "total_paths": report.summary.parsed_paths,
                "violated_paths": report.original_paths.iter().filter(|p| p.is_violated()).count(),
                "analyzed_paths": report.summary.analyzed_paths,
            })),
        );
        tracing::info!(
            "Analysis complete: {} parsed, {} analyzed",
            report.summary.parsed_paths,
            report.summary.analyzed_paths
        );
        Ok(report)
    }

    pub fn export_json(
        report: &AnalysisReport,
        actor: &str,
        log: &dyn ActionLog,
    ) -> Result<Vec<u8>, StaDebugError> {
        let bytes = report.to_json()?;
        log.record(
            actor,
            "Export JSON Report",
            Some(json!({ "analyses": report.analyses.len() })),
        );
        Ok(bytes)
    }

    /// Render the violation PDF. The report timestamp is used as the
    /// generation time so a saved report always re-renders identically.
    pub fn export_pdf(
        report: &AnalysisReport,
        actor: &str,
        log: &dyn ActionLog,
    ) -> Result<Vec<u8>, StaDebugError> {
        let bytes = PdfRenderer::new().render(&report.analyses, report.timestamp)?;
        log.record(
            actor,
            "Export PDF Report",
            Some(json!({ "violations": report.violations().count() })),
        );
        Ok(bytes)
    }

    /// Pick the classifier for `settings`. `offline` forces the rule-based
    /// one. Without a `key_id` the first key in the key file is used.
    pub fn build_classifier(
        settings: &ClassifierSettings,
        offline: bool,
    ) -> Result<Box<dyn PathClassifier>, StaDebugError> {
        if offline || settings.provider == ProviderKind::Offline {
            tracing::info!("Using offline rule-based classifier");
            return Ok(Box::new(RuleBasedClassifier::new()));
        }

        let key_file = settings.key_file.as_deref().ok_or_else(|| {
            StaDebugError::Config("no API key file configured (use --key-file or --offline)".to_string())
        })?;
        let store = JsonKeyFile::load(key_file)?;
        let key_id = match &settings.key_id {
            Some(id) => id.clone(),
            None => store
                .entries()
                .first()
                .map(|e| e.id.clone())
                .ok_or_else(|| StaDebugError::Config("API key file has no entries".to_string()))?,
        };

        let classifier = GroqClassifier::from_store(&store, &key_id, settings)?;
        tracing::info!("Using Groq classifier (model {})", classifier.model());
        Ok(Box::new(classifier))
    }
}
