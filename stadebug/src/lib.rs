//! stadebug - static timing analysis report triage
//!
//! Parses STA timing reports (OpenSTA / PrimeTime style `report_checks`
//! output) into structured timing paths, classifies the violations through
//! a pluggable classifier, and renders the result as JSON and PDF.
//!
//! # Quick Start
//!
//! ```no_run
//! use stadebug::{AnalysisOptions, MemoryActionLog, RuleBasedClassifier, StaDebugCore};
//!
//! # async fn run() -> Result<(), stadebug::StaDebugError> {
//! let text = std::fs::read_to_string("timing.rpt")?;
//! let report = StaDebugCore::analyze_report(
//!     &text,
//!     &RuleBasedClassifier::new(),
//!     &AnalysisOptions::default(),
//!     &MemoryActionLog::new(),
//! )
//! .await?;
//!
//! for record in report.violations() {
//!     println!("{} -> {}: {}", record.startpoint, record.endpoint, record.severity);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Report parsing**: rule-table driven, tolerant of malformed blocks
//! - **Classification**: Groq (OpenAI-compatible) or offline heuristics
//! - **Export**: pretty JSON and a paginated PDF violation report

pub mod ai;
pub mod config;
pub mod core;
pub mod parser;
pub mod report;
pub mod services;

// Re-export main types
pub use ai::{AIError, GroqClassifier, PathClassifier, RuleBasedClassifier};
pub use config::{ClassifierSettings, ProviderKind};
pub use crate::core::{AnalysisOptions, StaDebugCore, StaDebugError};
pub use parser::{LineRule, ParseOutcome, PathStatus, ReportParser, TimingPath};
pub use report::{AnalysisRecord, AnalysisReport, PdfRenderer, ReportAssembler, Severity};
pub use services::{ActionLog, JsonKeyFile, MemoryActionLog, SecretStore, TracingActionLog};

/// Parse report text with the default rules (convenience wrapper).
pub fn parse_report(text: &str) -> Vec<TimingPath> {
    ReportParser::new().parse(text)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AnalysisOptions, AnalysisRecord, AnalysisReport, PathClassifier, PathStatus,
        ReportParser, StaDebugCore, StaDebugError, TimingPath,
    };
}
