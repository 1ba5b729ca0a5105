//! Analysis assembly and report rendering.

pub mod analysis;
pub mod document;
pub mod json;
pub mod pdf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("record {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("PDF error: {0}")]
    Pdf(String),
}

// Re-export for convenience
pub use analysis::{
    AnalysisRecord, Classification, ClassifierOutcome, Effort, Priority, ReportAssembler,
    Severity, Suggestion,
};
pub use document::{Block, ReportDocument};
pub use json::{AnalysisReport, ReportSummary};
pub use pdf::PdfRenderer;
