use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::parser::schema::TimingPath;
use crate::report::analysis::AnalysisRecord;
use crate::report::RenderError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Paths found in the report.
    pub parsed_paths: usize,
    /// Paths that went through classification.
    pub analyzed_paths: usize,
    pub violated_paths: usize,
    pub met_paths: usize,
    /// Analyzed paths per severity label.
    pub by_severity: BTreeMap<String, usize>,
}

impl ReportSummary {
    pub fn compute(analyses: &[AnalysisRecord], original_paths: &[TimingPath]) -> Self {
        let violated_paths = analyses.iter().filter(|a| a.is_violated()).count();
        let mut by_severity = BTreeMap::new();
        for a in analyses {
            *by_severity.entry(a.severity.as_str().to_string()).or_insert(0) += 1;
        }
        Self {
            parsed_paths: original_paths.len(),
            analyzed_paths: analyses.len(),
            violated_paths,
            met_paths: analyses.len() - violated_paths,
            by_severity,
        }
    }
}

/// The exported analysis: records plus the parsed paths they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub summary: ReportSummary,
    pub analyses: Vec<AnalysisRecord>,
    pub original_paths: Vec<TimingPath>,
}

impl AnalysisReport {
    pub fn new(
        analyses: Vec<AnalysisRecord>,
        original_paths: Vec<TimingPath>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let summary = ReportSummary::compute(&analyses, &original_paths);
        Self {
            timestamp,
            summary,
            analyses,
            original_paths,
        }
    }

    pub fn violations(&self) -> impl Iterator<Item = &AnalysisRecord> {
        self.analyses.iter().filter(|a| a.is_violated())
    }

    /// Pretty-printed JSON. A pure function of the report contents.
    pub fn to_json(&self) -> Result<Vec<u8>, RenderError> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Load a previously exported report. The summary is recomputed from
    /// the records, so hand-edited or older files stay consistent.
    pub fn from_json(bytes: &[u8]) -> Result<Self, RenderError> {
        let mut report: AnalysisReport = serde_json::from_slice(bytes)?;
        report.summary = ReportSummary::compute(&report.analyses, &report.original_paths);
        Ok(report)
    }
}
