//! Analysis records and the assembler that builds them.
//!
//! Classifier output is loosely typed JSON. It is coerced into
//! [`Classification`] here, with explicit defaults for anything missing or
//! unrecognized, and then merged with the authoritative path fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::ai::AIError;
use crate::parser::schema::{PathStatus, TimingPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
    Unknown,
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effort::Low => "low",
            Effort::Medium => "medium",
            Effort::High => "high",
            Effort::Unknown => "unknown",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Effort::Low),
            "medium" => Some(Effort::Medium),
            "high" => Some(Effort::High),
            _ => None,
        }
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub fix: String,
    pub priority: Priority,
    pub explanation: String,
}

/// Typed view of one classifier response.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub root_cause: String,
    pub severity: Severity,
    pub suggestions: Vec<Suggestion>,
    pub estimated_effort: Effort,
}

impl Classification {
    /// Coerce a raw classifier response.
    ///
    /// Missing or unrecognized `severity`/`estimated_effort` become
    /// `unknown`; suggestions without a `fix` are dropped; an unrecognized
    /// priority becomes `medium`. Anything other than a JSON object is
    /// treated as a failed classification.
    pub fn from_response(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::failed("classifier response is not a JSON object");
        };

        let root_cause = obj
            .get("root_cause")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let severity = obj
            .get("severity")
            .and_then(Value::as_str)
            .and_then(Severity::parse)
            .unwrap_or(Severity::Unknown);
        let estimated_effort = obj
            .get("estimated_effort")
            .and_then(Value::as_str)
            .and_then(Effort::parse)
            .unwrap_or(Effort::Unknown);
        let suggestions = obj
            .get("suggestions")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(coerce_suggestion).collect())
            .unwrap_or_default();

        Self {
            root_cause,
            severity,
            suggestions,
            estimated_effort,
        }
    }

    /// The degraded classification used when the classifier failed.
    pub fn failed(reason: impl fmt::Display) -> Self {
        Self {
            root_cause: format!("Analysis failed: {}", reason),
            severity: Severity::Unknown,
            suggestions: Vec::new(),
            estimated_effort: Effort::Unknown,
        }
    }
}

fn coerce_suggestion(item: &Value) -> Option<Suggestion> {
    if let Some(fix) = item.as_str() {
        let fix = fix.trim();
        return (!fix.is_empty()).then(|| Suggestion {
            fix: fix.to_string(),
            priority: Priority::Medium,
            explanation: String::new(),
        });
    }

    let obj = item.as_object()?;
    let fix = obj.get("fix").and_then(Value::as_str)?.trim();
    if fix.is_empty() {
        return None;
    }
    Some(Suggestion {
        fix: fix.to_string(),
        priority: obj
            .get("priority")
            .and_then(Value::as_str)
            .and_then(Priority::parse)
            .unwrap_or(Priority::Medium),
        explanation: obj
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string(),
    })
}

/// Triage result for one timing path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub startpoint: String,
    pub endpoint: String,
    pub path_type: String,
    pub status: PathStatus,
    pub slack: Option<f64>,
    pub root_cause: String,
    pub severity: Severity,
    pub suggestions: Vec<Suggestion>,
    pub estimated_effort: Effort,
}

impl AnalysisRecord {
    /// Identity fields always come from `path`, never from the classifier.
    pub fn merge(path: &TimingPath, classification: Classification) -> Self {
        Self {
            startpoint: path.startpoint.clone(),
            endpoint: path.endpoint.clone(),
            path_type: path.path_type.clone(),
            status: path.status,
            slack: path.slack,
            root_cause: classification.root_cause,
            severity: classification.severity,
            suggestions: classification.suggestions,
            estimated_effort: classification.estimated_effort,
        }
    }

    pub fn is_violated(&self) -> bool {
        self.status == PathStatus::Violated
    }
}

/// Outcome of classifying the path at `index` of the analyzed batch.
pub type ClassifierOutcome = (usize, Result<Value, AIError>);

/// Merges paths with classifier outcomes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAssembler;

impl ReportAssembler {
    pub fn new() -> Self {
        Self
    }

    /// One record per path, in path order.
    ///
    /// `outcomes` may arrive in any order. A failed outcome or a path with
    /// no outcome at all yields a degraded record; outcomes whose index is
    /// out of range are ignored.
    pub fn assemble<I>(&self, paths: &[TimingPath], outcomes: I) -> Vec<AnalysisRecord>
    where
        I: IntoIterator<Item = ClassifierOutcome>,
    {
        let mut slots: Vec<Option<Classification>> = vec![None; paths.len()];

        for (index, outcome) in outcomes {
            let Some(slot) = slots.get_mut(index) else {
                tracing::warn!("Dropping classifier outcome for unknown path index {}", index);
                continue;
            };
            let classification = match outcome {
                Ok(value) => Classification::from_response(&value),
                Err(e) => {
                    tracing::warn!("Classification of path {} failed: {}", index + 1, e);
                    Classification::failed(e)
                }
            };
            if slot.is_none() {
                *slot = Some(classification);
            }
        }

        paths
            .iter()
            .zip(slots)
            .map(|(path, slot)| {
                let classification = slot
                    .unwrap_or_else(|| Classification::failed("no classification result"));
                AnalysisRecord::merge(path, classification)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(start: &str, status: PathStatus) -> TimingPath {
        TimingPath {
            startpoint: start.to_string(),
            endpoint: "B".to_string(),
            clock: "clk".to_string(),
            path_type: "max".to_string(),
            data_arrival_time: Some(1.0),
            data_required_time: Some(0.8),
            slack: Some(-0.2),
            status,
            logic_chain: vec![],
        }
    }

    #[test]
    fn test_path_wins_over_classifier_identity() {
        let response = json!({
            "startpoint": "X",
            "endpoint": "Y",
            "status": "MET",
            "slack": 99.0,
            "root_cause": "deep logic",
            "severity": "HIGH",
            "suggestions": [],
            "estimated_effort": "medium",
        });
        let record = AnalysisRecord::merge(
            &path("A", PathStatus::Violated),
            Classification::from_response(&response),
        );
        assert_eq!(record.startpoint, "A");
        assert_eq!(record.endpoint, "B");
        assert_eq!(record.status, PathStatus::Violated);
        assert_eq!(record.slack, Some(-0.2));
        assert_eq!(record.severity, Severity::High);
        assert_eq!(record.estimated_effort, Effort::Medium);
    }

    #[test]
    fn test_coercion_defaults() {
        let response = json!({
            "severity": "severe",
            "suggestions": [
                {"fix": "Upsize U3", "priority": "urgent"},
                {"priority": "high", "explanation": "no fix given"},
                "Add pipeline stage",
                42,
            ],
        });
        let c = Classification::from_response(&response);
        assert_eq!(c.root_cause, "");
        assert_eq!(c.severity, Severity::Unknown);
        assert_eq!(c.estimated_effort, Effort::Unknown);
        assert_eq!(c.suggestions.len(), 2);
        assert_eq!(c.suggestions[0].priority, Priority::Medium);
        assert_eq!(c.suggestions[0].explanation, "");
        assert_eq!(c.suggestions[1].fix, "Add pipeline stage");
    }

    #[test]
    fn test_non_object_response_is_failure() {
        let c = Classification::from_response(&json!(["not", "an", "object"]));
        assert_eq!(c.severity, Severity::Unknown);
        assert!(c.root_cause.starts_with("Analysis failed"));
    }

    #[test]
    fn test_assemble_reorders_and_isolates_failures() {
        let paths = vec![
            path("p1", PathStatus::Violated),
            path("p2", PathStatus::Violated),
            path("p3", PathStatus::Violated),
        ];
        let ok = |cause: &str| -> Result<Value, AIError> {
            Ok(json!({"root_cause": cause, "severity": "critical", "suggestions": [], "estimated_effort": "high"}))
        };
        let outcomes = vec![
            (2, ok("third")),
            (1, Err(AIError::InvalidResponse("timeout".to_string()))),
            (0, ok("first")),
            (7, ok("stray")),
        ];

        let records = ReportAssembler::new().assemble(&paths, outcomes);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].startpoint, "p1");
        assert_eq!(records[0].root_cause, "first");
        assert_eq!(records[1].severity, Severity::Unknown);
        assert_eq!(records[1].estimated_effort, Effort::Unknown);
        assert!(records[1].suggestions.is_empty());
        assert!(records[1].root_cause.contains("timeout"));
        assert_eq!(records[2].root_cause, "third");
        assert_eq!(records[2].severity, Severity::Critical);
    }

    #[test]
    fn test_missing_outcome_is_degraded() {
        let paths = vec![path("only", PathStatus::Met)];
        let records = ReportAssembler::new().assemble(&paths, Vec::new());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Unknown);
        assert_eq!(records[0].root_cause, "Analysis failed: no classification result");
    }
}
