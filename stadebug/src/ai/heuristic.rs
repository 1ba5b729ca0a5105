//! Offline classifier
//!
//! Deterministic triage used when no API key is configured. It looks at the
//! slack magnitude, the check type and the shape of the logic chain only.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::ai::provider::{ClassifierInfo, PathClassifier};
use crate::ai::AIError;
use crate::parser::schema::TimingPath;

/// Share of total stage delay above which a single stage is called dominant.
const DOMINANT_STAGE_SHARE: f64 = 0.4;
/// Logic depth above which a path is called deep.
const DEEP_LOGIC_LEVELS: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify synchronously; the async trait method wraps this.
    pub fn classify_path(&self, path: &TimingPath) -> Value {
        if !path.is_violated() {
            return json!({
                "root_cause": "Timing requirements met; no action required.",
                "severity": "low",
                "suggestions": [],
                "estimated_effort": "low",
            });
        }

        let overshoot = path.slack.map(|s| -s).unwrap_or(0.0).max(0.0);
        let severity = severity_for(overshoot);

        if is_hold_check(&path.path_type) {
            return json!({
                "root_cause": format!(
                    "Hold violation: data reaches {} {:.3} ns too early; the launch-to-capture path is faster than the clock skew allows.",
                    path.endpoint, overshoot
                ),
                "severity": severity,
                "suggestions": [
                    {
                        "fix": "Insert delay buffers on the data path",
                        "priority": "high",
                        "explanation": "Adding delay cells close to the capture flop increases data arrival without touching the setup-critical paths.",
                    },
                    {
                        "fix": "Review clock skew between launch and capture registers",
                        "priority": "medium",
                        "explanation": "Excess positive skew at the capture clock pin tightens the hold window.",
                    },
                ],
                "estimated_effort": "low",
            });
        }

        let total = path.total_stage_delay();
        let depth = path.logic_depth();
        let dominant = path
            .slowest_stage()
            .filter(|s| total > 0.0 && s.delay / total >= DOMINANT_STAGE_SHARE);

        let (root_cause, mut suggestions) = if let Some(stage) = dominant {
            (
                format!(
                    "Stage {} contributes {:.0}% of the {:.3} ns path delay; slack is short by {:.3} ns.",
                    stage.cell,
                    stage.delay / total * 100.0,
                    total,
                    overshoot
                ),
                vec![
                    suggestion(
                        &format!("Upsize or swap the cell at {}", stage.cell),
                        "high",
                        "A stronger drive or lower-Vt variant cuts the dominant stage delay directly.",
                    ),
                    suggestion(
                        "Reduce load on the slow stage's output net",
                        "medium",
                        "Buffering or splitting high fanout lowers the transition time seen by the slow cell.",
                    ),
                ],
            )
        } else if depth >= DEEP_LOGIC_LEVELS {
            (
                format!(
                    "{} logic levels accumulate {:.3} ns of delay; slack is short by {:.3} ns.",
                    depth, total, overshoot
                ),
                vec![
                    suggestion(
                        "Restructure logic to reduce levels",
                        "high",
                        "Flattening or re-balancing the cone shortens the critical chain.",
                    ),
                    suggestion(
                        "Insert a pipeline register",
                        "medium",
                        "Splitting the path across two cycles removes the violation at the cost of latency.",
                    ),
                ],
            )
        } else {
            (
                format!(
                    "Data arrival exceeds the required time by {:.3} ns across a {}-stage path.",
                    overshoot, depth
                ),
                vec![suggestion(
                    "Optimize placement of the path's cells",
                    "medium",
                    "Shorter interconnect between stages reduces wire delay on a shallow path.",
                )],
            )
        };

        if severity == "critical" {
            suggestions.push(suggestion(
                "Revisit the clock constraint or declare a multicycle path if the design allows it",
                "low",
                "Large violations are sometimes constraint errors rather than logic problems.",
            ));
        }

        json!({
            "root_cause": root_cause,
            "severity": severity,
            "suggestions": suggestions,
            "estimated_effort": effort_for(severity),
        })
    }
}

fn suggestion(fix: &str, priority: &str, explanation: &str) -> Value {
    json!({ "fix": fix, "priority": priority, "explanation": explanation })
}

fn is_hold_check(path_type: &str) -> bool {
    matches!(path_type.trim().to_lowercase().as_str(), "min" | "hold")
}

fn severity_for(overshoot: f64) -> &'static str {
    if overshoot >= 1.0 {
        "critical"
    } else if overshoot >= 0.5 {
        "high"
    } else if overshoot >= 0.1 {
        "medium"
    } else {
        "low"
    }
}

fn effort_for(severity: &str) -> &'static str {
    match severity {
        "critical" => "high",
        "high" | "medium" => "medium",
        _ => "low",
    }
}

#[async_trait]
impl PathClassifier for RuleBasedClassifier {
    fn name(&self) -> &str {
        "offline"
    }

    async fn classify(&self, path: &TimingPath) -> Result<Value, AIError> {
        Ok(self.classify_path(path))
    }

    fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            provider: "offline".to_string(),
            model_name: "rule-based".to_string(),
            is_local: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::{LogicStage, PathStatus};

    fn violated(path_type: &str, slack: f64, delays: &[f64]) -> TimingPath {
        TimingPath {
            startpoint: "r1/Q".to_string(),
            endpoint: "r2/D".to_string(),
            clock: "clk".to_string(),
            path_type: path_type.to_string(),
            data_arrival_time: None,
            data_required_time: None,
            slack: Some(slack),
            status: PathStatus::Violated,
            logic_chain: delays
                .iter()
                .enumerate()
                .map(|(i, d)| LogicStage { cell: format!("U{}/Z", i), delay: *d })
                .collect(),
        }
    }

    #[test]
    fn test_met_path_is_low() {
        let mut path = violated("max", 0.3, &[0.1]);
        path.status = PathStatus::Met;
        let value = RuleBasedClassifier.classify_path(&path);
        assert_eq!(value["severity"], "low");
        assert!(value["suggestions"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_dominant_stage_is_named() {
        let value = RuleBasedClassifier.classify_path(&violated("max", -0.6, &[0.1, 0.9, 0.2]));
        assert_eq!(value["severity"], "high");
        assert_eq!(value["estimated_effort"], "medium");
        assert!(value["root_cause"].as_str().unwrap().contains("U1/Z"));
    }

    #[test]
    fn test_deep_chain() {
        let value = RuleBasedClassifier.classify_path(&violated("setup", -1.5, &[0.1; 10]));
        assert_eq!(value["severity"], "critical");
        assert!(value["root_cause"].as_str().unwrap().starts_with("10 logic levels"));
        assert_eq!(value["suggestions"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_hold_check() {
        let value = RuleBasedClassifier.classify_path(&violated("min", -0.05, &[0.02]));
        assert_eq!(value["severity"], "low");
        assert!(value["root_cause"].as_str().unwrap().starts_with("Hold violation"));
    }
}
