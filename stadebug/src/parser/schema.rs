use serde::{Deserialize, Serialize};
use std::fmt;

/// Timing outcome of a path as reported by the STA tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PathStatus {
    #[default]
    Met,
    Violated,
}

impl PathStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathStatus::Met => "MET",
            PathStatus::Violated => "VIOLATED",
        }
    }
}

impl fmt::Display for PathStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stage of the per-path delay breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicStage {
    pub cell: String,
    pub delay: f64,
}

/// A single timing path extracted from a report block.
///
/// Times are in nanoseconds. Optional values are serialized as `null` so the
/// JSON form always carries every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingPath {
    pub startpoint: String,
    pub endpoint: String,
    pub clock: String,
    pub path_type: String,
    pub data_arrival_time: Option<f64>,
    pub data_required_time: Option<f64>,
    pub slack: Option<f64>,
    pub status: PathStatus,
    /// Stages in source order.
    pub logic_chain: Vec<LogicStage>,
}

impl TimingPath {
    pub fn is_violated(&self) -> bool {
        self.status == PathStatus::Violated
    }

    pub fn logic_depth(&self) -> usize {
        self.logic_chain.len()
    }

    pub fn total_stage_delay(&self) -> f64 {
        self.logic_chain.iter().map(|s| s.delay).sum()
    }

    /// The stage with the largest delay; the first one wins on ties.
    pub fn slowest_stage(&self) -> Option<&LogicStage> {
        self.logic_chain.iter().fold(None, |best: Option<&LogicStage>, stage| match best {
            Some(b) if b.delay >= stage.delay => Some(b),
            _ => Some(stage),
        })
    }

    /// Field-complete JSON object handed to classifiers.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
