//! STA report tokenizer.
//!
//! A report is cut into blocks at every [`PATH_MARKER`]. Each block is then
//! read line by line against an ordered rule table: the first rule whose
//! predicate accepts a line consumes it. New report dialects are supported by
//! adding rules, not by touching the block loop.

use std::fmt;
use thiserror::Error;

use crate::parser::schema::{LogicStage, PathStatus, TimingPath};

/// Literal that opens every path block.
pub const PATH_MARKER: &str = "Startpoint:";

const ENDPOINT_PREFIX: &str = "Endpoint:";
const PATH_GROUP_PREFIX: &str = "Path Group:";
const PATH_TYPE_PREFIX: &str = "Path Type:";
const ARRIVAL_MARKER: &str = "data arrival time";
const REQUIRED_MARKER: &str = "data required time";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("block has no content after the startpoint marker")]
    Empty,
}

/// A block that was dropped while parsing. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDiagnostic {
    /// Zero-based index of the block among all marker-delimited blocks.
    pub block: usize,
    /// One-based line of the marker that opened the block.
    pub line: usize,
    pub error: BlockError,
}

impl fmt::Display for BlockDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block {} (line {}): {}", self.block + 1, self.line, self.error)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub paths: Vec<TimingPath>,
    pub skipped: Vec<BlockDiagnostic>,
}

impl ParseOutcome {
    pub fn skipped_blocks(&self) -> usize {
        self.skipped.len()
    }

    pub fn violated_count(&self) -> usize {
        self.paths.iter().filter(|p| p.is_violated()).count()
    }
}

/// Mutable state for the block currently being read.
///
/// Rules only ever fill empty slots, so the first occurrence of a field wins.
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    pub startpoint: String,
    pub endpoint: Option<String>,
    pub clock: Option<String>,
    pub path_type: Option<String>,
    pub data_arrival_time: Option<f64>,
    pub data_required_time: Option<f64>,
    pub slack: Option<f64>,
    pub status: PathStatus,
    pub logic_chain: Vec<LogicStage>,
}

impl PathBuilder {
    pub fn new(startpoint: impl Into<String>) -> Self {
        Self {
            startpoint: startpoint.into(),
            ..Self::default()
        }
    }

    fn build(self, negative_slack_violates: bool) -> TimingPath {
        let mut status = self.status;
        if negative_slack_violates && self.slack.map_or(false, |s| s < 0.0) {
            status = PathStatus::Violated;
        }
        TimingPath {
            startpoint: self.startpoint,
            endpoint: self.endpoint.unwrap_or_default(),
            clock: self.clock.unwrap_or_default(),
            path_type: self.path_type.unwrap_or_default(),
            data_arrival_time: self.data_arrival_time,
            data_required_time: self.data_required_time,
            slack: self.slack,
            status,
            logic_chain: self.logic_chain,
        }
    }
}

pub type LinePredicate = fn(&str, &PathBuilder) -> bool;
pub type LineAction = fn(&str, &mut PathBuilder);

/// One `(predicate, setter)` entry of the rule table. Lines are trimmed
/// before they reach either function.
#[derive(Clone, Copy)]
pub struct LineRule {
    pub name: &'static str,
    pub matches: LinePredicate,
    pub apply: LineAction,
}

impl LineRule {
    pub const fn new(name: &'static str, matches: LinePredicate, apply: LineAction) -> Self {
        Self { name, matches, apply }
    }
}

impl fmt::Debug for LineRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineRule").field("name", &self.name).finish()
    }
}

/// The rule table for OpenSTA / PrimeTime style path reports.
pub fn default_rules() -> Vec<LineRule> {
    vec![
        LineRule::new(
            "endpoint",
            |line, _| line.starts_with(ENDPOINT_PREFIX),
            |line, b| set_once(&mut b.endpoint, field_value(line, ENDPOINT_PREFIX)),
        ),
        LineRule::new(
            "path_group",
            |line, _| line.starts_with(PATH_GROUP_PREFIX),
            |line, b| set_once(&mut b.clock, field_value(line, PATH_GROUP_PREFIX)),
        ),
        LineRule::new(
            "path_type",
            |line, _| line.starts_with(PATH_TYPE_PREFIX),
            |line, b| set_once(&mut b.path_type, field_value(line, PATH_TYPE_PREFIX)),
        ),
        LineRule::new(
            "data_arrival_time",
            |line, b| line.contains(ARRIVAL_MARKER) && b.data_arrival_time.is_none(),
            |line, b| b.data_arrival_time = leading_number(line),
        ),
        LineRule::new(
            "data_required_time",
            |line, b| line.contains(REQUIRED_MARKER) && b.data_required_time.is_none(),
            |line, b| b.data_required_time = leading_number(line),
        ),
        LineRule::new(
            "slack",
            |line, _| line.to_lowercase().contains("slack"),
            apply_slack,
        ),
        LineRule::new("logic_stage", is_logic_stage, apply_logic_stage),
    ]
}

fn field_value(line: &str, prefix: &str) -> String {
    line[prefix.len()..].trim().to_string()
}

fn set_once(slot: &mut Option<String>, value: String) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

/// Leading whitespace-delimited token as a finite real.
fn leading_number(line: &str) -> Option<f64> {
    line.split_whitespace()
        .next()?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn apply_slack(line: &str, b: &mut PathBuilder) {
    if b.slack.is_some() {
        return;
    }
    if let Some(value) = leading_number(line) {
        b.slack = Some(value);
        if line.to_lowercase().contains("violated") {
            b.status = PathStatus::Violated;
        }
    }
}

fn looks_numeric(token: &str) -> bool {
    token
        .trim_start_matches(['-', '+'])
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_digit())
}

fn is_logic_stage(line: &str, _: &PathBuilder) -> bool {
    (line.contains("v ") || line.contains("^ "))
        && line.split_whitespace().count() >= 3
        && line.split_whitespace().any(looks_numeric)
}

fn apply_logic_stage(line: &str, b: &mut PathBuilder) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let delay = tokens[0]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);
    b.logic_chain.push(LogicStage {
        cell: tokens[2..].join(" "),
        delay,
    });
}

/// Converts raw report text into [`TimingPath`] records.
///
/// The parser holds only its rule table, so one instance can be shared
/// across threads and reused for any number of reports.
#[derive(Debug, Clone)]
pub struct ReportParser {
    rules: Vec<LineRule>,
    negative_slack_violates: bool,
}

impl ReportParser {
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
            negative_slack_violates: false,
        }
    }

    /// A parser with a caller-supplied rule table.
    pub fn with_rules(rules: Vec<LineRule>) -> Self {
        Self {
            rules,
            negative_slack_violates: false,
        }
    }

    /// Rules added here run after the existing ones.
    pub fn add_rule(&mut self, rule: LineRule) {
        self.rules.push(rule);
    }

    /// Also mark paths `VIOLATED` when slack is negative but the report
    /// carries no textual marker.
    pub fn negative_slack_violates(mut self, enabled: bool) -> Self {
        self.negative_slack_violates = enabled;
        self
    }

    pub fn rules(&self) -> &[LineRule] {
        &self.rules
    }

    /// Parse a report, discarding diagnostics for skipped blocks.
    pub fn parse(&self, report: &str) -> Vec<TimingPath> {
        self.parse_with_diagnostics(report).paths
    }

    pub fn parse_with_diagnostics(&self, report: &str) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        for (index, (line, block)) in split_blocks(report).into_iter().enumerate() {
            match self.parse_block(block) {
                Ok(path) => {
                    tracing::debug!(
                        "Parsed path {} -> {} ({}, {} stages)",
                        path.startpoint,
                        path.endpoint,
                        path.status,
                        path.logic_chain.len()
                    );
                    outcome.paths.push(path);
                }
                Err(error) => {
                    let diagnostic = BlockDiagnostic { block: index, line, error };
                    tracing::warn!("Skipping {}", diagnostic);
                    outcome.skipped.push(diagnostic);
                }
            }
        }

        outcome
    }

    /// Parse the text of a single block (without its leading marker).
    pub fn parse_block(&self, block: &str) -> Result<TimingPath, BlockError> {
        let mut lines = block.lines().map(str::trim).filter(|l| !l.is_empty());

        // The first non-blank line is the startpoint whatever it says.
        let startpoint = lines.next().ok_or(BlockError::Empty)?;
        let mut builder = PathBuilder::new(startpoint);
        for line in lines {
            if let Some(rule) = self.rules.iter().find(|r| (r.matches)(line, &builder)) {
                (rule.apply)(line, &mut builder);
            }
        }

        Ok(builder.build(self.negative_slack_violates))
    }
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Segments following each marker, paired with the marker's line number.
fn split_blocks(report: &str) -> Vec<(usize, &str)> {
    let starts: Vec<usize> = report.match_indices(PATH_MARKER).map(|(i, _)| i).collect();
    let mut blocks = Vec::with_capacity(starts.len());
    let mut line = 1;
    let mut counted_to = 0;

    for (n, &start) in starts.iter().enumerate() {
        line += report[counted_to..start].matches('\n').count();
        counted_to = start;
        let end = starts.get(n + 1).copied().unwrap_or(report.len());
        blocks.push((line, &report[start + PATH_MARKER.len()..end]));
    }

    blocks
}
