//! Page-independent layout of the violation report.
//!
//! [`ReportDocument`] decides *what* goes into the report and in which
//! order; the PDF renderer only decides where it lands on the page.

use chrono::{DateTime, Utc};

use crate::report::analysis::AnalysisRecord;
use crate::report::RenderError;

pub const REPORT_TITLE: &str = "Timing Violation Analysis Report";
pub const PLACEHOLDER: &str = "N/A";

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Heading(String),
    Subheading(String),
    Text(String),
    /// Two-column table; the first row is the header.
    Table(Vec<[String; 2]>),
    /// Enumerated list entry with an optional explanatory note.
    Item { text: String, note: Option<String> },
    Spacer(u16),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub blocks: Vec<Block>,
    pub total_paths: usize,
    pub violation_sections: usize,
}

fn or_placeholder(value: &str) -> String {
    if value.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}

impl ReportDocument {
    /// Lay out `records`. Only violated records get a detail section, in
    /// the order they appear.
    ///
    /// Fails when a violated record has no startpoint, since its section
    /// heading cannot be produced.
    pub fn build(
        records: &[AnalysisRecord],
        generated_at: DateTime<Utc>,
    ) -> Result<Self, RenderError> {
        let violations: Vec<(usize, &AnalysisRecord)> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_violated())
            .collect();

        if let Some((index, _)) = violations.iter().find(|(_, r)| r.startpoint.trim().is_empty()) {
            return Err(RenderError::MissingField {
                index: *index,
                field: "startpoint",
            });
        }

        let mut blocks = vec![
            Block::Title(REPORT_TITLE.to_string()),
            Block::Spacer(12),
            Block::Text(format!(
                "Report Generated: {}",
                generated_at.format("%Y-%m-%d %H:%M UTC")
            )),
            Block::Text(format!("Total Paths Analyzed: {}", records.len())),
            Block::Text(format!(
                "Violated Paths: {} of {}",
                violations.len(),
                records.len()
            )),
            Block::Spacer(20),
        ];

        if violations.is_empty() {
            blocks.push(Block::Text("No timing violations found.".to_string()));
        } else {
            blocks.push(Block::Heading("Timing Violations Analysis".to_string()));
            blocks.push(Block::Spacer(12));
        }

        for (ordinal, (_, record)) in violations.iter().enumerate() {
            blocks.extend(violation_section(ordinal + 1, record));
        }

        Ok(Self {
            blocks,
            total_paths: records.len(),
            violation_sections: violations.len(),
        })
    }

    /// Plain-text rendering of the same layout.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Title(t) => {
                    out.push_str(t);
                    out.push('\n');
                    out.push_str(&"=".repeat(t.chars().count()));
                    out.push('\n');
                }
                Block::Heading(t) => {
                    out.push_str(t);
                    out.push('\n');
                    out.push_str(&"-".repeat(t.chars().count()));
                    out.push('\n');
                }
                Block::Subheading(t) | Block::Text(t) => {
                    out.push_str(t);
                    out.push('\n');
                }
                Block::Table(rows) => {
                    let width = rows.iter().map(|r| r[0].chars().count()).max().unwrap_or(0);
                    for row in rows {
                        out.push_str(&format!("  {:<width$}  {}\n", row[0], row[1], width = width));
                    }
                }
                Block::Item { text, note } => {
                    out.push_str("  ");
                    out.push_str(text);
                    out.push('\n');
                    if let Some(note) = note {
                        out.push_str("     ");
                        out.push_str(note);
                        out.push('\n');
                    }
                }
                Block::Spacer(_) => out.push('\n'),
            }
        }
        out
    }
}

fn violation_section(ordinal: usize, record: &AnalysisRecord) -> Vec<Block> {
    let slack = record
        .slack
        .map(|s| format!("{} ns", s))
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let mut blocks = vec![
        Block::Subheading(format!(
            "Violation {}: {} -> {}",
            ordinal,
            record.startpoint,
            or_placeholder(&record.endpoint)
        )),
        Block::Table(vec![
            ["Parameter".to_string(), "Value".to_string()],
            ["Slack".to_string(), slack],
            ["Path Type".to_string(), or_placeholder(&record.path_type)],
            ["Severity".to_string(), record.severity.as_str().to_uppercase()],
            [
                "Estimated Effort".to_string(),
                record.estimated_effort.as_str().to_uppercase(),
            ],
        ]),
        Block::Spacer(12),
        Block::Subheading("Root Cause:".to_string()),
        Block::Text(or_placeholder(&record.root_cause)),
        Block::Spacer(8),
        Block::Subheading("Recommended Fixes:".to_string()),
    ];

    if record.suggestions.is_empty() {
        blocks.push(Block::Text("No suggestions available.".to_string()));
    }
    for (i, s) in record.suggestions.iter().enumerate() {
        blocks.push(Block::Item {
            text: format!("{}. {} [{} priority]", i + 1, s.fix, s.priority.as_str().to_uppercase()),
            note: (!s.explanation.is_empty()).then(|| format!("Explanation: {}", s.explanation)),
        });
    }
    blocks.push(Block::Spacer(20));
    blocks
}
