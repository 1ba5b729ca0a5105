//! PDF output for [`ReportDocument`] layouts.
//!
//! Uses the standard Type1 Courier family so no fonts are embedded and
//! text width is known up front (every glyph is 0.6 em wide).

use std::ops::Range;

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use crate::report::analysis::AnalysisRecord;
use crate::report::document::{Block, ReportDocument};
use crate::report::RenderError;

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 54;
const CONTENT_WIDTH: i64 = PAGE_WIDTH - 2 * MARGIN;
const FOOTER_SPACE: i64 = 18;
const LABEL_COLUMN: i64 = 160;
const CELL_PADDING: i64 = 6;
const TABLE_FONT_SIZE: i64 = 10;
const TABLE_LEADING: i64 = 12;

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Oblique];

    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Courier",
            Font::Bold => "Courier-Bold",
            Font::Oblique => "Courier-Oblique",
        }
    }
}

fn pdf_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Pdf(e.to_string())
}

/// Replace anything outside printable ASCII; the standard fonts use
/// a single-byte encoding.
fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2192}' => out.push_str("->"),
            '\u{2022}' => out.push('*'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\t' => out.push(' '),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn max_chars(width: i64, size: i64) -> usize {
    let glyph = size as f32 * 0.6;
    ((width as f32 / glyph).floor() as usize).max(1)
}

fn text_width(text: &str, size: i64) -> i64 {
    (text.chars().count() as f32 * size as f32 * 0.6).round() as i64
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let len = current.chars().count();
        if len > 0 && len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Accumulates content-stream operations, breaking pages as the cursor
/// reaches the bottom margin.
struct PageWriter {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: i64,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn bottom() -> i64 {
        MARGIN + FOOTER_SPACE
    }

    fn break_page(&mut self) {
        let ops = std::mem::take(&mut self.current);
        self.pages.push(ops);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn ensure(&mut self, height: i64) {
        if self.y - height < Self::bottom() {
            self.break_page();
        }
    }

    /// Lines of table text that still fit above the bottom margin.
    fn table_lines_left(&self) -> usize {
        ((self.y - Self::bottom() - 2 * CELL_PADDING) / TABLE_LEADING).max(0) as usize
    }

    /// `text` must already be sanitized.
    fn text_at(&mut self, x: i64, y: i64, font: Font, size: i64, text: &str) {
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource().into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn line(&mut self, text: &str, font: Font, size: i64, indent: i64) {
        let leading = size + 4;
        self.ensure(leading);
        self.y -= leading;
        self.text_at(MARGIN + indent, self.y, font, size, text);
    }

    fn centered(&mut self, text: &str, font: Font, size: i64) {
        let leading = size + 6;
        self.ensure(leading);
        self.y -= leading;
        let text = sanitize(text);
        let x = ((PAGE_WIDTH - text_width(&text, size)) / 2).max(MARGIN);
        self.text_at(x, self.y, font, size, &text);
    }

    fn paragraph(&mut self, text: &str, font: Font, size: i64, indent: i64) {
        // Measure what will be drawn: sanitizing can lengthen the text.
        for line in wrap(&sanitize(text), max_chars(CONTENT_WIDTH - indent, size)) {
            self.line(&line, font, size, indent);
        }
    }

    fn space(&mut self, height: i64) {
        if self.y - height < Self::bottom() {
            self.break_page();
        } else {
            self.y -= height;
        }
    }

    fn fill_color(&mut self, r: f32, g: f32, b: f32) {
        self.current.push(Operation::new(
            "rg",
            vec![Object::Real(r.into()), Object::Real(g.into()), Object::Real(b.into())],
        ));
    }

    /// Rows that fit on one page are kept whole. A taller row is drawn
    /// in segments that continue at the top of the following pages.
    fn table(&mut self, rows: &[[String; 2]]) {
        let value_width = CONTENT_WIDTH - LABEL_COLUMN;
        let page_lines = ((PAGE_HEIGHT - MARGIN - Self::bottom() - 2 * CELL_PADDING)
            / TABLE_LEADING) as usize;

        for (i, row) in rows.iter().enumerate() {
            let labels = wrap(
                &sanitize(&row[0]),
                max_chars(LABEL_COLUMN - 2 * CELL_PADDING, TABLE_FONT_SIZE),
            );
            let values = wrap(
                &sanitize(&row[1]),
                max_chars(value_width - 2 * CELL_PADDING, TABLE_FONT_SIZE),
            );
            let total = labels.len().max(values.len());

            if total <= page_lines && self.table_lines_left() < total {
                self.break_page();
            }
            let mut start = 0;
            while start < total {
                if self.table_lines_left() == 0 {
                    self.break_page();
                }
                let end = total.min(start + self.table_lines_left());
                self.table_segment(i == 0, &labels, &values, start..end);
                start = end;
            }
        }
    }

    fn table_segment(&mut self, header: bool, labels: &[String], values: &[String], lines: Range<usize>) {
        let height = lines.len() as i64 * TABLE_LEADING + 2 * CELL_PADDING;
        let top = self.y;
        let bottom = top - height;

        if header {
            self.fill_color(0.75, 0.75, 0.75);
        } else {
            self.fill_color(0.96, 0.96, 0.86);
        }
        self.current.extend([
            Operation::new(
                "re",
                vec![MARGIN.into(), bottom.into(), CONTENT_WIDTH.into(), height.into()],
            ),
            Operation::new("f", vec![]),
            Operation::new("w", vec![Object::Real(0.5)]),
            Operation::new(
                "re",
                vec![MARGIN.into(), bottom.into(), CONTENT_WIDTH.into(), height.into()],
            ),
            Operation::new("m", vec![(MARGIN + LABEL_COLUMN).into(), bottom.into()]),
            Operation::new("l", vec![(MARGIN + LABEL_COLUMN).into(), top.into()]),
            Operation::new("S", vec![]),
        ]);
        self.fill_color(0.0, 0.0, 0.0);

        let font = if header { Font::Bold } else { Font::Regular };
        for (col, cell) in [(0, labels), (LABEL_COLUMN, values)] {
            let visible = cell.get(lines.start..lines.end.min(cell.len())).unwrap_or_default();
            for (j, text) in visible.iter().enumerate() {
                let baseline = top - CELL_PADDING - TABLE_FONT_SIZE - j as i64 * TABLE_LEADING;
                self.text_at(MARGIN + col + CELL_PADDING, baseline + 2, font, TABLE_FONT_SIZE, text);
            }
        }
        self.y = bottom;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        let total = self.pages.len();
        for (i, page) in self.pages.iter_mut().enumerate() {
            let footer = format!("Page {} of {}", i + 1, total);
            let x = (PAGE_WIDTH - text_width(&footer, 8)) / 2;
            page.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Font::Oblique.resource().into(), 8.into()]),
                Operation::new("Td", vec![x.into(), (MARGIN / 2).into()]),
                Operation::new("Tj", vec![Object::string_literal(footer)]),
                Operation::new("ET", vec![]),
            ]);
        }
        self.pages
    }
}

/// Renders analysis records to PDF bytes.
///
/// Output depends only on the records and the timestamp passed in, so the
/// same inputs always produce byte-identical files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        records: &[AnalysisRecord],
        generated_at: DateTime<Utc>,
    ) -> Result<Vec<u8>, RenderError> {
        let document = ReportDocument::build(records, generated_at)?;
        self.render_document(&document)
    }

    pub fn render_document(&self, document: &ReportDocument) -> Result<Vec<u8>, RenderError> {
        let mut writer = PageWriter::new();
        for block in &document.blocks {
            match block {
                Block::Title(t) => writer.centered(t, Font::Bold, 18),
                Block::Heading(t) => writer.paragraph(t, Font::Bold, 14, 0),
                Block::Subheading(t) => writer.paragraph(t, Font::Bold, 11, 0),
                Block::Text(t) => writer.paragraph(t, Font::Regular, 10, 0),
                Block::Table(rows) => writer.table(rows),
                Block::Item { text, note } => {
                    writer.paragraph(text, Font::Regular, 10, 12);
                    if let Some(note) = note {
                        writer.paragraph(note, Font::Oblique, 9, 30);
                    }
                }
                Block::Spacer(h) => writer.space(i64::from(*h)),
            }
        }

        let pages = writer.finish();
        tracing::debug!(
            pages = pages.len(),
            violations = document.violation_sections,
            "rendered PDF report"
        );
        assemble(pages)
    }
}

fn assemble(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource(), font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let encoded = Content { operations }.encode().map_err(pdf_error)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(pdf_error)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::PathStatus;
    use crate::report::analysis::{Effort, Priority, Severity, Suggestion};
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn record(start: &str, status: PathStatus) -> AnalysisRecord {
        AnalysisRecord {
            startpoint: start.to_string(),
            endpoint: "core/acc_reg[7]/D".to_string(),
            path_type: "max".to_string(),
            status,
            slack: Some(-0.35),
            root_cause: "Deep adder tree between the input and accumulator registers".to_string(),
            severity: Severity::High,
            suggestions: vec![
                Suggestion {
                    fix: "Pipeline the adder tree".to_string(),
                    priority: Priority::High,
                    explanation: "Splits the combinational depth across two cycles".to_string(),
                },
                Suggestion {
                    fix: "Upsize the slowest cell".to_string(),
                    priority: Priority::Low,
                    explanation: String::new(),
                },
            ],
            estimated_effort: Effort::Medium,
        }
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    #[test]
    fn test_renders_valid_pdf() {
        let records = vec![
            record("in_a", PathStatus::Violated),
            record("in_b", PathStatus::Met),
            record("in_c", PathStatus::Violated),
        ];
        let bytes = PdfRenderer::new().render(&records, ts()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert!(contains(&bytes, "Violated Paths: 2 of 3"));
        assert!(contains(&bytes, "Violation 2: in_c -> core/acc_reg[7]/D"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_output_is_deterministic() {
        let records = vec![record("in_a", PathStatus::Violated)];
        let a = PdfRenderer::new().render(&records, ts()).unwrap();
        let b = PdfRenderer::new().render(&records, ts()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_long_reports_paginate_with_footer() {
        let records: Vec<AnalysisRecord> = (0..25)
            .map(|i| record(&format!("in_{}", i), PathStatus::Violated))
            .collect();
        let bytes = PdfRenderer::new().render(&records, ts()).unwrap();
        let pages = Document::load_mem(&bytes).unwrap().get_pages().len();
        assert!(pages > 1);
        assert!(contains(&bytes, &format!("Page {} of {}", pages, pages)));
    }

    #[test]
    fn test_empty_record_list_still_renders() {
        let bytes = PdfRenderer::new().render(&[], ts()).unwrap();
        assert!(contains(&bytes, "Total Paths Analyzed: 0"));
        assert!(contains(&bytes, "No timing violations found."));
    }

    /// Each text run as (x, y, right edge, text), across all pages.
    fn text_runs(bytes: &[u8]) -> Vec<(i64, i64, f32, String)> {
        let doc = Document::load_mem(bytes).unwrap();
        let mut runs = Vec::new();
        for id in doc.get_pages().values() {
            let content = Content::decode(&doc.get_page_content(*id).unwrap()).unwrap();
            let (mut size, mut x, mut y) = (0, 0, 0);
            for op in content.operations {
                match op.operator.as_str() {
                    "Tf" => size = op.operands[1].as_i64().unwrap(),
                    "Td" => {
                        x = op.operands[0].as_i64().unwrap();
                        y = op.operands[1].as_i64().unwrap();
                    }
                    "Tj" => {
                        if let Object::String(text, _) = &op.operands[0] {
                            let right = x as f32 + text.len() as f32 * size as f32 * 0.6;
                            runs.push((x, y, right, String::from_utf8_lossy(text).into_owned()));
                        }
                    }
                    _ => {}
                }
            }
        }
        runs
    }

    #[test]
    fn test_tall_table_row_continues_across_pages() {
        let mut tall = record("in_a", PathStatus::Violated);
        tall.path_type = "x".repeat(12000);
        let bytes = PdfRenderer::new().render(&[tall], ts()).unwrap();
        assert!(Document::load_mem(&bytes).unwrap().get_pages().len() > 1);

        let runs = text_runs(&bytes);
        for (_, y, _, text) in &runs {
            if text.starts_with("Page ") {
                assert_eq!(*y, MARGIN / 2);
            } else {
                assert!(*y >= PageWriter::bottom(), "{:?} drawn at y={}", text, y);
            }
        }
        // Nothing is cut off along the way.
        let drawn: usize = runs
            .iter()
            .filter(|(_, _, _, t)| !t.is_empty() && t.bytes().all(|b| b == b'x'))
            .map(|(_, _, _, t)| t.len())
            .sum();
        assert_eq!(drawn, 12000);
    }

    #[test]
    fn test_expanded_glyphs_stay_inside_margins() {
        let mut r = record("in_a", PathStatus::Violated);
        r.root_cause = "a\u{2192}b ".repeat(200);
        r.path_type = "q\u{2192}d ".repeat(40);
        let bytes = PdfRenderer::new().render(&[r], ts()).unwrap();

        let runs = text_runs(&bytes);
        assert!(runs.iter().any(|(_, _, _, t)| t.contains("a->b")));
        for (x, _, right, text) in &runs {
            assert!(*x >= MARGIN, "{:?} starts at x={}", text, x);
            assert!(*right <= (PAGE_WIDTH - MARGIN) as f32, "{:?} ends at x={}", text, right);
        }
    }

    #[test]
    fn test_sanitize_and_wrap() {
        assert_eq!(sanitize("a \u{2192} b \u{00b5}s"), "a -> b ?s");
        assert_eq!(wrap("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 10), vec![""]);
    }
}
