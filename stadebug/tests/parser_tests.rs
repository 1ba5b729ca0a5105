//! Parser tests against report fixtures

use stadebug::parser::{BlockError, LineRule, PathBuilder};
use stadebug::prelude::*;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).unwrap()
}

#[test]
fn test_parse_opensta_report() {
    let paths = ReportParser::new().parse(&fixture("opensta_checks.rpt"));
    assert_eq!(paths.len(), 3, "header text must not produce a path");

    let first = &paths[0];
    assert!(first.startpoint.starts_with("cpu/reg_op1[3]"));
    assert!(first.endpoint.starts_with("cpu/alu_out_q[31]"));
    assert_eq!(first.clock, "core_clk");
    assert_eq!(first.path_type, "max");
    assert_eq!(first.data_arrival_time, Some(2.85));
    assert_eq!(first.data_required_time, Some(2.39));
    assert_eq!(first.slack, Some(-0.46));
    assert_eq!(first.status, PathStatus::Violated);
    assert_eq!(first.logic_chain.len(), 6);
    assert_eq!(first.slowest_stage().map(|s| s.delay), Some(1.85));

    assert_eq!(paths[1].status, PathStatus::Met);
    assert_eq!(paths[1].slack, Some(1.80));
    assert_eq!(paths[2].path_type, "min");
    assert_eq!(paths[2].status, PathStatus::Violated);
}

#[test]
fn test_parse_is_deterministic() {
    let text = fixture("opensta_checks.rpt");
    let parser = ReportParser::new();
    assert_eq!(parser.parse(&text), parser.parse(&text));
    assert_eq!(stadebug::parse_report(&text), parser.parse(&text));
}

#[test]
fn test_block_and_stage_order_preserved() {
    let paths = ReportParser::new().parse(&fixture("opensta_checks.rpt"));
    let starts: Vec<&str> = paths
        .iter()
        .map(|p| p.startpoint.split_whitespace().next().unwrap_or(""))
        .collect();
    assert_eq!(
        starts,
        vec!["cpu/reg_op1[3]", "cpu/decoder_trigger", "cpu/mem_rdata_q[7]"]
    );

    let delays: Vec<f64> = paths[0].logic_chain.iter().map(|s| s.delay).collect();
    assert_eq!(delays, vec![0.00, 0.42, 0.31, 1.85, 0.27, 0.00]);
    assert!(paths[0].logic_chain[3].cell.contains("cpu/_2907_/X"));
}

#[test]
fn test_minimal_block_fields() {
    let text = "Startpoint: reg1/Q\nEndpoint: reg2/D\nPath Group: clk\nPath Type: setup\n1.20 v INV1\ndata arrival time\n-1.20 data required time\n-1.20 slack (VIOLATED)\n";
    let paths = ReportParser::new().parse(text);
    assert_eq!(paths.len(), 1);

    let p = &paths[0];
    assert_eq!(p.startpoint, "reg1/Q");
    assert_eq!(p.endpoint, "reg2/D");
    assert_eq!(p.clock, "clk");
    assert_eq!(p.path_type, "setup");
    assert_eq!(p.status, PathStatus::Violated);
    assert_eq!(p.slack, Some(-1.20));
    assert_eq!(p.data_arrival_time, None);
    assert_eq!(p.data_required_time, Some(-1.20));
    assert_eq!(p.logic_chain.len(), 1);
    assert_eq!(p.logic_chain[0].cell, "INV1");
    assert_eq!(p.logic_chain[0].delay, 1.20);
}

#[test]
fn test_violation_detection() {
    let parser = ReportParser::new();
    let violated = parser.parse("Startpoint: a\n  -0.5 Slack (violated)\n");
    assert_eq!(violated[0].status, PathStatus::Violated);

    let met = parser.parse("Startpoint: a\n  0.25 slack (MET)\n");
    assert_eq!(met[0].status, PathStatus::Met);
    assert_eq!(met[0].slack, Some(0.25));
}

#[test]
fn test_malformed_blocks_are_skipped_not_fatal() {
    let outcome = ReportParser::new().parse_with_diagnostics(&fixture("malformed.rpt"));

    assert_eq!(outcome.paths.len(), 3);
    assert_eq!(outcome.skipped_blocks(), 1);
    assert_eq!(outcome.skipped[0].error, BlockError::Empty);
    assert_eq!(outcome.skipped[0].line, 23);

    // Unparsable arrival time leaves only that field unset.
    let fifo = &outcome.paths[0];
    assert_eq!(fifo.data_arrival_time, None);
    assert_eq!(fifo.data_required_time, Some(4.10));
    assert_eq!(fifo.slack, Some(-0.20));
    assert_eq!(fifo.status, PathStatus::Violated);
    assert_eq!(fifo.logic_chain.len(), 1);

    // A bare marker still yields a path; the next line becomes its startpoint.
    let empty_q = &outcome.paths[1];
    assert!(empty_q.startpoint.starts_with("Endpoint: top/u_fifo/empty_q"));
    assert_eq!(empty_q.endpoint, "");
    assert_eq!(empty_q.clock, "clk");
    assert_eq!(empty_q.slack, Some(0.40));
    assert_eq!(empty_q.status, PathStatus::Met);

    // Unparsable stage delay falls back to zero but keeps the stage.
    let uart = &outcome.paths[2];
    assert_eq!(uart.logic_chain.len(), 1);
    assert_eq!(uart.logic_chain[0].delay, 0.0);
    assert_eq!(uart.status, PathStatus::Met);
}

#[test]
fn test_negative_slack_without_marker() {
    let text = fixture("negative_unmarked.rpt");

    let literal = ReportParser::new().parse(&text);
    assert_eq!(literal[0].slack, Some(-0.10));
    assert_eq!(literal[0].status, PathStatus::Met);

    let by_sign = ReportParser::new().negative_slack_violates(true).parse(&text);
    assert_eq!(by_sign[0].status, PathStatus::Violated);
}

#[test]
fn test_empty_and_headerless_inputs() {
    let parser = ReportParser::new();
    assert!(parser.parse("").is_empty());
    assert!(parser.parse(&fixture("no_paths.rpt")).is_empty());
}

#[test]
fn test_dialect_rule_extends_table() {
    // PrimeTime prints the launch clock on its own line.
    let mut parser = ReportParser::new();
    parser.add_rule(LineRule::new(
        "launch_clock",
        |line, b: &PathBuilder| line.starts_with("Launch Clock:") && b.clock.is_none(),
        |line, b| b.clock = Some(line["Launch Clock:".len()..].trim().to_string()),
    ));

    let paths = parser.parse("Startpoint: u0/Q\nLaunch Clock: pclk\n 0.1 slack (MET)\n");
    assert_eq!(paths[0].clock, "pclk");
}
