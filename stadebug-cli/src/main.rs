//! stadebug CLI - static timing report triage from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use stadebug::parser::default_rules;
use stadebug::report::AnalysisRecord;
use stadebug::services::ActionLog;
use stadebug::{
    AnalysisOptions, AnalysisReport, ClassifierSettings, JsonKeyFile, ParseOutcome, StaDebugCore,
    TracingActionLog,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing::Level;

#[derive(Parser)]
#[command(name = "stadebug")]
#[command(about = "Static timing analysis report triage tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a timing report and list its paths
    Parse {
        /// Path to a .rpt/.txt/.log timing report
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if any path is violated
        #[arg(long)]
        fail_on_violation: bool,

        /// Treat negative slack as violated even without a VIOLATED marker
        #[arg(long)]
        negative_slack_violates: bool,
    },

    /// Parse, classify and export a timing report
    Analyze {
        /// Path to a .rpt/.txt/.log timing report
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Classify MET paths too
        #[arg(long)]
        all: bool,

        /// Use the rule-based classifier (no network)
        #[arg(long)]
        offline: bool,

        /// Classifier settings (JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// API key file (overrides the config)
        #[arg(long, value_name = "FILE")]
        key_file: Option<PathBuf>,

        /// Key id within the key file
        #[arg(long)]
        key_id: Option<String>,

        /// Maximum classifier requests in flight
        #[arg(long, default_value_t = 4)]
        concurrency: usize,

        /// Name recorded in the action log
        #[arg(long, default_value = "cli")]
        actor: String,

        /// Write the JSON report here
        #[arg(long, value_name = "FILE")]
        json_out: Option<PathBuf>,

        /// Write the PDF report here
        #[arg(long, value_name = "FILE")]
        pdf_out: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Treat negative slack as violated even without a VIOLATED marker
        #[arg(long)]
        negative_slack_violates: bool,
    },

    /// Render a saved JSON report to PDF
    Render {
        /// JSON report written by `analyze --json-out`
        #[arg(value_name = "REPORT_JSON")]
        report: PathBuf,

        /// Output PDF path
        #[arg(short, long, value_name = "PDF")]
        out: PathBuf,
    },

    /// List the report parsing rules in evaluation order
    Rules,

    /// List the keys in an API key file (masked)
    Keys {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts and CI
    Json,
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Parse {
            file,
            format,
            fail_on_violation,
            negative_slack_violates,
        } => handle_parse(&file, format, fail_on_violation, negative_slack_violates),
        Commands::Analyze {
            file,
            all,
            offline,
            config,
            key_file,
            key_id,
            concurrency,
            actor,
            json_out,
            pdf_out,
            format,
            negative_slack_violates,
        } => {
            let options = AnalysisOptions {
                violations_only: !all,
                concurrency,
                actor,
                treat_negative_slack_as_violation: negative_slack_violates,
            };
            let outputs = Outputs {
                json: json_out,
                pdf: pdf_out,
                format,
            };
            handle_analyze(&file, offline, config, key_file, key_id, options, outputs)
        }
        Commands::Render { report, out } => handle_render(&report, &out),
        Commands::Rules => {
            handle_rules();
            Ok(0)
        }
        Commands::Keys { file } => handle_keys(&file),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(exit_code);
}

fn handle_parse(
    file: &Path,
    format: OutputFormat,
    fail_on_violation: bool,
    negative_slack_violates: bool,
) -> Result<i32> {
    let options = AnalysisOptions {
        treat_negative_slack_as_violation: negative_slack_violates,
        ..AnalysisOptions::default()
    };
    let outcome = StaDebugCore::parse_file(file, &options)
        .with_context(|| format!("failed to read {}", file.display()))?;

    match format {
        OutputFormat::Human => output_paths_human(file, &outcome),
        OutputFormat::Json => output_paths_json(file, &outcome)?,
    }

    if fail_on_violation && outcome.violated_count() > 0 {
        return Ok(1);
    }
    Ok(0)
}

struct Outputs {
    json: Option<PathBuf>,
    pdf: Option<PathBuf>,
    format: OutputFormat,
}

fn handle_analyze(
    file: &Path,
    offline: bool,
    config: Option<PathBuf>,
    key_file: Option<PathBuf>,
    key_id: Option<String>,
    options: AnalysisOptions,
    outputs: Outputs,
) -> Result<i32> {
    let mut settings = match config {
        Some(path) => ClassifierSettings::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ClassifierSettings::default(),
    };
    if key_file.is_some() {
        settings.key_file = key_file;
    }
    if key_id.is_some() {
        settings.key_id = key_id;
    }

    let bytes = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let text = String::from_utf8_lossy(&bytes);

    let classifier = StaDebugCore::build_classifier(&settings, offline)?;
    let log = TracingActionLog;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let report = runtime.block_on(StaDebugCore::analyze_report(
        &text,
        classifier.as_ref(),
        &options,
        &log,
    ))?;

    if let Some(path) = &outputs.json {
        let json = StaDebugCore::export_json(&report, &options.actor, &log)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &outputs.pdf {
        let pdf = StaDebugCore::export_pdf(&report, &options.actor, &log)?;
        std::fs::write(path, pdf).with_context(|| format!("failed to write {}", path.display()))?;
    }

    match outputs.format {
        OutputFormat::Human => output_report_human(file, &report),
        OutputFormat::Json => print!("{}", String::from_utf8_lossy(&report.to_json()?)),
    }
    Ok(0)
}

fn handle_render(report_path: &Path, out: &Path) -> Result<i32> {
    let bytes = std::fs::read(report_path)
        .with_context(|| format!("failed to read {}", report_path.display()))?;
    let report = AnalysisReport::from_json(&bytes)
        .with_context(|| format!("{} is not a stadebug JSON report", report_path.display()))?;

    let log = TracingActionLog;
    let pdf = StaDebugCore::export_pdf(&report, "cli", &log)?;
    std::fs::write(out, pdf).with_context(|| format!("failed to write {}", out.display()))?;
    log.record("cli", "Render Saved Report", Some(serde_json::json!({ "source": report_path.display().to_string() })));

    println!("Wrote {} ({} violations)", out.display(), report.violations().count());
    Ok(0)
}

fn handle_rules() {
    println!("Report parsing rules (first match per line wins):\n");
    for (i, rule) in default_rules().iter().enumerate() {
        println!("  {}. {}", i + 1, rule.name);
    }
}

fn handle_keys(file: &Path) -> Result<i32> {
    let keys = JsonKeyFile::load(file).with_context(|| format!("failed to load {}", file.display()))?;
    if keys.entries().is_empty() {
        println!("No API keys found");
        return Ok(0);
    }
    for (id, label) in keys.labels() {
        println!("  {}  {}", id, label);
    }
    Ok(0)
}

fn output_paths_human(file: &Path, outcome: &ParseOutcome) {
    println!("\nFile: {}", file.display());
    println!("{}", "─".repeat(60));

    if outcome.paths.is_empty() {
        println!("  No timing paths found");
    }
    for path in &outcome.paths {
        let slack = path
            .slack
            .map(|s| format!("{:.3} ns", s))
            .unwrap_or_else(|| "N/A".to_string());
        println!("  [{}] {} -> {}", path.status, path.startpoint, path.endpoint);
        println!(
            "      slack {}  type {}  clock {}  stages {}",
            slack,
            or_dash(&path.path_type),
            or_dash(&path.clock),
            path.logic_depth()
        );
    }
    for diagnostic in &outcome.skipped {
        println!("  skipped {}", diagnostic);
    }

    let violated = outcome.violated_count();
    println!("\n  Summary:");
    println!("    Paths:    {}", outcome.paths.len());
    println!("    Violated: {}", violated);
    println!("    Met:      {}", outcome.paths.len() - violated);
    println!("    Skipped:  {}", outcome.skipped_blocks());
}

fn output_paths_json(file: &Path, outcome: &ParseOutcome) -> Result<()> {
    let violated = outcome.violated_count();
    let output = serde_json::json!({
        "file": file.display().to_string(),
        "paths": outcome.paths,
        "skipped": outcome.skipped.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
        "summary": {
            "total_paths": outcome.paths.len(),
            "violated": violated,
            "met": outcome.paths.len() - violated,
            "skipped_blocks": outcome.skipped_blocks(),
        }
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn output_report_human(file: &Path, report: &AnalysisReport) {
    println!("\nFile: {}", file.display());
    println!("{}", "─".repeat(60));

    if report.violations().next().is_none() {
        println!("  No timing violations found");
    }
    for record in report.violations() {
        print_record(record);
    }

    let summary = &report.summary;
    println!("\n  Summary:");
    println!("    Parsed:   {}", summary.parsed_paths);
    println!("    Analyzed: {}", summary.analyzed_paths);
    println!("    Violated: {}", summary.violated_paths);
    println!("    Met:      {}", summary.met_paths);
    for (severity, count) in &summary.by_severity {
        println!("    {:<9} {}", format!("{}:", severity), count);
    }
}

fn print_record(record: &AnalysisRecord) {
    let slack = record
        .slack
        .map(|s| format!("{:.3} ns", s))
        .unwrap_or_else(|| "N/A".to_string());
    println!(
        "\n  {} {} -> {} (slack {}, effort {})",
        record.severity.as_str().to_uppercase(),
        record.startpoint,
        record.endpoint,
        slack,
        record.estimated_effort
    );
    println!("    {}", record.root_cause);
    for (i, s) in record.suggestions.iter().enumerate() {
        println!("    {}. {} [{}]", i + 1, s.fix, s.priority);
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
