//! typescope CLI - Command-line interface for the authorship analysis engine
//!
//! Commands:
//! - analyze: Score editor event records (batch mode)
//! - validate: Check every row of the input records
//! - summary: Describe activity without scoring it
//! - templates: Render every message template with its example arguments

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use typescope::messages::{MessageRenderer, MESSAGES};
use typescope::normalizer::EventNormalizer;
use typescope::risk::FileRiskAnalyzer;
use typescope::summary::ActivitySummarizer;
use typescope::types::{EventSummary, FileSummary, TimelineEntry, WorkSessionSummary};
use typescope::{
    analyze, analyze_with_deadline, AnalysisError, AnalysisProcessor, Catalogue, CompactRecord,
    WireAdapter, ENGINE_VERSION, WIRE_SCHEMA,
};

/// Environment variable holding the log filter
const LOG_ENV: &str = "TYPESCOPE_LOG";

/// typescope - Authorship analysis for editor activity logs
#[derive(Parser)]
#[command(name = "typescope")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score editor activity logs for signs of pasted or generated code", long_about = None)]
struct Cli {
    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze records and emit authenticity reports
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Emit bare analysis results instead of report envelopes
        #[arg(long)]
        bare: bool,

        /// Abort any single analysis that runs longer than this
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Validate every row of the input records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize sessions, files and timeline without scoring
    Summary {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Render every message template with its example arguments
    Templates {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// A single JSON record
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one result per line)
    Ndjson,
    /// JSON array of results
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("typescope=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), TypescopeCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            input_format,
            output_format,
            bare,
            timeout_secs,
        } => cmd_analyze(
            &input,
            &output,
            input_format,
            output_format,
            bare,
            timeout_secs.map(Duration::from_secs),
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Summary {
            input,
            output,
            input_format,
            output_format,
        } => cmd_summary(&input, &output, input_format, output_format),

        Commands::Templates { json } => cmd_templates(json),
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    bare: bool,
    deadline: Option<Duration>,
) -> Result<(), TypescopeCliError> {
    let records = read_records(input, &input_format)?;

    let output_data = if bare {
        let results = records
            .into_iter()
            .map(|record| match deadline {
                Some(deadline) => analyze_with_deadline(record, deadline),
                None => analyze(&record),
            })
            .collect::<Result<Vec<_>, _>>()?;
        format_output(&results, &output_format)?
    } else {
        let processor = match deadline {
            Some(deadline) => AnalysisProcessor::new().with_deadline(deadline),
            None => AnalysisProcessor::new(),
        };
        let reports = records
            .into_iter()
            .map(|record| processor.process_record(record))
            .collect::<Result<Vec<_>, _>>()?;
        format_output(&reports, &output_format)?
    };

    write_output(output, &output_data)
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), TypescopeCliError> {
    let records = read_records(input, &input_format)?;

    let errors: Vec<ValidationErrorDetail> = records
        .iter()
        .enumerate()
        .flat_map(|(record, r)| {
            WireAdapter::validate_record(r)
                .into_iter()
                .map(move |v| ValidationErrorDetail {
                    record,
                    index: v.index,
                    error: v.reason,
                })
        })
        .collect();

    let total_rows: usize = records.iter().map(CompactRecord::len).sum();
    let report = ValidationReport {
        schema: WIRE_SCHEMA.to_string(),
        total_records: records.len(),
        total_rows,
        valid_rows: total_rows - errors.len(),
        invalid_rows: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report ({})", report.schema);
        println!("=================");
        println!("Records:      {}", report.total_records);
        println!("Total rows:   {}", report.total_rows);
        println!("Valid rows:   {}", report.valid_rows);
        println!("Invalid rows: {}", report.invalid_rows);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Record {} row {}: {}", err.record, err.index, err.error);
            }
        }
    }

    if report.invalid_rows > 0 {
        Err(TypescopeCliError::ValidationFailed(report.invalid_rows))
    } else {
        Ok(())
    }
}

fn cmd_summary(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
) -> Result<(), TypescopeCliError> {
    let records = read_records(input, &input_format)?;

    let summaries = records
        .iter()
        .map(|record| -> Result<SummaryOutput, AnalysisError> {
            let log = EventNormalizer::normalize(record)?;
            let risks = FileRiskAnalyzer::analyze(&log, &Catalogue);
            Ok(SummaryOutput {
                summary: ActivitySummarizer::summarize(&log),
                sessions: ActivitySummarizer::sessions(&log),
                files: ActivitySummarizer::files(&log, &risks),
                timeline: ActivitySummarizer::timeline(&log, &Catalogue),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let output_data = format_output(&summaries, &output_format)?;
    write_output(output, &output_data)
}

fn cmd_templates(json: bool) -> Result<(), TypescopeCliError> {
    let rendered: Vec<RenderedTemplate> = MESSAGES
        .iter()
        .map(|entry| {
            let args = entry.example_args();
            let (text, ok) = match Catalogue.render(entry.key, &args) {
                Ok(text) => (text, true),
                Err(_) => (Catalogue.render_or_fallback(entry.key, &args), false),
            };
            RenderedTemplate {
                key: entry.key,
                severity: entry.severity.as_str(),
                category: entry.category,
                rendered: text,
                ok,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        for t in &rendered {
            let status = if t.ok { "[OK]" } else { "[DEGRADED]" };
            println!("{} {} ({}/{}): {}", status, t.key, t.severity, t.category, t.rendered);
        }
    }

    let degraded = rendered.iter().filter(|t| !t.ok).count();
    if degraded > 0 {
        Err(TypescopeCliError::TemplatesDegraded(degraded))
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, TypescopeCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(TypescopeCliError::InteractiveStdin);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_records(
    input: &Path,
    format: &InputFormat,
) -> Result<Vec<CompactRecord>, TypescopeCliError> {
    let input_data = read_input(input)?;
    let records = match format {
        InputFormat::Json => vec![WireAdapter::parse_record(&input_data)?],
        InputFormat::Ndjson => WireAdapter::parse_ndjson(&input_data)?,
    };

    if records.is_empty() {
        return Err(TypescopeCliError::NoRecords);
    }
    tracing::debug!(records = records.len(), "read input records");
    Ok(records)
}

fn write_output(output: &Path, data: &str) -> Result<(), TypescopeCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn format_output<T: Serialize>(
    outputs: &[T],
    format: &OutputFormat,
) -> Result<String, TypescopeCliError> {
    match format {
        OutputFormat::Ndjson => {
            let lines = outputs
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(outputs)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(outputs)?),
    }
}

// Error types

#[derive(Debug)]
enum TypescopeCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    InteractiveStdin,
    NoRecords,
    ValidationFailed(usize),
    TemplatesDegraded(usize),
}

impl From<io::Error> for TypescopeCliError {
    fn from(e: io::Error) -> Self {
        TypescopeCliError::Io(e)
    }
}

impl From<AnalysisError> for TypescopeCliError {
    fn from(e: AnalysisError) -> Self {
        TypescopeCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for TypescopeCliError {
    fn from(e: serde_json::Error) -> Self {
        TypescopeCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TypescopeCliError> for CliError {
    fn from(e: TypescopeCliError) -> Self {
        match e {
            TypescopeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TypescopeCliError::Analysis(AnalysisError::Timeout(d)) => CliError {
                code: "TIMEOUT".to_string(),
                message: format!("Analysis exceeded deadline of {}s", d.as_secs()),
                hint: Some("Raise --timeout-secs or split the record".to_string()),
            },
            TypescopeCliError::Analysis(e @ AnalysisError::MalformedEvent { .. }) => CliError {
                code: "MALFORMED_EVENT".to_string(),
                message: e.to_string(),
                hint: Some("Run 'typescope validate' for details".to_string()),
            },
            TypescopeCliError::Analysis(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!("Ensure input matches the {} schema", WIRE_SCHEMA)),
            },
            TypescopeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TypescopeCliError::InteractiveStdin => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal, not a record stream".to_string(),
                hint: Some("Pipe a record in or pass --input <file>".to_string()),
            },
            TypescopeCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            TypescopeCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} rows failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            TypescopeCliError::TemplatesDegraded(count) => CliError {
                code: "TEMPLATES_DEGRADED".to_string(),
                message: format!("{} message templates failed to render", count),
                hint: Some("Check placeholder names against example arguments".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct ValidationReport {
    schema: String,
    total_records: usize,
    total_rows: usize,
    valid_rows: usize,
    invalid_rows: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    record: usize,
    index: usize,
    error: String,
}

#[derive(Serialize)]
struct SummaryOutput {
    summary: EventSummary,
    sessions: Vec<WorkSessionSummary>,
    files: BTreeMap<String, FileSummary>,
    timeline: Vec<TimelineEntry>,
}

#[derive(Serialize)]
struct RenderedTemplate {
    key: &'static str,
    severity: &'static str,
    category: &'static str,
    rendered: String,
    ok: bool,
}
