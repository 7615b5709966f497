//! Process command - import a single invoice file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use ordertrack_core::{
    ErrorCode, ExtractionError, Field, ImportLedger, ImportReport, InvoiceData, InvoiceParser,
    TrackConfig,
};

use super::config::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, or text already extracted from a PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// How field failures are reported
    #[arg(short, long, value_enum, default_value = "fail-fast")]
    mode: ExtractionMode,

    /// Accept invoices without a store line
    #[arg(long)]
    allow_missing_store: bool,

    /// Print the French message for error codes
    #[arg(long)]
    explain: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ExtractionMode {
    /// Stop at the first missing field and report its code
    FailFast,
    /// Report every missing field at once
    CollectAll,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let parser = build_parser(&config, args.allow_missing_store)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Extracting invoice data...");

    let report = match parse_file(&parser, &args.input, args.mode)? {
        Ok(invoice) => ImportLedger::new().import(invoice),
        Err(report) => report,
    };

    pb.finish_and_clear();

    let output = format_report(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    if report.is_error() {
        if args.explain {
            print_explanations(&report);
        }
        anyhow::bail!("Invoice import failed: {}", describe_errors(&report));
    }

    Ok(())
}

/// Build a parser from configuration and command-line overrides.
pub fn build_parser(config: &TrackConfig, allow_missing_store: bool) -> anyhow::Result<InvoiceParser> {
    let parser = InvoiceParser::from_config(config)?;
    if allow_missing_store {
        Ok(parser.with_require_store(false))
    } else {
        Ok(parser)
    }
}

/// Parse one file, returning the invoice or an error report.
///
/// `.txt` files are taken as already-extracted text; anything else goes
/// through the PDF backends. I/O problems are returned as `Err`.
pub fn parse_file(
    parser: &InvoiceParser,
    path: &Path,
    mode: ExtractionMode,
) -> anyhow::Result<Result<InvoiceData, ImportReport>> {
    let is_text = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));

    let data = fs::read(path)?;
    let text = if is_text {
        String::from_utf8(data)?
    } else {
        match parser.extract_text(&data) {
            Ok(text) => text,
            Err(e) => return Ok(Err(ImportReport::from_error(&ExtractionError::from(e)))),
        }
    };

    let parsed = match mode {
        ExtractionMode::FailFast => parser
            .parse(&text)
            .map_err(|e| ImportReport::from_error(&e)),
        ExtractionMode::CollectAll => {
            let outcome = parser.parse_collect_all(&text);
            match outcome.invoice() {
                Some(invoice) => Ok(invoice.clone()),
                None => Err(ImportReport::from_field_errors(&outcome.errors())),
            }
        }
    };

    Ok(parsed)
}

/// One-line summary of a failed report.
pub fn describe_errors(report: &ImportReport) -> String {
    report
        .errors
        .as_ref()
        .map(|errors| {
            errors
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

fn print_explanations(report: &ImportReport) {
    for code in error_codes(report) {
        eprintln!("{} {}: {}", style("✗").red(), code, code.user_message());
    }
}

/// Stable codes behind a failed report, whichever mode produced it.
pub fn error_codes(report: &ImportReport) -> Vec<ErrorCode> {
    let Some(errors) = &report.errors else {
        return Vec::new();
    };

    let mut codes: Vec<ErrorCode> = errors
        .get("code")
        .and_then(|code| serde_json::from_value(serde_json::Value::String(code.clone())).ok())
        .into_iter()
        .collect();

    codes.extend(
        Field::ALL
            .iter()
            .filter(|field| errors.contains_key(field.name()))
            .map(Field::error_code),
    );

    codes
}

pub fn format_report(report: &ImportReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

pub const CSV_HEADER: [&str; 7] = [
    "status",
    "invoice_number",
    "sold_at",
    "store",
    "client_name",
    "product_name",
    "errors",
];

/// CSV columns for one report, matching [`CSV_HEADER`].
pub fn csv_record(report: &ImportReport) -> anyhow::Result<Vec<String>> {
    let status = serde_json::to_value(report.status)?
        .as_str()
        .unwrap_or_default()
        .to_string();

    let record = match &report.order {
        Some(order) => vec![
            status,
            order.invoice_number.clone(),
            order.sold_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            order.store.clone().unwrap_or_default(),
            order.client_name.clone(),
            order.product_name.clone(),
            String::new(),
        ],
        None => vec![
            status,
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            describe_errors(report),
        ],
    };

    Ok(record)
}

fn format_csv(report: &ImportReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_HEADER)?;
    wtr.write_record(csv_record(report)?)?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &ImportReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("Status: {:?}\n", report.status));

    if let Some(order) = &report.order {
        output.push_str(&format!("Invoice: {}\n", order.invoice_number));
        output.push_str(&format!("Sold at: {}\n", order.sold_at));
        output.push_str(&format!("Store: {}\n", order.store.as_deref().unwrap_or("-")));
        output.push_str(&format!("Client: {}\n", order.client_name));
        output.push_str(&format!("Product: {}\n", order.product_name));
    }

    if let Some(errors) = &report.errors {
        output.push_str("Errors:\n");
        for (key, value) in errors {
            output.push_str(&format!("  {}: {}\n", key, value));
        }
    }

    output
}
