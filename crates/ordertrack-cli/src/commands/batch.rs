//! Batch processing command for multiple invoice files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use ordertrack_core::{ImportLedger, ImportReport, ImportStatus, InvoiceData, InvoiceParser};

use super::config::load_config;
use super::process::{
    build_parser, csv_record, describe_errors, format_report, parse_file, ExtractionMode,
    OutputFormat, CSV_HEADER,
};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// How field failures are reported
    #[arg(short, long, value_enum, default_value = "fail-fast")]
    mode: ExtractionMode,

    /// Accept invoices without a store line
    #[arg(long)]
    allow_missing_store: bool,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    report: Option<ImportReport>,
    error: Option<String>,
    processing_time_ms: u64,
}

impl ProcessResult {
    fn failed(&self) -> bool {
        self.report.as_ref().is_none_or(ImportReport::is_error)
    }

    fn failure_reason(&self) -> String {
        match (&self.report, &self.error) {
            (_, Some(error)) => error.clone(),
            (Some(report), None) => describe_errors(report),
            (None, None) => "unknown error".to_string(),
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let parser = Arc::new(build_parser(&config, args.allow_missing_store)?);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // Extraction runs in parallel; imports are applied in input order so
    // duplicate detection does not depend on scheduling.
    let parsed = parse_all(parser, files, args.mode, args.jobs.max(1), &overall_pb).await?;
    overall_pb.finish_and_clear();

    let mut ledger = ImportLedger::new();
    let mut results = Vec::with_capacity(parsed.len());

    for (path, outcome, processing_time_ms) in parsed {
        let result = match outcome {
            Ok(Ok(invoice)) => ProcessResult {
                path,
                report: Some(ledger.import(invoice)),
                error: None,
                processing_time_ms,
            },
            Ok(Err(report)) => ProcessResult {
                path,
                report: Some(report),
                error: None,
                processing_time_ms,
            },
            Err(e) => ProcessResult {
                path,
                report: None,
                error: Some(e.to_string()),
                processing_time_ms,
            },
        };

        if result.failed() {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), result.failure_reason());
            } else {
                error!("Failed to process {}: {}", result.path.display(), result.failure_reason());
                anyhow::bail!("Processing failed: {}", result.failure_reason());
            }
        }

        results.push(result);
    }

    if let Some(ref output_dir) = args.output_dir {
        for result in &results {
            let Some(report) = &result.report else {
                continue;
            };

            let output_path = output_dir.join(output_file_name(&result.path, args.format));

            fs::write(&output_path, format_report(report, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let count = |status: ImportStatus| {
        results
            .iter()
            .filter(|r| r.report.as_ref().is_some_and(|rep| rep.status == status))
            .count()
    };
    let failed: Vec<&ProcessResult> = results.iter().filter(|r| r.failed()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} created, {} already imported, {} failed",
        style(count(ImportStatus::Created)).green(),
        style(count(ImportStatus::AlreadyExists)).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!("  - {}: {}", result.path.display(), result.failure_reason());
        }
    }

    Ok(())
}

/// Output name for one input, keeping its extension so `a.pdf` and `a.txt`
/// do not overwrite each other.
fn output_file_name(input: &Path, format: OutputFormat) -> String {
    let file_name = input.file_name().and_then(|s| s.to_str()).unwrap_or("output");
    let extension = match format {
        OutputFormat::Json => "json",
        OutputFormat::Csv => "csv",
        OutputFormat::Text => "txt",
    };
    format!("{}.{}", file_name, extension)
}

type Parsed = anyhow::Result<Result<InvoiceData, ImportReport>>;

/// Parse every file on blocking workers, at most `jobs` at a time.
///
/// Results come back in input order.
async fn parse_all(
    parser: Arc<InvoiceParser>,
    files: Vec<PathBuf>,
    mode: ExtractionMode,
    jobs: usize,
    pb: &ProgressBar,
) -> anyhow::Result<Vec<(PathBuf, Parsed, u64)>> {
    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let permit = semaphore.clone().acquire_owned().await?;
        let parser = parser.clone();
        let pb = pb.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            let file_start = Instant::now();
            let outcome = parse_file(&parser, &path, mode);
            let elapsed = file_start.elapsed().as_millis() as u64;
            pb.inc(1);
            drop(permit);
            (path, outcome, elapsed)
        }));
    }

    let mut parsed = Vec::with_capacity(handles.len());
    for handle in handles {
        parsed.push(handle.await?);
    }

    Ok(parsed)
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename"];
    header.extend(CSV_HEADER);
    header.push("processing_time_ms");
    wtr.write_record(&header)?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        let mut record = vec![filename];
        match &result.report {
            Some(report) => record.extend(csv_record(report)?),
            None => {
                record.push("error".to_string());
                record.extend(std::iter::repeat_n(String::new(), CSV_HEADER.len() - 2));
                record.push(result.failure_reason());
            }
        }
        record.push(result.processing_time_ms.to_string());

        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names_differ_by_input_extension() {
        let pdf = output_file_name(Path::new("in/a.pdf"), OutputFormat::Json);
        let txt = output_file_name(Path::new("in/a.txt"), OutputFormat::Json);
        assert_eq!(pdf, "a.pdf.json");
        assert_eq!(txt, "a.txt.json");
        assert_eq!(output_file_name(Path::new("a.txt"), OutputFormat::Text), "a.txt.txt");
    }
}
