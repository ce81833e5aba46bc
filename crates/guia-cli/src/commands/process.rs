//! Process command - extract fields from a single guide.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use guia_core::export::{text_report, to_csv_string};
use guia_core::{CancellationFlag, Document, ExtractionBatch, ExtractionRecord, ProgressUpdate};

use super::{build_orchestrator, load_config, status_glyph, PipelineArgs};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, PNG, JPG or JPEG)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print the acquired text
    #[arg(long)]
    debug_text: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
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

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.pipeline.apply(&mut config);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());
    let document = Document::from_path(&args.input)?;
    let orchestrator = build_orchestrator(&config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Reading {}...", document.name));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let (batch, raw_text) = tokio::task::spawn_blocking(move || {
        let raw_text = RefCell::new(None);
        let capture = |update: &ProgressUpdate| {
            *raw_text.borrow_mut() = update.raw_text.clone();
        };
        let batch = orchestrator.run(
            std::slice::from_ref(&document),
            ExtractionBatch::new(),
            &capture,
            &CancellationFlag::new(),
        );
        (batch, raw_text.into_inner())
    })
    .await?;

    let record = batch
        .records
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No record produced for {}", args.input.display()))?;

    pb.finish_and_clear();

    if args.debug_text {
        if let Some(text) = &raw_text {
            eprintln!("{}", style("Acquired text:").bold());
            eprintln!("{}", text);
            eprintln!();
        }
    }

    let output = format_record(&record, args.format)?;

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

    eprintln!(
        "{} {}: {}",
        status_glyph(record.status()),
        record.document,
        record.status()
    );
    if let Some(error) = &record.error {
        eprintln!("  {}", style(error).red());
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_record(record: &ExtractionRecord, format: OutputFormat) -> anyhow::Result<String> {
    let batch: ExtractionBatch = std::iter::once(record.clone()).collect();
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(record)?,
        OutputFormat::Csv => to_csv_string(&batch)?,
        OutputFormat::Text => text_report(&batch).trim_end().to_string(),
    })
}
