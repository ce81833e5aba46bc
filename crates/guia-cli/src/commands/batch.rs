//! Batch command - process many guides into one export.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use guia_core::export::{default_file_name, export_batch, ExportFormat, QualityReport};
use guia_core::{CancellationFlag, Document, ExtractionBatch, ProgressUpdate, RecordStatus};

use super::export::FormatArg;
use super::{build_orchestrator, load_config, status_glyph, PipelineArgs};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output file (default: guias_medicas_<YYYYMMDD>.<ext> in the output directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output directory for the default file name
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,

    /// Output format (default: from the output extension, else xlsx)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Print a quality report after processing
    #[arg(long)]
    quality: bool,

    /// Print the acquired text of every document
    #[arg(long)]
    debug_text: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.pipeline.apply(&mut config);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    // Unreadable files become failed records in place
    let documents: Vec<Document> = files.iter().map(|path| Document::load(path)).collect();

    let format = match (args.format, &args.output) {
        (Some(format), _) => format.into(),
        (None, Some(path)) => ExportFormat::from_path(path).unwrap_or(ExportFormat::Xlsx),
        (None, None) => ExportFormat::Xlsx,
    };
    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => {
            let name = default_file_name(chrono::Local::now().date_naive(), format);
            args.output_dir
                .as_ref()
                .map(|dir| dir.join(&name))
                .unwrap_or_else(|| PathBuf::from(&name))
        }
    };
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let orchestrator = build_orchestrator(&config)?;

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let cancel = CancellationFlag::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current document");
            on_ctrl_c.cancel();
        }
    });

    let progress_bar = pb.clone();
    let debug_text = args.debug_text;
    let batch = tokio::task::spawn_blocking(move || {
        let sink = |update: &ProgressUpdate| {
            let mut line = format!("{} {}", status_glyph(update.status), update.document);
            if let Some(error) = &update.error {
                line.push_str(&format!(": {}", style(error).red()));
            }
            progress_bar.println(line);
            if debug_text {
                if let Some(text) = &update.raw_text {
                    progress_bar.println(format!("{}\n", style(text).dim()));
                }
            }
            progress_bar.set_message(update.document.clone());
            progress_bar.inc(1);
        };
        orchestrator.run(&documents, ExtractionBatch::new(), &sink, &cancel)
    })
    .await?;

    pb.finish_and_clear();

    export_batch(&batch, &output_path, format, &config.export)?;
    debug!("Wrote {} records to {}", batch.len(), output_path.display());

    let count = |status: RecordStatus| batch.iter().filter(|r| r.status() == status).count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        batch.len(),
        start.elapsed()
    );
    println!(
        "   {} complete, {} partial, {} without data, {} failed",
        style(count(RecordStatus::Complete)).green(),
        style(count(RecordStatus::Partial)).yellow(),
        style(count(RecordStatus::Empty)).yellow(),
        style(count(RecordStatus::Failed)).red()
    );
    if batch.cancelled {
        println!(
            "{} Cancelled: {} of {} documents processed",
            style("⚠").yellow(),
            batch.len(),
            files.len()
        );
    }
    println!(
        "{} Results written to {}",
        style("✓").green(),
        output_path.display()
    );

    if args.quality {
        println!();
        print!("{}", QualityReport::from_batch(&batch));
    }

    Ok(())
}
