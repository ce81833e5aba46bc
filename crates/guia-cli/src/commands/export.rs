//! Export command - convert a reviewed CSV or spreadsheet.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use console::style;
use tracing::info;

use guia_core::export::{export_batch, read_batch, ExportFormat, QualityReport};

use super::load_config;

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Input file (.csv or .xlsx)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file
    #[arg(required = true)]
    output: PathBuf,

    /// Output format (default: from the output extension)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Also print a quality report
    #[arg(long)]
    quality: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    /// Styled Excel workbook
    Xlsx,
    /// Comma-separated values
    Csv,
    /// One text block per document
    Text,
    /// Completeness summary
    Quality,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xlsx => ExportFormat::Xlsx,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Text => ExportFormat::Text,
            FormatArg::Quality => ExportFormat::Quality,
        }
    }
}

pub async fn run(args: ExportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let format = match args.format {
        Some(format) => format.into(),
        None => ExportFormat::from_path(&args.output).ok_or_else(|| {
            anyhow::anyhow!(
                "Cannot infer format from {}; use --format",
                args.output.display()
            )
        })?,
    };

    let batch = read_batch(&args.input, &config.export)?;
    info!("Read {} records from {}", batch.len(), args.input.display());

    export_batch(&batch, &args.output, format, &config.export)?;

    println!(
        "{} Exported {} records to {}",
        style("✓").green(),
        batch.len(),
        args.output.display()
    );

    if args.quality {
        println!();
        print!("{}", QualityReport::from_batch(&batch));
    }

    Ok(())
}
