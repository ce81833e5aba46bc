//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod export;
pub mod process;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, ValueEnum};
use console::style;
use tracing::debug;

use guia_core::guide::ExtractionStrategy;
use guia_core::models::config::GuiaConfig;
use guia_core::ocr::PageSegMode;
use guia_core::{BatchOrchestrator, RecordStatus, TesseractCli};

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("guia")
        .join("config.json")
}

/// Load `--config`, else the default file when present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<GuiaConfig> {
    if let Some(path) = config_path {
        return Ok(GuiaConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config from {}", default_path.display());
        Ok(GuiaConfig::from_file(&default_path)?)
    } else {
        Ok(GuiaConfig::default())
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StrategyArg {
    /// Regex patterns over plain OCR text
    Regex,
    /// Label geometry over positioned OCR words
    Spatial,
}

impl From<StrategyArg> for ExtractionStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Regex => ExtractionStrategy::Regex,
            StrategyArg::Spatial => ExtractionStrategy::Spatial,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PsmArg {
    Auto,
    SingleColumn,
    SingleBlock,
    SparseText,
}

impl From<PsmArg> for PageSegMode {
    fn from(arg: PsmArg) -> Self {
        match arg {
            PsmArg::Auto => PageSegMode::Auto,
            PsmArg::SingleColumn => PageSegMode::SingleColumn,
            PsmArg::SingleBlock => PageSegMode::SingleBlock,
            PsmArg::SparseText => PageSegMode::SparseText,
        }
    }
}

/// Pipeline overrides shared by `process` and `batch`.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Extraction strategy
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// OCR language code
    #[arg(long)]
    lang: Option<String>,

    /// Page segmentation mode
    #[arg(long, value_enum)]
    psm: Option<PsmArg>,

    /// Tesseract executable
    #[arg(long)]
    tesseract: Option<String>,

    /// Binarize images before OCR
    #[arg(long)]
    binarize: bool,

    /// Always OCR PDFs, ignoring embedded text
    #[arg(long)]
    force_ocr: bool,
}

impl PipelineArgs {
    pub fn apply(&self, config: &mut GuiaConfig) {
        if let Some(strategy) = self.strategy {
            config.extraction.strategy = strategy.into();
        }
        if let Some(lang) = &self.lang {
            config.ocr.language = lang.clone();
        }
        if let Some(psm) = self.psm {
            config.ocr.page_segmentation = psm.into();
        }
        if let Some(tesseract) = &self.tesseract {
            config.ocr.tesseract_path = tesseract.clone();
        }
        if self.binarize {
            config.preprocess.binarize = true;
        }
        if self.force_ocr {
            config.pdf.prefer_embedded_text = false;
        }
    }
}

/// Build the orchestrator and run the startup engine check.
pub fn build_orchestrator(config: &GuiaConfig) -> anyhow::Result<BatchOrchestrator> {
    let backend = TesseractCli::new().with_program(&config.ocr.tesseract_path);
    let orchestrator = BatchOrchestrator::from_config(config, Arc::new(backend))?;

    if orchestrator.check_engine()?.is_none() {
        eprintln!(
            "{} OCR engine not available; scanned documents will be marked as errors",
            style("⚠").yellow()
        );
    }
    Ok(orchestrator)
}

/// Coloured glyph for a record status.
pub fn status_glyph(status: RecordStatus) -> console::StyledObject<&'static str> {
    match status {
        RecordStatus::Complete => style("✓").green(),
        RecordStatus::Partial => style("◐").yellow(),
        RecordStatus::Empty => style("○").yellow(),
        RecordStatus::Failed => style("✗").red(),
    }
}
