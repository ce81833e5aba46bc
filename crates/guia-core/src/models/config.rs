//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::error::GuiaError;
use crate::guide::rules::PatternConfig;
use crate::guide::ExtractionStrategy;
use crate::ocr::PageSegMode;

/// Main configuration for the guia pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiaConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Image preparation before OCR.
    pub preprocess: PreprocessConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Spreadsheet styling.
    pub export: ExportStyle,
}

/// What to do when the OCR engine cannot be reached at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineUnavailablePolicy {
    /// Report and keep going; documents needing OCR fail individually.
    #[default]
    Warn,
    /// Refuse to start the run.
    Halt,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract executable.
    pub tesseract_path: String,

    /// Language/dictionary code.
    pub language: String,

    /// Page segmentation mode.
    pub page_segmentation: PageSegMode,

    /// Minimum word confidence (0 - 100) kept in structured mode.
    pub min_confidence: f32,

    /// Startup behaviour when the engine is missing.
    pub on_unavailable: EngineUnavailablePolicy,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            language: "por".to_string(),
            page_segmentation: PageSegMode::SingleBlock,
            min_confidence: 30.0,
            on_unavailable: EngineUnavailablePolicy::Warn,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rasterizing PDF pages.
    pub render_dpi: u32,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,

    /// Use embedded text when every page has enough of it.
    pub prefer_embedded_text: bool,

    /// Minimum characters per page to treat the PDF as digital.
    pub min_text_length: usize,

    /// `pdftoppm` executable used to render pages; empty renders embedded
    /// page images only.
    pub renderer_path: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            max_pages: 0,
            prefer_embedded_text: true,
            min_text_length: 50,
            renderer_path: "pdftoppm".to_string(),
        }
    }
}

/// Image preparation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Contrast gain factor.
    pub contrast_gain: f32,

    /// Apply a sharpen convolution.
    pub sharpen: bool,

    /// Apply fixed-threshold binarization.
    pub binarize: bool,

    /// Luminance cutoff used when binarizing.
    pub binarize_threshold: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            contrast_gain: 2.0,
            sharpen: true,
            binarize: false,
            binarize_threshold: 140,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Regex over text or spatial search over words.
    pub strategy: ExtractionStrategy,

    /// Ordered regex patterns per field.
    pub patterns: PatternConfig,

    /// Spatial search settings.
    pub spatial: SpatialConfig,

    /// When the spatial search misses a field, try the regex patterns on the
    /// words joined as text.
    pub spatial_regex_fallback: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategy: ExtractionStrategy::Regex,
            patterns: PatternConfig::default(),
            spatial: SpatialConfig::default(),
            spatial_regex_fallback: true,
        }
    }
}

/// Label patterns and search widths for the spatial strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Longest run of words tried when matching a label.
    pub max_label_words: usize,

    /// Maximum horizontal distance (px) from the label, per field.
    pub guide_number_distance: f32,
    pub registry_id_distance: f32,
    pub authorization_date_distance: f32,
    pub beneficiary_name_distance: f32,

    /// Anchored label patterns, per field.
    pub guide_number_label: String,
    pub registry_id_label: String,
    pub authorization_date_label: String,
    pub beneficiary_name_label: String,

    /// A Name label followed by a word matching this belongs to the decoy
    /// field or to another party's name.
    pub beneficiary_name_reject_next: String,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            max_label_words: 4,
            guide_number_distance: 300.0,
            registry_id_distance: 200.0,
            authorization_date_distance: 250.0,
            beneficiary_name_distance: 600.0,
            guide_number_label:
                r"^(?:N[º°o]?\.?\s*(?:da\s*)?Guia|N[úu]mero\s*(?:da\s*)?Guia)(?:\s*(?:no|do)\s*Prestador)?:?$"
                    .to_string(),
            registry_id_label: r"^Registro\s*(?:da\s*)?ANS:?$".to_string(),
            authorization_date_label: r"^Data\s*(?:da|de)?\s*Autoriza[çc][ãa]o:?$".to_string(),
            beneficiary_name_label:
                r"^(?:Nome(?:\s*do\s*Benefici[áa]rio)?|Benefici[áa]rio):?$".to_string(),
            beneficiary_name_reject_next: r"^(?:social|d[oa]$)".to_string(),
        }
    }
}

/// Spreadsheet styling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportStyle {
    /// Worksheet name.
    pub sheet_name: String,

    /// Header background colour (`#RRGGBB`).
    pub header_background: String,

    /// Header font colour (`#RRGGBB`).
    pub header_font_color: String,

    /// Bold header text.
    pub header_bold: bool,

    /// Thin border around header cells.
    pub header_border: bool,

    /// Characters added to the widest cell of each column.
    pub column_padding: usize,
}

impl Default for ExportStyle {
    fn default() -> Self {
        Self {
            sheet_name: "Guias".to_string(),
            header_background: "#2E8B57".to_string(),
            header_font_color: "#FFFFFF".to_string(),
            header_bold: true,
            header_border: true,
            column_padding: 2,
        }
    }
}

/// Parse a `#RRGGBB` colour into its 24-bit value.
pub fn parse_hex_color(color: &str) -> Result<u32, GuiaError> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return Err(GuiaError::Config(format!("invalid colour '{}'", color)));
    }
    u32::from_str_radix(hex, 16).map_err(|_| GuiaError::Config(format!("invalid colour '{}'", color)))
}

impl GuiaConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: GuiaConfig =
            serde_json::from_str(r#"{"ocr": {"page_segmentation": "auto"}, "preprocess": {"binarize": true}}"#)
                .unwrap();

        assert_eq!(config.ocr.page_segmentation, PageSegMode::Auto);
        assert_eq!(config.ocr.language, "por");
        assert!(config.preprocess.binarize);
        assert_eq!(config.preprocess.contrast_gain, 2.0);
        assert_eq!(config.pdf.render_dpi, 300);
        assert_eq!(config.pdf.renderer_path, "pdftoppm");
        assert_eq!(config.ocr.on_unavailable, EngineUnavailablePolicy::Warn);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = GuiaConfig::default();
        config.extraction.strategy = ExtractionStrategy::Spatial;
        config.save(&path).unwrap();

        let loaded = GuiaConfig::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.strategy, ExtractionStrategy::Spatial);
        assert_eq!(loaded.export.header_background, "#2E8B57");
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#2E8B57").unwrap(), 0x2E8B57);
        assert_eq!(parse_hex_color("ffffff").unwrap(), 0xFFFFFF);
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#GGGGGG").is_err());
    }
}
