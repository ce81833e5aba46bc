//! OCR pipeline: image preparation, engine backends and text acquisition.

mod acquirer;
mod preprocessing;
mod tesseract;

pub use acquirer::{filter_words, TextAcquirer};
pub use preprocessing::ImagePreparer;
pub use tesseract::{parse_tsv, TesseractCli};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// A word recognized by structured OCR, in pixels of the rasterized page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedWord {
    /// Recognized token.
    pub text: String,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// Engine confidence (0 - 100).
    pub confidence: f32,
}

impl RecognizedWord {
    pub fn new(text: impl Into<String>, left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            text: text.into(),
            left,
            top,
            width,
            height,
            confidence: 100.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Right edge (left + width).
    pub fn right(&self) -> f32 {
        (self.left + self.width) as f32
    }

    pub fn bottom(&self) -> f32 {
        (self.top + self.height) as f32
    }

    /// Vertical centre of the box.
    pub fn center_y(&self) -> f32 {
        self.top as f32 + self.height as f32 / 2.0
    }
}

/// Page segmentation mode passed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSegMode {
    /// Fully automatic page segmentation.
    Auto,
    /// Single column of text of variable sizes.
    SingleColumn,
    /// Single uniform block of text.
    SingleBlock,
    /// As much text as possible, in no particular order.
    SparseText,
}

impl PageSegMode {
    /// Numeric code understood by Tesseract's `--psm`.
    pub fn code(&self) -> u8 {
        match self {
            PageSegMode::Auto => 3,
            PageSegMode::SingleColumn => 4,
            PageSegMode::SingleBlock => 6,
            PageSegMode::SparseText => 11,
        }
    }
}

impl Default for PageSegMode {
    fn default() -> Self {
        Self::SingleBlock
    }
}

/// Whether the engine returns a text blob or positioned words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrMode {
    PlainText,
    Structured,
}

/// Per-call engine options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOptions {
    /// Language/dictionary code (e.g. `por`).
    pub language: String,
    pub psm: PageSegMode,
    /// Resolution hint for the engine.
    pub dpi: Option<u32>,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: "por".to_string(),
            psm: PageSegMode::default(),
            dpi: Some(300),
        }
    }
}

/// Text acquired for one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageText {
    /// Plain text (native PDF text or plain-text OCR).
    Plain(String),
    /// Structured OCR words in engine order.
    Words(Vec<RecognizedWord>),
}

impl PageText {
    /// Flatten to text; words are joined with spaces in engine order.
    pub fn to_text(&self) -> String {
        match self {
            PageText::Plain(text) => text.clone(),
            PageText::Words(words) => words
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// An OCR capability.
pub trait OcrBackend: Send + Sync {
    /// Human-readable engine name.
    fn name(&self) -> &str;

    /// Verify the engine can be invoked; returns its version string.
    fn check(&self) -> Result<String, OcrError>;

    /// Recognize a page as a single text blob.
    fn recognize_text(&self, image: &DynamicImage, options: &OcrOptions) -> Result<String, OcrError>;

    /// Recognize a page as positioned words.
    fn recognize_words(
        &self,
        image: &DynamicImage,
        options: &OcrOptions,
    ) -> Result<Vec<RecognizedWord>, OcrError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_geometry() {
        let word = RecognizedWord::new("Nome", 100, 50, 80, 20);
        assert_eq!(word.right(), 180.0);
        assert_eq!(word.center_y(), 60.0);
        assert_eq!(word.bottom(), 70.0);
    }

    #[test]
    fn test_psm_codes() {
        assert_eq!(PageSegMode::Auto.code(), 3);
        assert_eq!(PageSegMode::SingleBlock.code(), 6);
        assert_eq!(PageSegMode::default(), PageSegMode::SingleBlock);
    }

    #[test]
    fn test_words_flatten_in_engine_order() {
        let page = PageText::Words(vec![
            RecognizedWord::new("Registro", 10, 10, 50, 10),
            RecognizedWord::new("ANS", 70, 10, 20, 10),
            RecognizedWord::new("419010", 100, 10, 40, 10),
        ]);
        assert_eq!(page.to_text(), "Registro ANS 419010");
    }
}
