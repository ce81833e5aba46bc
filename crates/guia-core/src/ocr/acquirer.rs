//! Text acquisition: runs the OCR backend in the requested mode.

use std::sync::Arc;

use image::DynamicImage;
use tracing::debug;

use super::{OcrBackend, OcrMode, OcrOptions, PageText, RecognizedWord};
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Wraps an OCR backend with language, segmentation and filtering settings.
#[derive(Clone)]
pub struct TextAcquirer {
    backend: Arc<dyn OcrBackend>,
    options: OcrOptions,
    min_confidence: f32,
}

impl TextAcquirer {
    pub fn new(backend: Arc<dyn OcrBackend>) -> Self {
        Self {
            backend,
            options: OcrOptions::default(),
            min_confidence: 30.0,
        }
    }

    pub fn from_config(backend: Arc<dyn OcrBackend>, config: &OcrConfig, dpi: u32) -> Self {
        Self {
            backend,
            options: OcrOptions {
                language: config.language.clone(),
                psm: config.page_segmentation,
                dpi: Some(dpi),
            },
            min_confidence: config.min_confidence,
        }
    }

    /// Set OCR options.
    pub fn with_options(mut self, options: OcrOptions) -> Self {
        self.options = options;
        self
    }

    /// Set minimum word confidence for structured mode.
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Verify the engine is reachable.
    pub fn check_engine(&self) -> Result<String, OcrError> {
        self.backend.check()
    }

    /// Recognize a prepared image in the given mode.
    pub fn acquire(&self, image: &DynamicImage, mode: OcrMode) -> Result<PageText, OcrError> {
        match mode {
            OcrMode::PlainText => {
                let text = self.backend.recognize_text(image, &self.options)?;
                debug!("OCR returned {} characters", text.len());
                Ok(PageText::Plain(text))
            }
            OcrMode::Structured => {
                let raw = self.backend.recognize_words(image, &self.options)?;
                let total = raw.len();
                let words = filter_words(raw, self.min_confidence);
                debug!("OCR returned {} words, {} kept", total, words.len());
                Ok(PageText::Words(words))
            }
        }
    }
}

/// Drop blank words and words below `min_confidence`.
pub fn filter_words(words: Vec<RecognizedWord>, min_confidence: f32) -> Vec<RecognizedWord> {
    words
        .into_iter()
        .filter(|w| !w.text.trim().is_empty())
        .filter(|w| w.confidence >= min_confidence)
        .collect()
}
