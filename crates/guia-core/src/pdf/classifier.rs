//! Native-text versus scanned classification of PDFs.

use tracing::{debug, warn};

use super::PdfProcessor;
use crate::models::config::PdfConfig;

/// Where a document's text must come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    /// Embedded text is usable as is.
    Native,
    /// Pages must be rasterized and OCR'd.
    Scanned,
}

/// Result of classifying a whole PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub source: TextSource,
    /// Trimmed native character count per page, in page order.
    pub page_chars: Vec<usize>,
    /// Document text, present only for native documents.
    pub text: Option<String>,
}

impl Classification {
    pub fn is_scanned(&self) -> bool {
        self.source == TextSource::Scanned
    }
}

/// Decides per document whether OCR is needed.
#[derive(Debug, Clone)]
pub struct PageClassifier {
    min_text_length: usize,
}

impl PageClassifier {
    pub fn new(min_text_length: usize) -> Self {
        Self { min_text_length }
    }

    pub fn from_config(config: &PdfConfig) -> Self {
        Self::new(config.min_text_length)
    }

    /// Classify a loaded PDF.
    ///
    /// A single page under the threshold makes the whole document scanned.
    pub fn classify(&self, pdf: &dyn PdfProcessor) -> Classification {
        let page_count = pdf.page_count();
        let mut page_texts = Vec::with_capacity(page_count as usize);

        for page in 1..=page_count {
            let text = match pdf.extract_page_text(page) {
                Ok(text) => text,
                Err(e) => {
                    warn!("No native text on page {}: {}", page, e);
                    String::new()
                }
            };
            page_texts.push(text);
        }

        let page_chars: Vec<usize> = page_texts.iter().map(|t| t.trim().chars().count()).collect();
        let scanned = page_chars.is_empty()
            || page_chars.iter().all(|&n| n == 0)
            || page_chars.iter().any(|&n| n < self.min_text_length);

        debug!(
            "Classified {} pages (chars per page {:?}) as {}",
            page_count,
            page_chars,
            if scanned { "scanned" } else { "native" }
        );

        if scanned {
            return Classification {
                source: TextSource::Scanned,
                page_chars,
                text: None,
            };
        }

        let text = match pdf.extract_text() {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => page_texts.join("\n"),
            Err(e) => {
                debug!("Whole-document extraction failed ({}), joining page texts", e);
                page_texts.join("\n")
            }
        };

        Classification {
            source: TextSource::Native,
            page_chars,
            text: Some(text),
        }
    }
}

impl Default for PageClassifier {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfError;
    use crate::pdf::Result;
    use image::DynamicImage;

    struct FakePdf {
        pages: Vec<&'static str>,
        whole: Option<&'static str>,
    }

    impl PdfProcessor for FakePdf {
        fn load(&mut self, _: &[u8]) -> Result<()> {
            Ok(())
        }

        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn extract_text(&self) -> Result<String> {
            self.whole
                .map(str::to_string)
                .ok_or_else(|| PdfError::TextExtraction("broken font".to_string()))
        }

        fn extract_page_text(&self, page: u32) -> Result<String> {
            Ok(self.pages[page as usize - 1].to_string())
        }

        fn extract_images(&self, _: u32) -> Result<Vec<DynamicImage>> {
            Ok(Vec::new())
        }
    }

    const FULL_PAGE: &str =
        "1 - Registro ANS 419010 2 - Número Guia 17456856 3 - Data de Autorização 12/05/2024";

    #[test]
    fn test_native_document_uses_whole_text() {
        let pdf = FakePdf {
            pages: vec![FULL_PAGE],
            whole: Some("whole document text"),
        };
        let result = PageClassifier::default().classify(&pdf);

        assert_eq!(result.source, TextSource::Native);
        assert_eq!(result.text.as_deref(), Some("whole document text"));
    }

    #[test]
    fn test_falls_back_to_page_texts() {
        let pdf = FakePdf {
            pages: vec![FULL_PAGE, FULL_PAGE],
            whole: None,
        };
        let result = PageClassifier::default().classify(&pdf);

        assert_eq!(result.text, Some(format!("{}\n{}", FULL_PAGE, FULL_PAGE)));
    }

    #[test]
    fn test_one_short_page_makes_document_scanned() {
        let pdf = FakePdf {
            pages: vec![FULL_PAGE, "   12  "],
            whole: Some(FULL_PAGE),
        };
        let result = PageClassifier::default().classify(&pdf);

        assert!(result.is_scanned());
        assert_eq!(result.page_chars[1], 2);
        assert_eq!(result.text, None);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let pdf = FakePdf {
            pages: vec!["short but enough"],
            whole: None,
        };
        assert!(PageClassifier::default().classify(&pdf).is_scanned());
        assert!(!PageClassifier::new(10).classify(&pdf).is_scanned());
    }
}
