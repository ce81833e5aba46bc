//! PDF processing module.

mod classifier;
mod extractor;

pub use classifier::{Classification, PageClassifier, TextSource};
pub use extractor::PdfExtractor;

#[cfg(test)]
pub(crate) use extractor::tests::sample_pdf;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Extract embedded images from a page.
    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>>;
}

/// Turns a PDF page into a raster image.
pub trait PageRasterizer {
    /// Render a page (1-indexed) as an image at the specified DPI.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage>;
}
