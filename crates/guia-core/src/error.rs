//! Error types for the guia-core library.

use thiserror::Error;

/// Main error type for the guia library.
#[derive(Error, Debug)]
pub enum GuiaError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Document could not be read as its declared kind.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Spreadsheet/CSV export or import error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to produce a raster image for a page.
    #[error("failed to rasterize page {page}: {reason}")]
    Rasterize { page: u32, reason: String },

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The OCR engine cannot be invoked at all.
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine ran but recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The engine produced output that could not be parsed.
    #[error("malformed OCR output: {0}")]
    MalformedOutput(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors raised while turning an uploaded file into pages.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// File bytes cannot be parsed as the declared type.
    #[error("cannot decode {name} as {kind}: {reason}")]
    Decode {
        name: String,
        kind: String,
        reason: String,
    },

    /// The file could not be read at all.
    #[error("cannot read {name}: {reason}")]
    Read { name: String, reason: String },

    /// The file extension is not one we process.
    #[error("unsupported document type: {0}")]
    Unsupported(String),
}

/// Errors related to batch export and re-import.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Spreadsheet writer failure.
    #[error("spreadsheet write failed: {0}")]
    Spreadsheet(String),

    /// Spreadsheet or CSV could not be read back.
    #[error("failed to read {source_kind}: {reason}")]
    Read { source_kind: String, reason: String },

    /// CSV writer failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Header row does not match the fixed column layout.
    #[error("unexpected columns: {0}")]
    Columns(String),
}

/// Result type for the guia library.
pub type Result<T> = std::result::Result<T, GuiaError>;
