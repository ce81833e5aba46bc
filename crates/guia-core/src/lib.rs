//! Core library for medical authorization guide OCR.
//!
//! This crate provides:
//! - PDF processing (native text, page classification, page images)
//! - OCR pipeline driving Tesseract (image preparation, plain and structured output)
//! - SP/SADT guide field location (regex and spatial strategies)
//! - Sequential batch orchestration with per-document failure isolation
//! - Spreadsheet, CSV and text report export

pub mod batch;
pub mod error;
pub mod export;
pub mod guide;
pub mod models;
pub mod ocr;
pub mod pdf;

pub use batch::{BatchOrchestrator, CancellationFlag, ProgressSink, ProgressUpdate};
pub use error::{GuiaError, Result};
pub use export::{ExportFormat, QualityReport, SpreadsheetExporter};
pub use guide::{ExtractionStrategy, FieldLocator, RegexLocator, SpatialLocator};
pub use models::{
    Document, DocumentKind, ExtractionBatch, ExtractionRecord, Field, FieldValue, FieldValues,
    GuiaConfig, RecordStatus,
};
pub use ocr::{OcrBackend, RecognizedWord, TesseractCli};
pub use pdf::{PageRasterizer, PdfExtractor, PdfProcessor};
