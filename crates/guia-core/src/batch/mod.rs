//! Sequential batch processing of uploaded guides.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, error, info, warn};

use crate::error::{DocumentError, GuiaError, Result};
use crate::guide::{build_locator, FieldLocator};
use crate::models::config::{EngineUnavailablePolicy, GuiaConfig, PdfConfig};
use crate::models::document::{Document, DocumentKind};
use crate::models::record::{ExtractionBatch, ExtractionRecord, FieldValues, RecordStatus};
use crate::ocr::{ImagePreparer, OcrBackend, PageText, TextAcquirer};
use crate::pdf::{PageClassifier, PageRasterizer, PdfExtractor, PdfProcessor, TextSource};

/// Reported once per completed document.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Zero-based position of the document in the input.
    pub index: usize,
    pub total: usize,
    pub document: String,
    pub status: RecordStatus,
    /// Failure message for failed documents.
    pub error: Option<String>,
    /// Acquired text, when the pipeline got that far.
    pub raw_text: Option<String>,
}

/// Receives per-document progress.
pub trait ProgressSink {
    fn on_document(&self, update: &ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressUpdate),
{
    fn on_document(&self, update: &ProgressUpdate) {
        self(update)
    }
}

/// Shared flag checked between documents.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fields and acquired text of one processed document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome {
    pub fields: FieldValues,
    pub raw_text: String,
}

/// Runs classify, rasterize, prepare, acquire and locate for each document.
pub struct BatchOrchestrator {
    acquirer: TextAcquirer,
    locator: Box<dyn FieldLocator>,
    preparer: ImagePreparer,
    classifier: PageClassifier,
    pdf: PdfConfig,
    on_engine_unavailable: EngineUnavailablePolicy,
}

impl BatchOrchestrator {
    pub fn new(acquirer: TextAcquirer, locator: Box<dyn FieldLocator>) -> Self {
        let pdf = PdfConfig::default();
        Self {
            acquirer,
            locator,
            preparer: ImagePreparer::new(),
            classifier: PageClassifier::from_config(&pdf),
            pdf,
            on_engine_unavailable: EngineUnavailablePolicy::Warn,
        }
    }

    pub fn from_config(config: &GuiaConfig, backend: Arc<dyn OcrBackend>) -> Result<Self> {
        let acquirer = TextAcquirer::from_config(backend, &config.ocr, config.pdf.render_dpi);
        let locator = build_locator(&config.extraction)?;

        Ok(Self::new(acquirer, locator)
            .with_preparer(ImagePreparer::from_config(&config.preprocess))
            .with_pdf_config(config.pdf.clone())
            .with_engine_policy(config.ocr.on_unavailable))
    }

    /// Set the image preparer.
    pub fn with_preparer(mut self, preparer: ImagePreparer) -> Self {
        self.preparer = preparer;
        self
    }

    /// Set PDF handling; also resets the classifier threshold.
    pub fn with_pdf_config(mut self, pdf: PdfConfig) -> Self {
        self.classifier = PageClassifier::from_config(&pdf);
        self.pdf = pdf;
        self
    }

    pub fn with_engine_policy(mut self, policy: EngineUnavailablePolicy) -> Self {
        self.on_engine_unavailable = policy;
        self
    }

    /// Startup engine check. Returns the engine version, or `None` when the
    /// engine is missing and the policy is to warn.
    pub fn check_engine(&self) -> Result<Option<String>> {
        match self.acquirer.check_engine() {
            Ok(version) => {
                info!("Using OCR engine {} ({})", self.acquirer.backend_name(), version);
                Ok(Some(version))
            }
            Err(e) => match self.on_engine_unavailable {
                EngineUnavailablePolicy::Warn => {
                    warn!("{}; documents that need OCR will fail individually", e);
                    Ok(None)
                }
                EngineUnavailablePolicy::Halt => Err(e.into()),
            },
        }
    }

    /// Process `documents` in order into `current`, which is cleared first.
    ///
    /// Failures and panics are contained per document as all-`Error`
    /// records. Cancellation is honoured between documents.
    pub fn run(
        &self,
        documents: &[Document],
        mut current: ExtractionBatch,
        progress: &dyn ProgressSink,
        cancel: &CancellationFlag,
    ) -> ExtractionBatch {
        current.records.clear();
        current.cancelled = false;

        let total = documents.len();
        let start = Instant::now();
        info!("Processing {} documents", total);

        for (index, document) in documents.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("Run cancelled after {} of {} documents", index, total);
                current.cancelled = true;
                break;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.process_document(document)));
            let (record, raw_text) = match outcome {
                Ok(Ok(outcome)) => (
                    ExtractionRecord::new(&document.name, outcome.fields),
                    Some(outcome.raw_text),
                ),
                Ok(Err(e)) => {
                    error!("Failed to process {}: {}", document.name, e);
                    (ExtractionRecord::failed(&document.name, e.to_string()), None)
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!("Pipeline panicked on {}: {}", document.name, message);
                    (ExtractionRecord::failed(&document.name, message), None)
                }
            };

            progress.on_document(&ProgressUpdate {
                index,
                total,
                document: document.name.clone(),
                status: record.status(),
                error: record.error.clone(),
                raw_text,
            });
            current.push(record);
        }

        info!(
            "Processed {} documents in {} ms",
            current.len(),
            start.elapsed().as_millis()
        );
        current
    }

    /// Full pipeline for one document.
    pub fn process_document(&self, document: &Document) -> Result<DocumentOutcome> {
        if let Some(reason) = &document.read_error {
            return Err(DocumentError::Read {
                name: document.name.clone(),
                reason: reason.clone(),
            }
            .into());
        }

        let kind = document
            .kind
            .ok_or_else(|| DocumentError::Unsupported(document.name.clone()))?;
        debug!("Processing {} as {}", document.name, kind);

        let pages = match kind {
            DocumentKind::Image => {
                let image = image::load_from_memory(&document.bytes)
                    .map_err(|e| decode_error(document, kind, e))?;
                vec![self.recognize(&image)?]
            }
            DocumentKind::Pdf => self.pdf_pages(document)?,
        };

        let fields = self.locator.locate_pages(&pages);
        let raw_text = pages.iter().map(PageText::to_text).collect::<Vec<_>>().join("\n");
        debug!("{}: {}/4 fields found", document.name, fields.found_count());

        Ok(DocumentOutcome { fields, raw_text })
    }

    fn pdf_pages(&self, document: &Document) -> Result<Vec<PageText>> {
        let pdf = PdfExtractor::from_bytes(&document.bytes)
            .map_err(|e| decode_error(document, DocumentKind::Pdf, e))?
            .with_renderer(&self.pdf.renderer_path);

        // Native documents skip OCR under either strategy.
        if self.pdf.prefer_embedded_text {
            let classification = self.classifier.classify(&pdf);
            if classification.source == TextSource::Native {
                if let Some(text) = classification.text {
                    debug!("{}: using embedded text", document.name);
                    return Ok(vec![PageText::Plain(text)]);
                }
            }
        }

        let mut page_count = pdf.page_count();
        if self.pdf.max_pages > 0 {
            page_count = page_count.min(self.pdf.max_pages as u32);
        }

        let mut pages = Vec::with_capacity(page_count as usize);
        for page in 1..=page_count {
            let image = pdf.render_page(page, self.pdf.render_dpi)?;
            pages.push(self.recognize(&image)?);
        }
        Ok(pages)
    }

    fn recognize(&self, image: &DynamicImage) -> Result<PageText> {
        let prepared = self.preparer.prepare(image);
        Ok(self.acquirer.acquire(&prepared, self.locator.mode())?)
    }
}

fn decode_error(document: &Document, kind: DocumentKind, e: impl std::fmt::Display) -> GuiaError {
    DocumentError::Decode {
        name: document.name.clone(),
        kind: kind.to_string(),
        reason: e.to_string(),
    }
    .into()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("internal error: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("internal error: {}", s)
    } else {
        "internal error".to_string()
    }
}
