//! Human-readable summaries of a batch.

use std::fmt::{self, Write as _};

use serde::Serialize;

use crate::models::record::{ExtractionBatch, Field, RecordStatus};

/// One block per document listing its four fields.
pub fn text_report(batch: &ExtractionBatch) -> String {
    let mut out = String::new();
    for record in batch.iter() {
        let _ = writeln!(out, "=== {} ===", record.document);
        for (field, value) in record.fields.iter() {
            let _ = writeln!(out, "{}: {}", field.label(), value);
        }
        if let Some(error) = &record.error {
            let _ = writeln!(out, "Error detail: {}", error);
        }
        out.push('\n');
    }
    out
}

/// Aggregate completeness of a batch, for triaging manual review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub total: usize,
    /// Records with all four fields found.
    pub complete: usize,
    pub incomplete: usize,
    /// Records whose pipeline failed (subset of `incomplete`).
    pub failed: usize,
    /// Share of complete records, 0 - 100.
    pub complete_percent: f64,
    /// Records missing each field, in column order. Failed records count as
    /// missing every field.
    pub missing_by_field: Vec<(Field, usize)>,
    /// Documents that are not complete.
    pub needs_review: Vec<String>,
}

impl QualityReport {
    pub fn from_batch(batch: &ExtractionBatch) -> Self {
        let total = batch.len();
        let complete = batch
            .iter()
            .filter(|r| r.status() == RecordStatus::Complete)
            .count();
        let failed = batch
            .iter()
            .filter(|r| r.status() == RecordStatus::Failed)
            .count();

        let missing_by_field = Field::ALL
            .iter()
            .map(|&field| {
                let missing = batch
                    .iter()
                    .filter(|r| !r.fields.get(field).is_found())
                    .count();
                (field, missing)
            })
            .collect();

        let needs_review = batch
            .iter()
            .filter(|r| r.status() != RecordStatus::Complete)
            .map(|r| r.document.clone())
            .collect();

        let complete_percent = if total == 0 {
            0.0
        } else {
            complete as f64 * 100.0 / total as f64
        };

        Self {
            total,
            complete,
            incomplete: total - complete,
            failed,
            complete_percent,
            missing_by_field,
            needs_review,
        }
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Documents:  {}", self.total)?;
        writeln!(f, "Complete:   {} ({:.1}%)", self.complete, self.complete_percent)?;
        writeln!(f, "Incomplete: {}", self.incomplete)?;
        writeln!(f, "Failed:     {}", self.failed)?;
        writeln!(f)?;
        writeln!(f, "Missing per field:")?;
        for (field, missing) in &self.missing_by_field {
            writeln!(f, "  {:<20} {}", field.label(), missing)?;
        }
        if !self.needs_review.is_empty() {
            writeln!(f)?;
            writeln!(f, "Needs review:")?;
            for document in &self.needs_review {
                writeln!(f, "  - {}", document)?;
            }
        }
        Ok(())
    }
}
