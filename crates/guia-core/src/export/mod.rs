//! Export of extraction batches: spreadsheet, CSV and text reports.

mod delimited;
mod report;
mod spreadsheet;

pub use delimited::{read_csv, to_csv_string, write_csv};
pub use report::{text_report, QualityReport};
pub use spreadsheet::{column_widths, read_spreadsheet, read_spreadsheet_file, SpreadsheetExporter};

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};
use crate::models::config::ExportStyle;
use crate::models::record::ExtractionBatch;

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Styled `.xlsx` workbook.
    Xlsx,
    Csv,
    /// Plain-text block per document.
    Text,
    /// Completeness summary.
    Quality,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Text | ExportFormat::Quality => "txt",
        }
    }

    /// Guess the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "xlsx" => Some(ExportFormat::Xlsx),
            "csv" => Some(ExportFormat::Csv),
            "txt" => Some(ExportFormat::Text),
            _ => None,
        }
    }
}

/// `guias_medicas_<YYYYMMDD>.<ext>`
pub fn default_file_name(date: NaiveDate, format: ExportFormat) -> String {
    format!("guias_medicas_{}.{}", date.format("%Y%m%d"), format.extension())
}

/// Write `batch` to `path` in the given format.
pub fn export_batch(
    batch: &ExtractionBatch,
    path: &Path,
    format: ExportFormat,
    style: &ExportStyle,
) -> Result<()> {
    match format {
        ExportFormat::Xlsx => SpreadsheetExporter::new(style.clone()).write(batch, path),
        ExportFormat::Csv => write_csv(batch, File::create(path)?),
        ExportFormat::Text => Ok(std::fs::write(path, text_report(batch))?),
        ExportFormat::Quality => Ok(std::fs::write(
            path,
            QualityReport::from_batch(batch).to_string(),
        )?),
    }
}

/// Read a previously exported (and possibly edited) batch from CSV or xlsx.
pub fn read_batch(path: &Path, style: &ExportStyle) -> Result<ExtractionBatch> {
    match ExportFormat::from_path(path) {
        Some(ExportFormat::Csv) => read_csv(File::open(path)?),
        Some(ExportFormat::Xlsx) => read_spreadsheet_file(path, Some(&style.sheet_name)),
        _ => Err(ExportError::Read {
            source_kind: path.display().to_string(),
            reason: "expected a .csv or .xlsx file".to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{ExtractionRecord, FieldValues};

    #[test]
    fn test_default_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        assert_eq!(default_file_name(date, ExportFormat::Xlsx), "guias_medicas_20240512.xlsx");
        assert_eq!(default_file_name(date, ExportFormat::Csv), "guias_medicas_20240512.csv");
    }

    #[test]
    fn test_export_then_read_each_format() {
        let dir = tempfile::tempdir().unwrap();
        let style = ExportStyle::default();
        let batch: ExtractionBatch = vec![
            ExtractionRecord::new("a.pdf", FieldValues::not_found()),
            ExtractionRecord::failed("b.png", "bad"),
        ]
        .into_iter()
        .collect();

        let date = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        for format in [ExportFormat::Xlsx, ExportFormat::Csv] {
            let path = dir.path().join(default_file_name(date, format));
            export_batch(&batch, &path, format, &style).unwrap();
            let read = read_batch(&path, &style).unwrap();
            assert_eq!(read.len(), 2);
            assert_eq!(read.records[1].fields, FieldValues::errored());
        }

        let path = dir.path().join("report.txt");
        export_batch(&batch, &path, ExportFormat::Text, &style).unwrap();
        assert!(read_batch(&path, &style).is_err());
    }
}
