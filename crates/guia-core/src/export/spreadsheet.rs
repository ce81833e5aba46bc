//! Styled `.xlsx` export and re-import.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::models::config::{parse_hex_color, ExportStyle};
use crate::models::record::{ExtractionBatch, ExtractionRecord};

impl From<XlsxError> for ExportError {
    fn from(e: XlsxError) -> Self {
        ExportError::Spreadsheet(e.to_string())
    }
}

/// Writes a batch as a single styled worksheet.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetExporter {
    style: ExportStyle,
}

impl SpreadsheetExporter {
    pub fn new(style: ExportStyle) -> Self {
        Self { style }
    }

    fn header_format(&self) -> Result<Format> {
        let mut format = Format::new()
            .set_background_color(Color::RGB(parse_hex_color(&self.style.header_background)?))
            .set_font_color(Color::RGB(parse_hex_color(&self.style.header_font_color)?))
            .set_align(FormatAlign::Top)
            .set_text_wrap();
        if self.style.header_bold {
            format = format.set_bold();
        }
        if self.style.header_border {
            format = format.set_border(FormatBorder::Thin);
        }
        Ok(format)
    }

    /// Serialize the workbook to memory.
    pub fn to_bytes(&self, batch: &ExtractionBatch) -> Result<Vec<u8>> {
        let header = self.header_format()?;
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.style.sheet_name).map_err(ExportError::from)?;

        for (col, title) in ExtractionBatch::COLUMNS.iter().enumerate() {
            sheet
                .write_string_with_format(0, col as u16, *title, &header)
                .map_err(ExportError::from)?;
        }

        for (row, record) in batch.iter().enumerate() {
            for (col, cell) in record.cells().iter().enumerate() {
                sheet
                    .write_string(row as u32 + 1, col as u16, cell)
                    .map_err(ExportError::from)?;
            }
        }

        for (col, width) in column_widths(batch, self.style.column_padding).iter().enumerate() {
            sheet
                .set_column_width(col as u16, *width as f64)
                .map_err(ExportError::from)?;
        }

        let bytes = workbook.save_to_buffer().map_err(ExportError::from)?;
        debug!("Wrote {} rows to spreadsheet ({} bytes)", batch.len(), bytes.len());
        Ok(bytes)
    }

    /// Write the workbook to `path`.
    pub fn write(&self, batch: &ExtractionBatch, path: &Path) -> Result<()> {
        let bytes = self.to_bytes(batch)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Column widths in characters: widest cell (header included) plus padding.
pub fn column_widths(batch: &ExtractionBatch, padding: usize) -> [usize; 5] {
    let mut widths = ExtractionBatch::COLUMNS.map(|title| title.chars().count());
    for record in batch.iter() {
        for (width, cell) in widths.iter_mut().zip(record.cells().iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths.map(|w| w + padding)
}

/// Read a batch back from `.xlsx` bytes.
///
/// Uses the named sheet when present, otherwise the first sheet. Rows with
/// every cell blank are skipped.
pub fn read_spreadsheet(bytes: &[u8], sheet_name: Option<&str>) -> Result<ExtractionBatch> {
    let read_error = |reason: String| ExportError::Read {
        source_kind: "spreadsheet".to_string(),
        reason,
    };

    let mut workbook: Xlsx<Cursor<&[u8]>> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e: calamine::XlsxError| read_error(e.to_string()))?;

    let names = workbook.sheet_names();
    let sheet = sheet_name
        .filter(|name| names.iter().any(|n| n == name))
        .map(str::to_string)
        .or_else(|| names.first().cloned())
        .ok_or_else(|| read_error("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| read_error(e.to_string()))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_text).collect())
        .unwrap_or_default();
    check_header(&header)?;

    let records = rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|cells| ExtractionRecord::from_cells(cells.as_slice()))
        .collect();

    Ok(records)
}

/// Read a batch from an `.xlsx` file.
pub fn read_spreadsheet_file(path: &Path, sheet_name: Option<&str>) -> Result<ExtractionBatch> {
    let bytes = std::fs::read(path)?;
    read_spreadsheet(&bytes, sheet_name)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The header row must carry the fixed columns, in order.
pub(crate) fn check_header<S: AsRef<str>>(header: &[S]) -> Result<()> {
    let matches = header.len() >= ExtractionBatch::COLUMNS.len()
        && ExtractionBatch::COLUMNS
            .iter()
            .zip(header)
            .all(|(expected, got)| got.as_ref().trim().eq_ignore_ascii_case(expected));

    if matches {
        Ok(())
    } else {
        let got: Vec<&str> = header.iter().map(|h| h.as_ref()).collect();
        Err(ExportError::Columns(format!(
            "expected [{}], got [{}]",
            ExtractionBatch::COLUMNS.join(", "),
            got.join(", ")
        ))
        .into())
    }
}
