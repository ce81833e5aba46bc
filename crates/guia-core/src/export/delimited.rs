//! CSV export and re-import.

use std::io::{Read, Write};

use tracing::debug;

use super::spreadsheet::check_header;
use crate::error::{ExportError, Result};
use crate::models::record::{ExtractionBatch, ExtractionRecord};

/// Write the batch as CSV with a header row.
pub fn write_csv<W: Write>(batch: &ExtractionBatch, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(ExtractionBatch::COLUMNS).map_err(ExportError::from)?;
    for record in batch.iter() {
        csv.write_record(record.cells()).map_err(ExportError::from)?;
    }
    csv.flush()?;
    debug!("Wrote {} CSV rows", batch.len());
    Ok(())
}

pub fn to_csv_string(batch: &ExtractionBatch) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(batch, &mut buf)?;
    String::from_utf8(buf).map_err(|e| {
        ExportError::Read {
            source_kind: "CSV".to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Read a batch from CSV; the header must carry the fixed columns.
pub fn read_csv<R: Read>(reader: R) -> Result<ExtractionBatch> {
    let mut csv = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header = csv.headers().map_err(ExportError::from)?.clone();
    check_header(&header.iter().collect::<Vec<_>>())?;

    let mut batch = ExtractionBatch::new();
    for row in csv.records() {
        let row = row.map_err(ExportError::from)?;
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let cells: Vec<&str> = row.iter().collect();
        batch.push(ExtractionRecord::from_cells(cells.as_slice()));
    }
    Ok(batch)
}
