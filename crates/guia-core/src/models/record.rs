//! Extraction records and batches.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel written when extraction ran but the field was absent.
pub const NOT_FOUND: &str = "Not found";

/// Sentinel written when the pipeline failed before extraction could run.
pub const ERROR: &str = "Error";

/// The four fields read from an SP/SADT authorization guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Guide number assigned by the operator.
    GuideNumber,
    /// Six-digit ANS registry of the health plan.
    RegistryId,
    /// Date the procedure was authorized.
    AuthorizationDate,
    /// Beneficiary (patient) name.
    BeneficiaryName,
}

impl Field {
    /// All fields in column order.
    pub const ALL: [Field; 4] = [
        Field::GuideNumber,
        Field::RegistryId,
        Field::AuthorizationDate,
        Field::BeneficiaryName,
    ];

    /// Column header used in every export format.
    pub fn label(&self) -> &'static str {
        match self {
            Field::GuideNumber => "Guide Number",
            Field::RegistryId => "Registry ID",
            Field::AuthorizationDate => "Authorization Date",
            Field::BeneficiaryName => "Beneficiary Name",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Value of one field: a match, or one of the two sentinels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldValue {
    Found(String),
    NotFound,
    Error,
}

impl FieldValue {
    /// Wrap a matched string; blank matches collapse to `NotFound`.
    pub fn found(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            FieldValue::NotFound
        } else {
            FieldValue::Found(trimmed.to_string())
        }
    }

    /// Parse a cell as written by an exporter or edited by a reviewer.
    pub fn from_cell(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() || cell.eq_ignore_ascii_case(NOT_FOUND) {
            FieldValue::NotFound
        } else if cell.eq_ignore_ascii_case(ERROR) {
            FieldValue::Error
        } else {
            FieldValue::Found(cell.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldValue::Found(value) => value,
            FieldValue::NotFound => NOT_FOUND,
            FieldValue::Error => ERROR,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, FieldValue::Found(_))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::from_cell(&value)
    }
}

impl From<FieldValue> for String {
    fn from(value: FieldValue) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four field values of one guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValues {
    pub guide_number: FieldValue,
    pub registry_id: FieldValue,
    pub authorization_date: FieldValue,
    pub beneficiary_name: FieldValue,
}

impl FieldValues {
    /// All four fields set to `NotFound`.
    pub fn not_found() -> Self {
        Self::filled(FieldValue::NotFound)
    }

    /// All four fields set to `Error`.
    pub fn errored() -> Self {
        Self::filled(FieldValue::Error)
    }

    fn filled(value: FieldValue) -> Self {
        Self {
            guide_number: value.clone(),
            registry_id: value.clone(),
            authorization_date: value.clone(),
            beneficiary_name: value,
        }
    }

    pub fn get(&self, field: Field) -> &FieldValue {
        match field {
            Field::GuideNumber => &self.guide_number,
            Field::RegistryId => &self.registry_id,
            Field::AuthorizationDate => &self.authorization_date,
            Field::BeneficiaryName => &self.beneficiary_name,
        }
    }

    pub fn set(&mut self, field: Field, value: FieldValue) {
        match field {
            Field::GuideNumber => self.guide_number = value,
            Field::RegistryId => self.registry_id = value,
            Field::AuthorizationDate => self.authorization_date = value,
            Field::BeneficiaryName => self.beneficiary_name = value,
        }
    }

    /// Iterate values in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        Field::ALL.into_iter().map(move |field| (field, self.get(field)))
    }

    /// Number of fields holding a real match.
    pub fn found_count(&self) -> usize {
        self.iter().filter(|(_, v)| v.is_found()).count()
    }
}

impl Default for FieldValues {
    fn default() -> Self {
        Self::not_found()
    }
}

/// Outcome of one document as surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// All four fields found.
    Complete,
    /// Some fields found.
    Partial,
    /// Extraction ran but found nothing.
    Empty,
    /// The pipeline failed before extraction.
    Failed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordStatus::Complete => "complete",
            RecordStatus::Partial => "partial",
            RecordStatus::Empty => "no data",
            RecordStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One row of output: the source document and its four fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Source document name.
    pub document: String,

    /// Extracted values.
    pub fields: FieldValues,

    /// Failure message for records produced by a failed pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionRecord {
    pub fn new(document: impl Into<String>, fields: FieldValues) -> Self {
        Self {
            document: document.into(),
            fields,
            error: None,
        }
    }

    /// A record for a document whose pipeline failed.
    pub fn failed(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            fields: FieldValues::errored(),
            error: Some(message.into()),
        }
    }

    pub fn status(&self) -> RecordStatus {
        if self.error.is_some() || self.fields.iter().all(|(_, v)| *v == FieldValue::Error) {
            return RecordStatus::Failed;
        }
        match self.fields.found_count() {
            4 => RecordStatus::Complete,
            0 => RecordStatus::Empty,
            _ => RecordStatus::Partial,
        }
    }

    /// Cells in column order, starting with the document name.
    pub fn cells(&self) -> [String; 5] {
        [
            self.document.clone(),
            self.fields.guide_number.to_string(),
            self.fields.registry_id.to_string(),
            self.fields.authorization_date.to_string(),
            self.fields.beneficiary_name.to_string(),
        ]
    }

    /// Rebuild a record from exported cells (document first).
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Self {
        let cell = |i: usize| cells.get(i).map(|c| c.as_ref()).unwrap_or("");
        let fields = FieldValues {
            guide_number: FieldValue::from_cell(cell(1)),
            registry_id: FieldValue::from_cell(cell(2)),
            authorization_date: FieldValue::from_cell(cell(3)),
            beneficiary_name: FieldValue::from_cell(cell(4)),
        };
        Self::new(cell(0).trim(), fields)
    }
}

/// Ordered collection of records produced by one processing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionBatch {
    pub records: Vec<ExtractionRecord>,

    /// Set when the run was cancelled before every document was processed.
    #[serde(default)]
    pub cancelled: bool,
}

impl ExtractionBatch {
    /// Fixed column layout shared by every export format.
    pub const COLUMNS: [&'static str; 5] = [
        "Document",
        "Guide Number",
        "Registry ID",
        "Authorization Date",
        "Beneficiary Name",
    ];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ExtractionRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtractionRecord> {
        self.records.iter()
    }
}

impl FromIterator<ExtractionRecord> for ExtractionBatch {
    fn from_iter<I: IntoIterator<Item = ExtractionRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
            cancelled: false,
        }
    }
}
