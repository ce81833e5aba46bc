//! Data models and configuration.

pub mod config;
pub mod document;
pub mod record;

pub use config::GuiaConfig;
pub use document::{Document, DocumentKind};
pub use record::{
    ExtractionBatch, ExtractionRecord, Field, FieldValue, FieldValues, RecordStatus, ERROR,
    NOT_FOUND,
};
