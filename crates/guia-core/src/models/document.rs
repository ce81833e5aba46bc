//! Uploaded documents.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Declared kind of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    /// Derive the kind from a file name's extension.
    pub fn from_name(name: &str) -> Result<Self, DocumentError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "png" | "jpg" | "jpeg" => Ok(DocumentKind::Image),
            _ => Err(DocumentError::Unsupported(name.to_string())),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Pdf => f.write_str("PDF"),
            DocumentKind::Image => f.write_str("image"),
        }
    }
}

/// One uploaded file, fully buffered.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name as uploaded.
    pub name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
    /// Declared kind, `None` when the extension is not supported.
    pub kind: Option<DocumentKind>,
    /// Why the file could not be read, for documents that never loaded.
    pub read_error: Option<String>,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let kind = DocumentKind::from_name(&name).ok();
        Self {
            name,
            bytes,
            kind,
            read_error: None,
        }
    }

    /// A document whose file could not be read. It fails on its own when
    /// processed instead of stopping the batch.
    pub fn unreadable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            read_error: Some(reason.into()),
            ..Self::new(name, Vec::new())
        }
    }

    /// Read a document from disk, naming it after the file name.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(file_name(path), bytes))
    }

    /// Like [`Document::from_path`], but a read failure yields an
    /// unreadable document.
    pub fn load(path: &Path) -> Self {
        match std::fs::read(path) {
            Ok(bytes) => Self::new(file_name(path), bytes),
            Err(e) => Self::unreadable(file_name(path), e.to_string()),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_name("guia.PDF").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_name("scan.jpeg").unwrap(), DocumentKind::Image);
        assert_eq!(DocumentKind::from_name("scan.Png").unwrap(), DocumentKind::Image);
        assert!(DocumentKind::from_name("notes.txt").is_err());
        assert!(DocumentKind::from_name("README").is_err());
    }

    #[test]
    fn test_load_missing_file_is_unreadable() {
        let doc = Document::load(Path::new("/nonexistent/guia_007.pdf"));
        assert_eq!(doc.name, "guia_007.pdf");
        assert_eq!(doc.kind, Some(DocumentKind::Pdf));
        assert!(doc.read_error.is_some());
        assert!(doc.bytes.is_empty());
    }

    #[test]
    fn test_unsupported_document_has_no_kind() {
        let doc = Document::new("planilha.xlsx", vec![1, 2, 3]);
        assert!(doc.kind.is_none());
    }
}
