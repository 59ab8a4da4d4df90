/// Common types and utilities for certificate document processing
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Processing errors
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Empty upload: {0}")]
    EmptyUpload(String),

    #[error("No text could be extracted from the document")]
    NoTextExtracted,

    #[error("OCR error: {0}")]
    OcrError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for processing operations
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// File extensions accepted for upload
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "tiff", "tif"];

/// Kind of uploaded document, derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    /// Classify a filename by extension. Returns `None` for disallowed types.
    #[must_use]
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" | "png" | "tiff" | "tif" => Some(Self::Image),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
        }
    }
}

/// Check whether a filename carries an allowed extension
#[must_use]
pub fn is_allowed_file(filename: &str) -> bool {
    DocumentKind::from_filename(filename).is_some()
}

/// MIME type for serving a stored document back to the client
#[must_use]
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tiff" | "tif" => "image/tiff",
        _ => "application/octet-stream",
    }
}
