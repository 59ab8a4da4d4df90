//! OCR module using Tesseract 5.x
//!
//! Wraps the `leptess` bindings to turn a stored certificate image into a
//! single block of UTF-8 text. The service only needs full-page text for the
//! downstream field heuristics, so no bounding boxes or per-word confidences
//! are exposed here.
//!
//! Tesseract cannot rasterize PDFs; feeding it a PDF path yields a
//! recognition error, which the caller surfaces as a processing failure.

use std::path::Path;
use std::str::FromStr;

use leptess::{LepTess, Variable};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during OCR processing
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to initialize Tesseract: {0}")]
    InitError(String),

    #[error("Failed to run OCR: {0}")]
    RecognitionError(String),

    #[error("Unsupported OCR engine: {0}")]
    UnsupportedEngine(String),
}

/// Selectable OCR backend. Only Tesseract is implemented; the selector exists
/// so the `OCR_ENGINE` environment knob fails loudly on unknown values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngine {
    Tesseract,
}

impl FromStr for OcrEngine {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            other => Err(OcrError::UnsupportedEngine(other.to_string())),
        }
    }
}

/// Configuration for OCR processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Selected engine
    pub engine: OcrEngine,
    /// Tesseract language codes (e.g., "eng", "eng+fra")
    pub language: String,
    /// Page segmentation mode (see Tesseract PSM)
    pub page_segmentation_mode: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: OcrEngine::Tesseract,
            language: "eng".to_string(),
            page_segmentation_mode: 3, // PSM_AUTO (fully automatic)
        }
    }
}

/// Full-page text reader backed by Tesseract
pub struct OcrReader {
    config: OcrConfig,
}

impl OcrReader {
    /// Create a new OCR reader.
    ///
    /// Verifies that Tesseract can initialize with the configured language so
    /// missing language data is reported at startup rather than per request.
    pub fn new(config: OcrConfig) -> Result<Self, OcrError> {
        let _probe = LepTess::new(None, &config.language).map_err(|e| {
            OcrError::InitError(format!(
                "Failed to initialize Tesseract with language '{}': {}. \
                 Make sure language data is installed",
                config.language, e
            ))
        })?;

        Ok(Self { config })
    }

    /// Run OCR over a stored document and return the recognized text.
    ///
    /// Blocking; callers inside async handlers should run this under
    /// `tokio::task::spawn_blocking`.
    pub fn read_text(&self, path: &Path) -> Result<String, OcrError> {
        let mut lt = LepTess::new(None, &self.config.language)
            .map_err(|e| OcrError::InitError(format!("Failed to initialize Tesseract: {e}")))?;

        lt.set_variable(
            Variable::TesseditPagesegMode,
            &self.config.page_segmentation_mode.to_string(),
        )
        .map_err(|e| OcrError::InitError(format!("Failed to set PSM: {e}")))?;

        lt.set_image(path).map_err(|e| {
            OcrError::RecognitionError(format!(
                "Failed to load image {}: {e}",
                path.display()
            ))
        })?;

        let text = lt
            .get_utf8_text()
            .map_err(|e| OcrError::RecognitionError(format!("Failed to extract text: {e}")))?;

        debug!(
            "OCR read {} bytes of text from {}",
            text.len(),
            path.display()
        );

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocr_config_default() {
        let config = OcrConfig::default();
        assert_eq!(config.engine, OcrEngine::Tesseract);
        assert_eq!(config.language, "eng");
        assert_eq!(config.page_segmentation_mode, 3);
    }

    #[test]
    fn test_engine_from_str() {
        assert_eq!(
            "tesseract".parse::<OcrEngine>().unwrap(),
            OcrEngine::Tesseract
        );
        assert_eq!(
            " Tesseract ".parse::<OcrEngine>().unwrap(),
            OcrEngine::Tesseract
        );
        assert!("easyocr".parse::<OcrEngine>().is_err());
        assert!("".parse::<OcrEngine>().is_err());
    }

    #[test]
    fn test_engine_serialization() {
        let json = serde_json::to_string(&OcrEngine::Tesseract).unwrap();
        assert_eq!(json, "\"tesseract\"");
    }
}
