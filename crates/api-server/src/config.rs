//! Server configuration read from the environment

use std::path::PathBuf;

use axum::http::{header, HeaderValue, Method};
use cert_verify_ocr::{OcrConfig, OcrEngine};
use tower_http::cors::CorsLayer;

/// Runtime configuration for the API server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub addr: String,

    /// OpenAI API key; absence selects the deterministic summary
    pub openai_api_key: Option<String>,

    /// Chat-completion model name
    pub openai_model: String,

    /// OCR settings
    pub ocr: OcrConfig,

    /// Allowed CORS origin; "*" means permissive
    pub cors_origin: String,

    /// Directory where uploaded documents are stored
    pub upload_dir: PathBuf,
}

impl ServerConfig {
    /// Read configuration from environment variables, applying defaults.
    ///
    /// Fails on an unrecognized `OCR_ENGINE` value so a typo is caught at
    /// startup rather than on the first upload.
    pub fn from_env() -> anyhow::Result<Self> {
        let engine = match std::env::var("OCR_ENGINE") {
            Ok(value) => value.parse::<OcrEngine>()?,
            Err(_) => OcrEngine::Tesseract,
        };

        let ocr = OcrConfig {
            engine,
            language: std::env::var("OCR_LANGUAGE").unwrap_or_else(|_| "eng".to_string()),
            ..OcrConfig::default()
        };

        Ok(Self {
            addr: std::env::var("API_SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            ocr,
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            upload_dir: PathBuf::from(
                std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            ),
        })
    }

    /// CORS middleware for the configured origin
    pub fn cors_layer(&self) -> anyhow::Result<CorsLayer> {
        if self.cors_origin == "*" {
            return Ok(CorsLayer::permissive());
        }

        let origin: HeaderValue = self.cors_origin.parse()?;
        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_accepts_wildcard() {
        let config = ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ocr: OcrConfig::default(),
            cors_origin: "*".to_string(),
            upload_dir: PathBuf::from("./uploads"),
        };
        assert!(config.cors_layer().is_ok());
    }

    #[test]
    fn test_cors_layer_accepts_specific_origin() {
        let config = ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ocr: OcrConfig::default(),
            cors_origin: "http://localhost:3000".to_string(),
            upload_dir: PathBuf::from("./uploads"),
        };
        assert!(config.cors_layer().is_ok());
    }

    #[test]
    fn test_cors_layer_rejects_invalid_origin() {
        let config = ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ocr: OcrConfig::default(),
            cors_origin: "not a header\nvalue".to_string(),
            upload_dir: PathBuf::from("./uploads"),
        };
        assert!(config.cors_layer().is_err());
    }
}
