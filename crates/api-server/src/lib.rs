//! REST API server for certificate verification
//!
//! Exposes the processing pipeline over HTTP: upload a certificate document,
//! OCR it, extract fields, summarize, verify against the student roster, and
//! persist the result. JSON in and out except the stored-image stream.

mod config;
mod handlers;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use cert_verify_ocr::OcrReader;
use cert_verify_storage::CertificateStorage;
use cert_verify_summarize::Summarizer;

pub use config::ServerConfig;
pub use handlers::*;
pub use types::*;

/// Largest accepted upload body
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// API server state shared across handlers
#[derive(Clone)]
pub struct ApiState {
    /// Certificate and student persistence
    pub storage: Arc<dyn CertificateStorage>,
    /// Document summarizer
    pub summarizer: Arc<Summarizer>,
    /// OCR reader
    pub ocr: Arc<OcrReader>,
    /// Directory where uploaded documents are stored
    pub upload_dir: PathBuf,
}

impl ApiState {
    /// Create new API state
    #[must_use]
    pub fn new(
        storage: Arc<dyn CertificateStorage>,
        summarizer: Summarizer,
        ocr: OcrReader,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            storage,
            summarizer: Arc::new(summarizer),
            ocr: Arc::new(ocr),
            upload_dir,
        }
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: ApiState, cors: CorsLayer) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Certificate pipeline
        .route("/certificates/upload", post(upload_certificate))
        .route("/certificates", get(list_certificates))
        .route("/certificates/{id}", get(get_certificate))
        .route("/certificates/{id}/image", get(get_certificate_image))
        // Standalone verification
        .route("/verify", post(verify_student))
        // Middleware
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the API server
pub async fn start_server(
    addr: &str,
    state: ApiState,
    cors: CorsLayer,
) -> Result<(), std::io::Error> {
    tracing::info!("Starting API server on {}", addr);

    let app = build_router(state, cors);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await
}
