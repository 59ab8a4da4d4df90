//! API server binary entry point

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cert_verify_api_server::{start_server, ApiState, ServerConfig};
use cert_verify_ocr::OcrReader;
use cert_verify_storage::{CertificateStorage, PostgresCertificateStorage, PostgresConfig};
use cert_verify_summarize::Summarizer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cert_verify_api_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Connect storage and ensure the schema exists
    let storage = PostgresCertificateStorage::new(PostgresConfig::default()).await?;
    storage.init_schema().await?;

    // OCR init probes the language data so misconfiguration fails at startup
    let ocr = OcrReader::new(config.ocr.clone())?;

    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; summaries will use the deterministic fallback");
    }
    let summarizer = Summarizer::new(config.openai_api_key.clone(), config.openai_model.clone());

    let state = ApiState::new(
        Arc::new(storage),
        summarizer,
        ocr,
        config.upload_dir.clone(),
    );

    let cors = config.cors_layer()?;

    tracing::info!("Starting certificate verification API server");
    start_server(&config.addr, state, cors).await?;

    Ok(())
}
