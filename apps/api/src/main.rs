mod config;
mod doc_intel;
mod errors;
mod resume;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::doc_intel::AzureDocumentAnalyzer;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing Document Intelligence settings)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // A broken analyzer must stop startup, not surface per request
    let analyzer = AzureDocumentAnalyzer::new(
        &config.doc_intel_endpoint,
        &config.doc_intel_api_key,
        config.analysis_timeout,
    )
    .context("Azure Document Intelligence configuration is invalid")?;
    info!(
        "Document Intelligence client initialized (model: {}, api-version: {})",
        doc_intel::azure::MODEL_ID,
        doc_intel::azure::API_VERSION
    );

    info!(
        "Uploads: dir={} max_bytes={} retention={}h types={}",
        config.upload_dir.display(),
        config.max_upload_bytes,
        config.retention.as_secs() / 3600,
        config.allowed_extensions.join(",")
    );

    let state = AppState::new(config.clone(), Arc::new(analyzer));

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
