use std::sync::Arc;

use crate::config::Config;
use crate::doc_intel::DocumentAnalyzer;
use crate::resume::retention::RetentionSweeper;
use crate::resume::storage::UploadStore;
use crate::resume::validation::UploadRules;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub rules: UploadRules,
    pub store: UploadStore,
    pub sweeper: RetentionSweeper,
    /// Pluggable analysis backend. Default: AzureDocumentAnalyzer.
    pub analyzer: Arc<dyn DocumentAnalyzer>,
}

impl AppState {
    pub fn new(config: Config, analyzer: Arc<dyn DocumentAnalyzer>) -> Self {
        Self {
            rules: UploadRules::new(config.max_upload_bytes, config.allowed_extensions.clone()),
            store: UploadStore::new(config.upload_dir.clone()),
            sweeper: RetentionSweeper::new(config.upload_dir.clone(), config.retention),
            analyzer,
            config,
        }
    }
}
