//! Document analysis client.
//!
//! Handlers only see the `DocumentAnalyzer` trait; `AppState` carries an
//! `Arc<dyn DocumentAnalyzer>` so tests can swap in a fake.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod azure;
pub mod models;

pub use azure::AzureDocumentAnalyzer;

/// One key/value pair detected in a document. Either side is `None` when the
/// service found content for only one half of the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedField {
    #[serde(rename = "Key")]
    pub key: Option<String>,
    #[serde(rename = "Value")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    pub content: String,
    pub fields: Vec<ExtractedField>,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("document analysis is not configured: {0} is missing")]
    MissingConfiguration(&'static str),

    /// The service answered and refused the request (credentials, input, quota).
    #[error("{message}")]
    Rejected { status: Option<u16>, message: String },

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response from analysis service: {0}")]
    MalformedResponse(String),

    #[error("analysis did not complete within {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Runs layout analysis over the raw document bytes and waits for the result.
    async fn analyze(&self, data: &[u8]) -> Result<AnalysisResult, AnalysisError>;
}
