use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use tracing::{debug, warn};

use crate::doc_intel::models::{
    AnalyzeDocumentRequest, AnalyzeOperation, AnalyzeResult, ServiceErrorEnvelope,
};
use crate::doc_intel::{AnalysisError, AnalysisResult, DocumentAnalyzer};

pub const API_VERSION: &str = "2024-11-30";
pub const MODEL_ID: &str = "prebuilt-layout";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const INITIAL_POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Azure AI Document Intelligence client running the `prebuilt-layout` model.
///
/// Analysis is a long-running operation: the document is submitted, then the
/// returned `Operation-Location` is polled until it succeeds or fails. The
/// whole exchange is bounded by `timeout`. Failed requests are not retried.
pub struct AzureDocumentAnalyzer {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl AzureDocumentAnalyzer {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(AnalysisError::MissingConfiguration("endpoint"));
        }
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AnalysisError::MissingConfiguration("API key"));
        }

        let client = Client::builder()
            .timeout(request_timeout(timeout))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/{MODEL_ID}:analyze?api-version={API_VERSION}&features=keyValuePairs",
            self.endpoint
        )
    }

    /// Starts the analysis and returns the operation URL plus the service's
    /// suggested wait before the first poll.
    async fn submit(&self, data: &[u8]) -> Result<(String, Option<Duration>), AnalysisError> {
        let body = AnalyzeDocumentRequest {
            base64_source: general_purpose::STANDARD.encode(data),
        };

        let response = self
            .client
            .post(self.analyze_url())
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let operation_url = response
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AnalysisError::MalformedResponse(
                    "analyze response is missing the Operation-Location header".to_string(),
                )
            })?
            .to_string();

        Ok((operation_url, retry_after(response.headers())))
    }

    async fn poll_until_complete(
        &self,
        operation_url: &str,
        first_wait: Option<Duration>,
    ) -> Result<AnalyzeResult, AnalysisError> {
        let mut interval = INITIAL_POLL_INTERVAL;
        let mut wait = first_wait.unwrap_or(interval);

        loop {
            tokio::time::sleep(wait.min(MAX_POLL_INTERVAL)).await;

            let response = self
                .client
                .get(operation_url)
                .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(rejection(response).await);
            }

            let hinted = retry_after(response.headers());
            let operation: AnalyzeOperation = response
                .json()
                .await
                .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;

            match operation.status.as_str() {
                "succeeded" => {
                    return operation.analyze_result.ok_or_else(|| {
                        AnalysisError::MalformedResponse(
                            "operation succeeded without an analyzeResult".to_string(),
                        )
                    });
                }
                "failed" | "canceled" => {
                    let message = operation
                        .error
                        .map(|e| e.describe())
                        .unwrap_or_else(|| format!("analysis operation {}", operation.status));
                    return Err(AnalysisError::Rejected {
                        status: None,
                        message,
                    });
                }
                "notStarted" | "running" => {
                    debug!(status = %operation.status, "Analysis still in progress");
                    interval = (interval * 2).min(MAX_POLL_INTERVAL);
                    wait = hinted.unwrap_or(interval);
                }
                other => {
                    return Err(AnalysisError::MalformedResponse(format!(
                        "unknown operation status '{other}'"
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for AzureDocumentAnalyzer {
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    async fn analyze(&self, data: &[u8]) -> Result<AnalysisResult, AnalysisError> {
        let run = async {
            let (operation_url, first_wait) = self.submit(data).await?;
            debug!(operation_url = %operation_url, "Analysis submitted");
            self.poll_until_complete(&operation_url, first_wait).await
        };

        let result = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| AnalysisError::Timeout(self.timeout))??;

        Ok(result.into())
    }
}

/// Turns a non-2xx response into `Rejected`, preferring the message in the
/// service's error envelope over the raw body.
async fn rejection(response: Response) -> AnalysisError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    warn!(%status, "Document Intelligence rejected the request");

    let message = match serde_json::from_str::<ServiceErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.describe(),
        Err(_) if body.trim().is_empty() => format!("service returned {status}"),
        Err(_) => body,
    };

    AnalysisError::Rejected {
        status: Some(status.as_u16()),
        message,
    }
}

/// Per-call HTTP timeout. A single call may use the whole analysis budget, so
/// a slow upload is only cut off by the overall deadline.
fn request_timeout(analysis_timeout: Duration) -> Duration {
    analysis_timeout
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
