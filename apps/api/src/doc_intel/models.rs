//! Wire types for the Document Intelligence REST API (2024-11-30).

use serde::{Deserialize, Serialize};

use crate::doc_intel::{AnalysisResult, ExtractedField};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeDocumentRequest {
    pub base64_source: String,
}

/// Body of `GET {Operation-Location}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeOperation {
    pub status: String,
    pub analyze_result: Option<AnalyzeResult>,
    pub error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub content: String,
    pub key_value_pairs: Option<Vec<DocumentKeyValuePair>>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentKeyValuePair {
    pub key: Option<DocumentKeyValueElement>,
    pub value: Option<DocumentKeyValueElement>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentKeyValueElement {
    pub content: String,
}

/// `{"error": {...}}` envelope returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ServiceErrorEnvelope {
    pub error: ServiceError,
}

#[derive(Debug, Deserialize)]
pub struct ServiceError {
    pub code: Option<String>,
    pub message: String,
    pub innererror: Option<InnerError>,
}

#[derive(Debug, Deserialize)]
pub struct InnerError {
    pub message: Option<String>,
}

impl ServiceError {
    /// Top-level message, followed by the inner detail when the service gives one.
    pub fn describe(&self) -> String {
        let mut out = match &self.code {
            Some(code) => format!("{code}: {}", self.message),
            None => self.message.clone(),
        };
        if let Some(detail) = self.innererror.as_ref().and_then(|i| i.message.as_deref()) {
            out.push_str(" (");
            out.push_str(detail);
            out.push(')');
        }
        out
    }
}

impl From<AnalyzeResult> for AnalysisResult {
    fn from(result: AnalyzeResult) -> Self {
        let fields = result
            .key_value_pairs
            .unwrap_or_default()
            .into_iter()
            .map(|pair| ExtractedField {
                key: pair.key.map(|k| k.content),
                value: pair.value.map(|v| v.content),
            })
            .collect();

        AnalysisResult {
            content: result.content,
            fields,
        }
    }
}
