use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::doc_intel::AnalysisError;
use crate::resume::storage::StorageError;
use crate::resume::validation::FileRejection;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// The document analysis service refused the request. Client-correctable.
    #[error("Document analysis rejected: {0}")]
    RemoteService(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Analysis error: {0}")]
    Analysis(String),
}

impl From<FileRejection> for AppError {
    fn from(rejection: FileRejection) -> Self {
        AppError::Validation(rejection.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Rejected { status, message } => {
                if let Some(status) = status {
                    tracing::debug!(status, "Analysis service responded with an error status");
                }
                AppError::RemoteService(message)
            }
            other => AppError::Analysis(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::RemoteService(msg) => {
                tracing::warn!("Document analysis rejected the request: {msg}");
                (
                    StatusCode::BAD_REQUEST,
                    "DOCUMENT_ANALYSIS_FAILED",
                    format!("Document analysis failed: {msg}"),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Analysis(msg) => {
                tracing::error!("Analysis error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ANALYSIS_ERROR",
                    "An error occurred while analyzing the document".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
