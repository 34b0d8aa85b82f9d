//! Axum route handlers for the Resume API.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::resume::models::{AnalyzeResponse, CleanupResponse, IncomingFile, UploadResponse};
use crate::resume::retention::SweepOutcome;
use crate::resume::validation::UploadRules;
use crate::state::AppState;

/// Multipart field expected to carry the resume.
pub const FILE_FIELD: &str = "file";

/// POST /api/resume/upload
///
/// Validates the resume and saves it under a generated name.
#[tracing::instrument(skip_all)]
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let incoming = read_resume_file(multipart, &state.rules).await?;
    let file = state.rules.validate(incoming.as_ref()).inspect_err(log_rejection)?;

    let stored = state.store.store(file).await?;
    info!(
        original = %file.file_name,
        stored = %stored.path.display(),
        bytes = stored.size,
        "Resume uploaded"
    );

    Ok(Json(UploadResponse {
        message: "Resume uploaded successfully".to_string(),
        file_name: stored.file_name,
    }))
}

/// POST /api/resume/analyze
///
/// Sends the resume to Document Intelligence and returns its text and
/// key/value pairs. Nothing is written to the upload directory.
#[tracing::instrument(skip_all)]
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let incoming = read_resume_file(multipart, &state.rules).await?;
    let file = state.rules.validate(incoming.as_ref()).inspect_err(log_rejection)?;

    let result = state.analyzer.analyze(&file.data).await?;
    info!(
        file_name = %file.file_name,
        chars = result.content.len(),
        fields = result.fields.len(),
        "Resume analyzed"
    );

    Ok(Json(AnalyzeResponse {
        text: result.content,
        fields: result.fields,
    }))
}

/// POST /api/resume/cleanup
///
/// Deletes uploads older than the retention window.
pub async fn handle_cleanup(State(state): State<AppState>) -> Result<Response, AppError> {
    let response = match state.sweeper.sweep().await? {
        SweepOutcome::NoStorage => "No files to clean up.".into_response(),
        SweepOutcome::Removed(count) => Json(CleanupResponse {
            message: format!("Cleanup completed. {count} files removed."),
        })
        .into_response(),
    };
    Ok(response)
}

/// Pulls the resume out of the request. A request that is not multipart at
/// all counts as "no file" so it gets the same message as an empty form.
async fn read_resume_file(
    multipart: Result<Multipart, MultipartRejection>,
    rules: &UploadRules,
) -> Result<Option<IncomingFile>, AppError> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            warn!("Request is not a readable multipart form: {rejection}");
            return Ok(None);
        }
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, rules))?
    {
        // Prefer the named field, but accept any field that carries a file.
        if field.name() != Some(FILE_FIELD) && field.file_name().is_none() {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| multipart_error(e, rules))?;
        return Ok(Some(IncomingFile::new(file_name, data)));
    }

    Ok(None)
}

fn multipart_error(err: MultipartError, rules: &UploadRules) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Multipart body exceeded the upload limit");
        return rules.too_large().into();
    }
    AppError::Validation(format!("Failed to read multipart body: {}", err.body_text()))
}

fn log_rejection(rejection: &crate::resume::validation::FileRejection) {
    warn!("Upload rejected: {rejection}");
}
