use std::path::PathBuf;

use bytes::Bytes;
use serde::Serialize;

use crate::doc_intel::ExtractedField;

/// A file pulled out of a multipart request, fully buffered.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub data: Bytes,
}

impl IncomingFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A file written to the upload directory.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// `<uuid><original extension>`; the identifier returned to clients.
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub text: String,
    pub fields: Vec<ExtractedField>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub message: String,
}
