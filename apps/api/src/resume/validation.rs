use thiserror::Error;

use crate::config::MEBIBYTE;
use crate::resume::models::IncomingFile;

/// Why an uploaded file was refused. `Display` is the message sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileRejection {
    #[error("Invalid file. Please upload a valid resume.")]
    Missing,

    #[error("File size exceeds {limit_mb}MB.")]
    TooLarge { limit_mb: u64 },

    #[error("File type not allowed. Allowed types: {}", .allowed.join(", "))]
    DisallowedType { allowed: Vec<String> },
}

/// Size and type rules applied to every upload before any other work happens.
#[derive(Debug, Clone)]
pub struct UploadRules {
    pub max_file_size: u64,
    /// Lowercase, dot-prefixed (".pdf").
    pub allowed_extensions: Vec<String>,
}

impl UploadRules {
    pub fn new(max_file_size: u64, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
        }
    }

    /// Checks presence, then size, then extension. The first failing rule wins.
    pub fn validate<'a>(
        &self,
        file: Option<&'a IncomingFile>,
    ) -> Result<&'a IncomingFile, FileRejection> {
        let file = match file {
            Some(f) if !f.is_empty() => f,
            _ => return Err(FileRejection::Missing),
        };

        if file.len() > self.max_file_size {
            return Err(self.too_large());
        }

        let ext = extension_of(&file.file_name).to_lowercase();
        if !self.allowed_extensions.iter().any(|allowed| *allowed == ext) {
            return Err(FileRejection::DisallowedType {
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(file)
    }

    pub fn too_large(&self) -> FileRejection {
        FileRejection::TooLarge {
            limit_mb: self.max_file_size / MEBIBYTE,
        }
    }
}

/// Returns the extension of the last path segment including the dot, with
/// its original case, or "" when the name has no dot.
pub fn extension_of(file_name: &str) -> &str {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rfind('.') {
        Some(idx) if idx + 1 < base.len() => &base[idx..],
        _ => "",
    }
}
