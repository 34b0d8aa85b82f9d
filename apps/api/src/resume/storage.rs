use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::resume::models::{IncomingFile, StoredUpload};
use crate::resume::validation::extension_of;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to prepare upload directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to read upload directory {path}: {source}")]
    List { path: PathBuf, source: io::Error },

    #[error("failed to delete {path}: {source}")]
    Delete { path: PathBuf, source: io::Error },
}

/// Writes accepted resumes into the transient upload directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persists the file under a fresh `<uuid><ext>` name and returns it.
    pub async fn store(&self, file: &IncomingFile) -> Result<StoredUpload, StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: self.root.clone(),
                source,
            })?;

        let file_name = format!("{}{}", Uuid::new_v4(), extension_of(&file.file_name));
        let path = self.root.join(&file_name);

        let write_err = |source: io::Error| StorageError::Write {
            path: path.clone(),
            source,
        };

        // create_new: a name collision fails instead of clobbering another upload
        let mut out = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(write_err)?;
        out.write_all(&file.data).await.map_err(write_err)?;
        out.flush().await.map_err(write_err)?;

        debug!(file_name = %file_name, bytes = file.len(), "Stored upload");

        Ok(StoredUpload {
            file_name,
            path,
            size: file.len(),
        })
    }
}
