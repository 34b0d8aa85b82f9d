//! Retention sweeper — deletes uploads older than the retention window.
//!
//! A sweep captures its cutoff once, before listing the directory, so files
//! written while the sweep runs are never candidates. Deletions that race
//! with another sweep (`NotFound`) count as already done.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::resume::storage::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// The upload directory does not exist yet.
    NoStorage,
    Removed(usize),
}

#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    root: PathBuf,
    retention: Duration,
}

impl RetentionSweeper {
    pub fn new(root: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            root: root.into(),
            retention,
        }
    }

    pub async fn sweep(&self) -> Result<SweepOutcome, StorageError> {
        let now = SystemTime::now();
        let cutoff = now.checked_sub(self.retention).unwrap_or(SystemTime::UNIX_EPOCH);

        let list_err = |source: io::Error| StorageError::List {
            path: self.root.clone(),
            source,
        };

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(root = %self.root.display(), "Upload directory missing, nothing to sweep");
                return Ok(SweepOutcome::NoStorage);
            }
            Err(e) => return Err(list_err(e)),
        };

        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let path = entry.path();
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(list_err(e)),
            };
            if !metadata.is_file() {
                continue;
            }

            let modified = metadata.modified().map_err(list_err)?;
            if modified >= cutoff {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    removed += 1;
                    debug!(
                        path = %path.display(),
                        modified = %DateTime::<Utc>::from(modified),
                        "Removed stale upload"
                    );
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "Stale upload already removed");
                }
                Err(source) => return Err(StorageError::Delete { path, source }),
            }
        }

        info!(
            removed,
            cutoff = %DateTime::<Utc>::from(cutoff),
            "Upload retention sweep finished"
        );
        Ok(SweepOutcome::Removed(removed))
    }
}
