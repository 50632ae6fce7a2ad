//! Temporary storage for uploaded audio

use crate::error::StagingError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

const FALLBACK_FILENAME: &str = "input.wav";

/// Root under which every request gets its own scratch directory
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `data` byte-for-byte to a fresh directory, keeping the upload's name
    pub async fn stage(&self, filename: &str, data: &[u8]) -> Result<TempArtifact, StagingError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(StagingError::Write)?;

        let dir = tempfile::Builder::new()
            .prefix("svcgate-")
            .tempdir_in(&self.root)
            .map_err(StagingError::Write)?;

        let path = dir.path().join(sanitize_filename(filename));
        tokio::fs::write(&path, data)
            .await
            .map_err(StagingError::Write)?;

        debug!("Staged {} bytes at {}", data.len(), path.display());
        Ok(TempArtifact { dir, path })
    }
}

/// A staged upload. Dropping it removes the directory; `remove` does the same
/// but reports failures.
#[derive(Debug)]
pub struct TempArtifact {
    dir: TempDir,
    path: PathBuf,
}

impl TempArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remove(self) -> Result<(), StagingError> {
        let dir = self.dir.path().to_path_buf();
        self.dir.close().map_err(StagingError::Cleanup)?;
        debug!("Removed staging directory {}", dir.display());
        Ok(())
    }
}

/// Sanitize an uploaded filename for the filesystem
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            _ => c,
        })
        .collect::<String>();
    let cleaned = cleaned.trim().trim_start_matches('.');

    if cleaned.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}
