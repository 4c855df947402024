//! Delivery of exported documents to the user.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("invalid file name '{0}'")]
    InvalidName(String),

    #[error("failed to write download: {0}")]
    Io(#[from] std::io::Error),
}

/// Where exported bytes end up.
pub trait DownloadSink: Send + Sync {
    /// Save `bytes` under `file_name` and return where they landed.
    fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError>;
}

/// Saves downloads into a directory on disk.
///
/// Bytes are first written to a temporary file in the same directory and then
/// renamed into place, so a half-written export never appears under its final
/// name. The temporary file is removed if anything fails.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name == ".." {
            return Err(DownloadError::InvalidName(file_name.to_string()));
        }
        if !self.dir.is_dir() {
            return Err(DownloadError::MissingDirectory(self.dir.clone()));
        }

        let target = self.dir.join(file_name);
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(bytes)?;
        staged.flush()?;
        staged.persist(&target).map_err(|e| e.error)?;

        tracing::debug!(path = %target.display(), size = bytes.len(), "download saved");
        Ok(target)
    }
}
