//! File-backed number log
//!
//! A plain UTF-8 text file, one token per line. Truncated on reset, then only
//! ever appended to.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::LogError;
use crate::ports::NumberLog;

/// Append-only log file on disk.
pub struct FileNumberLog {
    path: PathBuf,
    file: Option<File>,
}

impl FileNumberLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_for_append(&self) -> Result<File, LogError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| LogError::io(&self.path, e))
    }
}

#[async_trait]
impl NumberLog for FileNumberLog {
    async fn reset(&mut self) -> Result<(), LogError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LogError::io(parent, e))?;
        }

        File::create(&self.path)
            .await
            .map_err(|e| LogError::io(&self.path, e))?;
        self.file = Some(self.open_for_append().await?);

        info!(path = %self.path.display(), "Number log truncated");
        Ok(())
    }

    async fn append(&mut self, bytes: &[u8]) -> Result<(), LogError> {
        let mut file = match self.file.take() {
            Some(file) => file,
            None => self.open_for_append().await?,
        };

        // tokio buffers file writes; flush so the append is on disk before
        // the next one is issued.
        let written = match file.write_all(bytes).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        self.file = Some(file);
        written.map_err(|e| LogError::io(&self.path, e))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
