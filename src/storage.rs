//! Transient storage for generated PDFs.
//!
//! Artifacts are plain files in a shared directory (the OS temp dir by
//! default). Nothing is ever deleted here; cleanup is left to the OS.

use actix_files::NamedFile;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid artifact filename '{0}'")]
    InvalidFilename(String),
    #[error("artifact '{0}' not found")]
    NotFound(String),
    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file written by the generate endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub filename: String,
    pub path: PathBuf,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[cfg(test)]
    fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Resolve `filename` inside the store, rejecting anything that is not a
    /// plain file name.
    pub fn path_for(&self, filename: &str) -> Result<PathBuf, StorageError> {
        let is_plain = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(['/', '\\'])
            && sanitize_filename::sanitize(filename) == filename;

        if !is_plain {
            return Err(StorageError::InvalidFilename(filename.to_string()));
        }
        Ok(self.root.join(filename))
    }

    pub async fn store(&self, filename: &str, bytes: &[u8]) -> Result<StoredArtifact, StorageError> {
        let path = self.path_for(filename)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, bytes).await?;

        log::debug!("Stored artifact {} ({} bytes)", path.display(), bytes.len());

        Ok(StoredArtifact {
            filename: filename.to_string(),
            path,
            size: bytes.len(),
        })
    }

    /// Open an artifact for streaming back to a client.
    pub async fn open(&self, filename: &str) -> Result<NamedFile, StorageError> {
        let path = self.path_for(filename)?;
        match NamedFile::open_async(&path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Lowercase ASCII slug of `name` for use in filenames.
pub fn slugify(name: &str, fallback: &str) -> String {
    let mut result = String::new();
    let mut last_dash = false;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !last_dash && !result.is_empty() {
            result.push('-');
            last_dash = true;
        }
    }

    let result = result.trim_matches('-');
    if result.is_empty() {
        return fallback.to_string();
    }
    result.to_string()
}

/// `<prefix>_<client slug>_<YYYYMMDD_HHMMSS>_<token>.pdf`.
///
/// The random token keeps same-second requests for the same client apart.
pub fn artifact_filename(prefix: &str, client_name: &str, now: DateTime<Local>) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}_{}.pdf",
        prefix,
        slugify(client_name, "client"),
        now.format("%Y%m%d_%H%M%S"),
        &token[..8]
    )
}
