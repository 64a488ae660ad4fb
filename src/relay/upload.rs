//! Scoped temp-file handling for uploads.
//!
//! An uploaded file must never outlive the request that created it. The guard
//! below owns the file for the duration of the ingestion and removes it when
//! dropped, which covers every exit path including early `?` returns.

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// RAII guard around a transient upload written to the temp directory.
pub struct TempUpload {
    id: String,
    path: PathBuf,
}

impl TempUpload {
    /// Write `bytes` to a collision-resistant uuid-named file under `dir`.
    ///
    /// The uuid doubles as the record identifier for the upsert, so two
    /// concurrent uploads can never collide on the filesystem or in the index.
    pub async fn write(dir: &Path, bytes: &[u8]) -> std::io::Result<Self> {
        let id = Uuid::new_v4().to_string();
        let path = dir.join(&id);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(id = %id, path = %path.display(), "Stored transient upload");
        Ok(Self { id, path })
    }

    /// Request-scoped identifier derived from the generated filename.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Location of the transient file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %err, "Failed to remove transient upload");
        }
    }
}
