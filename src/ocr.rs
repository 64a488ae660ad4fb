//! OCR subprocess integration.
//!
//! Text extraction is delegated to an external program invoked with the path of
//! the uploaded file as its only argument. The program's stdout is the
//! extracted text; stderr is captured for diagnostics. The concrete tool is
//! hidden behind [`TextExtractor`] so it can be swapped without touching the
//! ingestion pipeline.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Errors raised while running the OCR subprocess.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The OCR program could not be started (missing binary, bad permissions).
    #[error("Failed to spawn OCR process '{program}': {source}")]
    Spawn {
        /// Program we attempted to execute.
        program: String,
        /// Underlying error raised by the OS.
        #[source]
        source: std::io::Error,
    },
    /// The OCR process exceeded its time budget and was killed.
    #[error("OCR process timed out after {0:?}")]
    Timeout(Duration),
}

/// Interface implemented by text-extraction backends.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract plain text from the file at `path`.
    ///
    /// An extraction that produces no text is not an error; it yields an empty
    /// string and leaves any rejection to downstream consumers.
    async fn extract_text(&self, path: &Path) -> Result<String, OcrError>;
}

/// [`TextExtractor`] backed by an external command.
pub struct CommandExtractor {
    program: String,
    timeout: Duration,
}

impl CommandExtractor {
    /// Create an extractor invoking `program <path>` with the given time budget.
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl TextExtractor for CommandExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, OcrError> {
        let mut child = Command::new(&self.program)
            .arg(path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| OcrError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(OcrError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
            // kill_on_drop reaps the child once the future is dropped.
            Err(_) => return Err(OcrError::Timeout(self.timeout)),
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            tracing::debug!(program = %self.program, diagnostics = %stderr.trim(), "OCR diagnostics");
        }

        // A failing or silent OCR run surfaces as empty text, not as a fault.
        if !output.status.success() {
            tracing::warn!(
                program = %self.program,
                status = %output.status,
                "OCR process exited unsuccessfully; treating output as empty"
            );
            return Ok(String::new());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
