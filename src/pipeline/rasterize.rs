//! HTML → PDF rasterisation through an external engine.
//!
//! The crate does not lay out or paint HTML itself. [`HtmlRasterizer`] is the
//! seam; [`CommandRasterizer`] drives a command-line engine such as
//! `wkhtmltopdf` (or `chromium --headless --print-to-pdf` via a wrapper
//! script) that takes an input HTML path and an output PDF path.

use crate::error::ConverterError;
use async_trait::async_trait;
use std::path::Path;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

/// Turns a self-contained HTML document into a single PDF file.
#[async_trait]
pub trait HtmlRasterizer: Send + Sync {
    /// Render `html` and write the PDF to `output`.
    async fn rasterize(&self, html: &str, output: &Path) -> Result<(), ConverterError>;
}

/// Runs `<program> [args…] <input.html> <output.pdf>`.
#[derive(Debug, Clone)]
pub struct CommandRasterizer {
    program: String,
    args: Vec<String>,
}

impl CommandRasterizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl HtmlRasterizer for CommandRasterizer {
    async fn rasterize(&self, html: &str, output: &Path) -> Result<(), ConverterError> {
        let work = TempDir::new().map_err(|e| ConverterError::Internal(e.to_string()))?;
        let input = work.path().join("document.html");
        tokio::fs::write(&input, html)
            .await
            .map_err(|e| ConverterError::Internal(format!("Failed to write HTML: {e}")))?;

        debug!("Running {} on {} bytes of HTML", self.program, html.len());
        let result = Command::new(&self.program)
            .args(&self.args)
            .arg(&input)
            .arg(output)
            .output()
            .await
            .map_err(|e| ConverterError::RasterisationFailed {
                detail: format!("could not start '{}': {}", self.program, e),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ConverterError::RasterisationFailed {
                detail: format!("'{}' exited with {}: {}", self.program, result.status, stderr.trim()),
            });
        }

        let size = tokio::fs::metadata(output).await.map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(ConverterError::RasterisationFailed {
                detail: format!("'{}' produced no output", self.program),
            });
        }

        info!("Rasterised {} → {} ({} bytes)", input.display(), output.display(), size);
        Ok(())
    }
}
