//! Error types for the pdfconverter library.
//!
//! Every caller-facing operation either fully succeeds or fails with exactly
//! one [`ConverterError`]. There is no partial-success state: an image
//! assembly that could not read one of its inputs produces no PDF, and a
//! remote conversion that failed while polling never reaches the download.
//!
//! Save fallbacks are the one place where several failures happen before the
//! final verdict. Each failed strategy is recorded as a [`StrategyFailure`]
//! and all of them are carried by [`ConverterError::LocalSave`].

use crate::store::SaveStrategy;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdfconverter library.
#[derive(Debug, Error)]
pub enum ConverterError {
    // ── Remote job errors ─────────────────────────────────────────────────
    /// The remote service rejected the job description.
    #[error("Failed to create conversion job (HTTP {status}): {body}")]
    RemoteJobCreation { status: u16, body: String },

    /// The import task returned neither a form upload nor a direct upload URL.
    #[error("Unsupported upload target from the conversion service: {detail}")]
    UnsupportedUploadShape { detail: String },

    /// Sending the input file to the upload target failed.
    #[error("Upload to '{url}' failed: {reason}")]
    UploadTransport { url: String, reason: String },

    /// The job did not reach a terminal state within the poll budget.
    #[error("Conversion job '{job_id}' timed out after {attempts} status checks")]
    PollTimeout { job_id: String, attempts: u32 },

    /// The remote job ended in `error`. Displays the failed task's message verbatim.
    #[error("{message}")]
    RemoteTask { task: String, message: String },

    /// The finished job has no exported file to download.
    #[error("No converted file found in the result of job '{job_id}'")]
    NoOutputFile { job_id: String },

    /// A job status request could not be completed.
    #[error("Request to '{url}' failed: {reason}")]
    RemoteRequest { url: String, reason: String },

    /// Downloading the converted file failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    // ── Local input errors ────────────────────────────────────────────────
    /// A source could not be read as bytes.
    #[error("Failed to read '{uri}': {source}")]
    LocalRead {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    /// An assembly was requested with no images.
    #[error("No images given; at least one page is required")]
    EmptyInput,

    /// The external HTML-to-PDF engine failed or produced nothing.
    #[error("Rasterisation failed: {detail}")]
    RasterisationFailed { detail: String },

    // ── Artifact store errors ─────────────────────────────────────────────
    /// Every save strategy failed; nothing was added to the store.
    #[error("Failed to save '{name}' into the artifact folder ({})", format_failures(.failures))]
    LocalSave {
        name: String,
        failures: Vec<StrategyFailure>,
    },

    /// Removing a file failed for a reason other than "not found".
    #[error("Failed to delete '{path}': {source}")]
    LocalDelete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A path handed to the store does not live inside the artifact folder.
    #[error("'{path}' is not inside the artifact folder")]
    OutsideArtifactFolder { path: PathBuf },

    /// A recent file disappeared from disk before it could be shared.
    #[error("File not found: '{path}'")]
    FileMissing { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not open the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why an import task's result could not be turned into an upload target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail}")]
pub struct UploadShapeError {
    pub detail: String,
}

impl From<UploadShapeError> for ConverterError {
    fn from(e: UploadShapeError) -> Self {
        ConverterError::UnsupportedUploadShape { detail: e.detail }
    }
}

/// One failed attempt of the save fallback chain.
#[derive(Debug, Error)]
#[error("{strategy}: {source}")]
pub struct StrategyFailure {
    pub strategy: SaveStrategy,
    #[source]
    pub source: std::io::Error,
}

fn format_failures(failures: &[StrategyFailure]) -> String {
    if failures.is_empty() {
        return "no strategy attempted".to_string();
    }
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_task_displays_message_verbatim() {
        let e = ConverterError::RemoteTask {
            task: "convert-1".into(),
            message: "Unsupported output format".into(),
        };
        assert_eq!(e.to_string(), "Unsupported output format");
    }

    #[test]
    fn job_creation_display_carries_status_and_body() {
        let e = ConverterError::RemoteJobCreation {
            status: 422,
            body: "{\"message\":\"bad\"}".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("422"), "got: {msg}");
        assert!(msg.contains("bad"), "got: {msg}");
    }

    #[test]
    fn local_save_lists_every_strategy() {
        let e = ConverterError::LocalSave {
            name: "out.pdf".into(),
            failures: vec![
                StrategyFailure {
                    strategy: SaveStrategy::Copy,
                    source: std::io::Error::other("copy refused"),
                },
                StrategyFailure {
                    strategy: SaveStrategy::Move,
                    source: std::io::Error::other("cross-device"),
                },
            ],
        };
        let msg = e.to_string();
        assert!(msg.contains("copy: copy refused"), "got: {msg}");
        assert!(msg.contains("move: cross-device"), "got: {msg}");
    }

    #[test]
    fn poll_timeout_display() {
        let e = ConverterError::PollTimeout {
            job_id: "job-1".into(),
            attempts: 20,
        };
        assert!(e.to_string().contains("20"));
        assert!(e.to_string().contains("job-1"));
    }
}
