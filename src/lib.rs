//! # pdfconverter
//!
//! Turn photos into PDFs and convert documents between PDF and Word.
//!
//! ## What it does
//!
//! * **Images → PDF.** Each image becomes one page of a single PDF, in the
//!   order given. The page layout is an HTML document with base64-inlined
//!   images, rasterised by an external engine (`wkhtmltopdf` by default).
//! * **PDF ↔ DOCX.** Documents are converted by a remote job API in the style
//!   of CloudConvert: create a job, upload the input, poll until it ends,
//!   download the result.
//! * **PDF → PNG pages.** Each page of a PDF rendered to an image via pdfium.
//!
//! Every produced file lands in one local artifact folder, which doubles as
//! the list of recent files.
//!
//! ## Pipeline Overview
//!
//! ```text
//! images ──▶ normalize ──▶ base64 ──▶ HTML ──▶ rasterizer ──┐
//!                                                           ├──▶ artifact folder
//! document ──▶ normalize ──▶ create ─▶ upload ─▶ poll ─▶ download ─┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfconverter::{Converter, ConverterConfig, Direction};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from CLOUDCONVERT_API_KEY
//!     let converter = Converter::new(ConverterConfig::from_env()?)?;
//!     let docx = converter.convert_document("report.pdf", Direction::PdfToWord).await?;
//!     println!("saved {}", docx.uri.display());
//!     for file in converter.list_recent_files().await {
//!         println!("{}  {:?} bytes", file.name, file.size);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfconverter` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfconverter = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod job;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod store;
pub mod template;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::RemoteClient;
pub use config::{
    ConverterConfig, ConverterConfigBuilder, Direction, DocumentFormat, ARTIFACT_FOLDER_NAME, DEFAULT_API_URL,
};
pub use convert::{Converter, ShareTarget};
pub use error::{ConverterError, StrategyFailure, UploadShapeError};
pub use job::{ConversionJob, ExportedFile, JobPhase, JobStatus, UploadTarget};
pub use orchestrator::{CreatedJob, DownloadedFile, RemoteConversionOrchestrator};
pub use pipeline::assemble::ImageToPdfAssembler;
pub use pipeline::normalize::{ContentResolver, DefaultContentResolver, NormalizedSource, UriNormalizer};
pub use pipeline::rasterize::{CommandRasterizer, HtmlRasterizer};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use store::{ArtifactFs, LocalArtifactStore, RecentFile, SaveStrategy, TokioFs};
