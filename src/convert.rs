//! Caller-facing operations.
//!
//! [`Converter`] wires one [`LocalArtifactStore`] into the image assembler,
//! the remote orchestrator and the page exporter, so every produced file
//! lands in the same folder and shows up in the same recent-files list.
//!
//! ```rust,no_run
//! use pdfconverter::{Converter, ConverterConfig, Direction};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = Converter::new(ConverterConfig::from_env()?)?;
//!     let pdf = converter.convert_images_to_pdf(&["scan1.jpg", "scan2.png"]).await?;
//!     let docx = converter
//!         .convert_document(&pdf.uri.to_string_lossy(), Direction::PdfToWord)
//!         .await?;
//!     println!("{}", docx.name);
//!     Ok(())
//! }
//! ```

use crate::config::{ConverterConfig, Direction, DocumentFormat};
use crate::error::ConverterError;
use crate::orchestrator::RemoteConversionOrchestrator;
use crate::pipeline::assemble::ImageToPdfAssembler;
use crate::pipeline::normalize::{ContentResolver, DefaultContentResolver, UriNormalizer};
use crate::pipeline::rasterize::{CommandRasterizer, HtmlRasterizer};
use crate::pipeline::render;
use crate::store::{LocalArtifactStore, RecentFile};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// What a host needs to hand a file to its share sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareTarget {
    pub path: PathBuf,
    pub mime_type: &'static str,
}

/// The conversion pipeline behind one artifact folder.
pub struct Converter {
    config: ConverterConfig,
    store: Arc<LocalArtifactStore>,
    normalizer: UriNormalizer,
    assembler: ImageToPdfAssembler,
    orchestrator: RemoteConversionOrchestrator,
}

impl Converter {
    /// Build a converter with the default content resolver and the configured
    /// rasterizer command.
    pub fn new(config: ConverterConfig) -> Result<Self, ConverterError> {
        let resolver = Arc::new(DefaultContentResolver::new(config.request_timeout_secs)?);
        let rasterizer = Arc::new(CommandRasterizer::new(
            config.rasterizer_program.clone(),
            config.rasterizer_args.clone(),
        ));
        Self::with_parts(config, resolver, rasterizer)
    }

    /// Build a converter around host-supplied URI resolution and rasterisation.
    pub fn with_parts(
        config: ConverterConfig,
        resolver: Arc<dyn ContentResolver>,
        rasterizer: Arc<dyn HtmlRasterizer>,
    ) -> Result<Self, ConverterError> {
        let store = Arc::new(LocalArtifactStore::new(config.artifact_dir.clone()));
        let normalizer = UriNormalizer::new(config.scratch_dir.clone(), resolver);
        let assembler = ImageToPdfAssembler::new(normalizer.clone(), rasterizer, store.clone())
            .with_concurrency(config.concurrency)
            .with_progress(config.progress_callback.clone());
        let orchestrator = RemoteConversionOrchestrator::new(&config, normalizer.clone(), store.clone())?;

        Ok(Self {
            config,
            store,
            normalizer,
            assembler,
            orchestrator,
        })
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<LocalArtifactStore> {
        &self.store
    }

    pub fn orchestrator(&self) -> &RemoteConversionOrchestrator {
        &self.orchestrator
    }

    /// Rescan the artifact folder, newest first.
    pub async fn list_recent_files(&self) -> Vec<RecentFile> {
        self.store.list().await
    }

    /// The last known list without touching the disk.
    pub fn recent_snapshot(&self) -> Vec<RecentFile> {
        self.store.recent()
    }

    /// One PDF with a page per image, in the given order.
    pub async fn convert_images_to_pdf<S: AsRef<str>>(&self, uris: &[S]) -> Result<RecentFile, ConverterError> {
        self.assembler.assemble(uris).await
    }

    /// Convert a document through the remote service.
    pub async fn convert_document(&self, uri: &str, direction: Direction) -> Result<RecentFile, ConverterError> {
        let from = direction.source_format(uri);
        let to = direction.target_format();
        self.orchestrator.convert(uri, from, to).await
    }

    pub async fn delete_file(&self, file: &RecentFile) -> Result<(), ConverterError> {
        self.store.delete(file).await
    }

    /// Check that `file` is still in the folder and describe it for sharing.
    pub async fn share_file(&self, file: &RecentFile) -> Result<ShareTarget, ConverterError> {
        if !self.store.contains(&file.uri) {
            return Err(ConverterError::OutsideArtifactFolder {
                path: file.uri.clone(),
            });
        }
        match tokio::fs::metadata(&file.uri).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                return Err(ConverterError::FileMissing {
                    path: file.uri.clone(),
                })
            }
        }

        let mime_type = DocumentFormat::from_extension(&file.name)
            .map(DocumentFormat::mime_type)
            .unwrap_or("application/octet-stream");
        Ok(ShareTarget {
            path: file.uri.clone(),
            mime_type,
        })
    }

    /// Render every page of the PDF at `uri` into `output_dir` as PNG.
    pub async fn export_pdf_pages(&self, uri: &str, output_dir: &Path) -> Result<Vec<PathBuf>, ConverterError> {
        let source = self.normalizer.normalize(uri).await;
        let path = readable_path(uri, source.path())?;
        let pages = render::export_pages(path, output_dir, self.config.pdfium_lib_path.as_deref()).await?;
        info!("Exported {} pages of {}", pages.len(), uri);
        Ok(pages)
    }

    /// Number of pages in the PDF at `uri`.
    pub async fn pdf_page_count(&self, uri: &str) -> Result<usize, ConverterError> {
        let source = self.normalizer.normalize(uri).await;
        let path = readable_path(uri, source.path())?;
        render::page_count(path, self.config.pdfium_lib_path.as_deref()).await
    }
}

fn readable_path<'a>(uri: &str, path: Option<&'a Path>) -> Result<&'a Path, ConverterError> {
    path.ok_or_else(|| ConverterError::LocalRead {
        uri: uri.to_string(),
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "source could not be made readable",
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecentFile;

    fn converter(dir: &Path) -> Converter {
        let config = ConverterConfig::builder()
            .artifact_dir(dir.join("pdfconverter"))
            .scratch_dir(dir.join("scratch"))
            .build()
            .unwrap();
        Converter::new(config).unwrap()
    }

    async fn saved(c: &Converter, dir: &Path, name: &str) -> RecentFile {
        let src = dir.join(format!("src-{name}"));
        std::fs::write(&src, b"content").unwrap();
        c.store().save(&src, name).await.unwrap()
    }

    #[tokio::test]
    async fn share_reports_path_and_mime() {
        let dir = tempfile::TempDir::new().unwrap();
        let c = converter(dir.path());
        let docx = saved(&c, dir.path(), "report.docx").await;

        let target = c.share_file(&docx).await.unwrap();
        assert_eq!(target.path, docx.uri);
        assert_eq!(
            target.mime_type,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );

        let other = saved(&c, dir.path(), "notes.txt").await;
        assert_eq!(
            c.share_file(&other).await.unwrap().mime_type,
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn share_of_deleted_file_is_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let c = converter(dir.path());
        let pdf = saved(&c, dir.path(), "gone.pdf").await;
        std::fs::remove_file(&pdf.uri).unwrap();

        let err = c.share_file(&pdf).await.unwrap_err();
        assert!(matches!(err, ConverterError::FileMissing { .. }));
    }

    #[tokio::test]
    async fn share_outside_folder_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let c = converter(dir.path());
        let mut pdf = saved(&c, dir.path(), "a.pdf").await;
        pdf.uri = dir.path().join("elsewhere.pdf");

        let err = c.share_file(&pdf).await.unwrap_err();
        assert!(matches!(err, ConverterError::OutsideArtifactFolder { .. }));
    }

    #[tokio::test]
    async fn delete_then_list_drops_the_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let c = converter(dir.path());
        let a = saved(&c, dir.path(), "a.pdf").await;
        saved(&c, dir.path(), "b.pdf").await;

        c.delete_file(&a).await.unwrap();
        let names: Vec<String> = c.list_recent_files().await.into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["b.pdf".to_string()]);
        assert_eq!(c.recent_snapshot().len(), 1);

        // Deleting again is not an error.
        c.delete_file(&a).await.unwrap();
    }

    #[tokio::test]
    async fn export_of_unresolvable_uri_is_a_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let c = converter(dir.path());
        let err = c
            .export_pdf_pages("content://media/1", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::LocalRead { .. }));
    }
}
