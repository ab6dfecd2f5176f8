//! Image-to-PDF assembly.
//!
//! ```text
//! uris ──▶ normalize ──▶ read ──▶ base64 ──▶ page block ─┐   (per image, fan-out)
//!                                                        ▼
//!                              HTML document (input order) ──▶ rasterizer ──▶ store
//! ```
//!
//! Images are read and encoded concurrently with `buffered`, which yields
//! results in submission order. Page order therefore always equals input
//! order, however the reads complete.

use crate::error::ConverterError;
use crate::pipeline::encode::{encode_image, mime_for_path};
use crate::pipeline::normalize::UriNormalizer;
use crate::pipeline::rasterize::HtmlRasterizer;
use crate::progress::ProgressCallback;
use crate::store::{LocalArtifactStore, RecentFile};
use crate::template;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info};

/// Composes ordered images into one PDF and stores it.
pub struct ImageToPdfAssembler {
    normalizer: UriNormalizer,
    rasterizer: Arc<dyn HtmlRasterizer>,
    store: Arc<LocalArtifactStore>,
    concurrency: usize,
    progress: Option<ProgressCallback>,
}

impl ImageToPdfAssembler {
    pub fn new(
        normalizer: UriNormalizer,
        rasterizer: Arc<dyn HtmlRasterizer>,
        store: Arc<LocalArtifactStore>,
    ) -> Self {
        Self {
            normalizer,
            rasterizer,
            store,
            concurrency: 4,
            progress: None,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_progress(mut self, cb: Option<ProgressCallback>) -> Self {
        self.progress = cb;
        self
    }

    /// Build one PDF with a page per image, in the given order.
    ///
    /// # Errors
    /// - [`ConverterError::EmptyInput`] before anything else when `uris` is empty
    /// - [`ConverterError::LocalRead`] naming the first image that could not be read;
    ///   no PDF is produced
    /// - rasteriser and save errors as returned by those components
    pub async fn assemble<S: AsRef<str>>(&self, uris: &[S]) -> Result<RecentFile, ConverterError> {
        if uris.is_empty() {
            return Err(ConverterError::EmptyInput);
        }
        let start = Instant::now();
        let total = uris.len();
        info!("Assembling {} images into a PDF", total);

        let pages: Vec<String> = stream::iter(
            uris.iter()
                .enumerate()
                .map(|(index, uri)| self.encode_page(index, total, uri.as_ref())),
        )
        .buffered(self.concurrency)
        .try_collect()
        .await?;

        let html = template::document(&pages);
        debug!("Generated {} bytes of HTML for {} pages", html.len(), pages.len());

        let work = TempDir::new().map_err(|e| ConverterError::Internal(e.to_string()))?;
        let output = work.path().join("assembled.pdf");
        self.rasterizer.rasterize(&html, &output).await?;

        let name = self.store.unique_name("converted", "pdf").await;
        let file = self.store.save(&output, &name).await?;

        if let Some(ref cb) = self.progress {
            cb.on_saved(&file);
        }
        info!(
            "Assembled {} pages into {} in {}ms",
            total,
            file.name,
            start.elapsed().as_millis()
        );
        Ok(file)
    }

    async fn encode_page(&self, index: usize, total: usize, uri: &str) -> Result<String, ConverterError> {
        let source = self.normalizer.normalize(uri).await;
        let bytes = source.read(uri).await?;
        let mime = mime_for_path(source.path().unwrap_or_else(|| Path::new(uri)));
        let block = encode_image(&bytes, mime).to_html();

        if let Some(ref cb) = self.progress {
            cb.on_image_encoded(index, total);
        }
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::ContentResolver;
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use regex::Regex;
    use std::io;
    use std::sync::Mutex;

    /// Records the HTML it was given and writes it out as the "PDF".
    #[derive(Default)]
    struct RecordingRasterizer {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HtmlRasterizer for RecordingRasterizer {
        async fn rasterize(&self, html: &str, output: &Path) -> Result<(), ConverterError> {
            self.calls.lock().unwrap().push(html.to_string());
            tokio::fs::write(output, html)
                .await
                .map_err(|e| ConverterError::Internal(e.to_string()))
        }
    }

    struct NoResolver;

    #[async_trait]
    impl ContentResolver for NoResolver {
        async fn read(&self, _uri: &str) -> io::Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::Unsupported, "none"))
        }
    }

    /// Serves `content://media/<i>.jpg`; earlier handles take longer to read.
    struct SlowFirstResolver {
        total: u64,
    }

    #[async_trait]
    impl ContentResolver for SlowFirstResolver {
        async fn read(&self, uri: &str) -> io::Result<Vec<u8>> {
            let index: u64 = uri
                .trim_start_matches("content://media/")
                .trim_end_matches(".jpg")
                .parse()
                .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "bad handle"))?;
            let delay = (self.total - index) * 15;
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            Ok(format!("page-{index}").into_bytes())
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        images: std::path::PathBuf,
        rasterizer: Arc<RecordingRasterizer>,
        assembler: ImageToPdfAssembler,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::TempDir::new().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();
        let store = Arc::new(LocalArtifactStore::new(dir.path().join("pdfconverter")));
        let rasterizer = Arc::new(RecordingRasterizer::default());
        let normalizer = UriNormalizer::new(dir.path().join("scratch"), Arc::new(NoResolver));
        let assembler = ImageToPdfAssembler::new(normalizer, rasterizer.clone(), store)
            .with_concurrency(3);
        Fixture {
            _dir: dir,
            images,
            rasterizer,
            assembler,
        }
    }

    fn image(fx: &Fixture, name: &str, body: &[u8]) -> String {
        let path = fx.images.join(name);
        std::fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn empty_input_fails_before_rasterizing() {
        let fx = fixture();
        let err = fx.assembler.assemble::<String>(&[]).await.unwrap_err();
        assert!(matches!(err, ConverterError::EmptyInput));
        assert!(fx.rasterizer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn two_images_produce_named_pdf_in_folder() {
        let fx = fixture();
        let a = image(&fx, "a.jpg", b"jpeg-a");
        let b = image(&fx, "b.png", b"png-b");

        let file = fx.assembler.assemble(&[a, b]).await.unwrap();

        let pattern = Regex::new(r"^converted_\d+\.pdf$").unwrap();
        assert!(pattern.is_match(&file.name), "name was {}", file.name);
        assert_eq!(file.uri.parent(), Some(fx.assembler.store.root()));
        assert!(file.size.unwrap_or(0) > 0);

        let calls = fx.rasterizer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let html = &calls[0];
        assert_eq!(template::count_pages(html), 2);
        assert!(html.contains(&format!("data:image/jpeg;base64,{}", STANDARD.encode(b"jpeg-a"))));
        assert!(html.contains(&format!("data:image/png;base64,{}", STANDARD.encode(b"png-b"))));
    }

    #[tokio::test]
    async fn page_order_matches_input_order() {
        let fx = fixture();
        let names: Vec<String> = (0..8)
            .map(|i| image(&fx, &format!("p{i}.jpg"), format!("page-{i}").as_bytes()))
            .collect();
        // Reverse so input order differs from file-creation order.
        let uris: Vec<String> = names.into_iter().rev().collect();

        fx.assembler.assemble(&uris).await.unwrap();

        let html = fx.rasterizer.calls.lock().unwrap()[0].clone();
        assert_eq!(template::count_pages(&html), 8);
        let positions: Vec<usize> = (0..8)
            .rev()
            .map(|i| html.find(&STANDARD.encode(format!("page-{i}"))).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "pages out of order");
    }

    #[tokio::test]
    async fn pages_keep_input_order_when_reads_finish_in_reverse() {
        let dir = tempfile::TempDir::new().unwrap();
        let total = 6;
        let rasterizer = Arc::new(RecordingRasterizer::default());
        let normalizer = UriNormalizer::new(
            dir.path().join("scratch"),
            Arc::new(SlowFirstResolver { total }),
        );
        let store = Arc::new(LocalArtifactStore::new(dir.path().join("pdfconverter")));
        let assembler = ImageToPdfAssembler::new(normalizer, rasterizer.clone(), store)
            .with_concurrency(total as usize);
        let uris: Vec<String> = (0..total).map(|i| format!("content://media/{i}.jpg")).collect();

        assembler.assemble(&uris).await.unwrap();

        let html = rasterizer.calls.lock().unwrap()[0].clone();
        assert_eq!(template::count_pages(&html), total as usize);
        let positions: Vec<usize> = (0..total)
            .map(|i| html.find(&STANDARD.encode(format!("page-{i}"))).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "pages out of order");
    }

    #[tokio::test]
    async fn duplicates_become_separate_pages() {
        let fx = fixture();
        let a = image(&fx, "a.jpg", b"same");
        fx.assembler.assemble(&[a.clone(), a.clone(), a]).await.unwrap();
        let html = fx.rasterizer.calls.lock().unwrap()[0].clone();
        assert_eq!(template::count_pages(&html), 3);
    }

    #[tokio::test]
    async fn unreadable_image_aborts_whole_assembly() {
        let fx = fixture();
        let good = image(&fx, "ok.jpg", b"ok");
        let missing = fx.images.join("missing.jpg").to_string_lossy().into_owned();

        let err = fx
            .assembler
            .assemble(&[good, missing.clone()])
            .await
            .unwrap_err();
        match err {
            ConverterError::LocalRead { uri, .. } => assert_eq!(uri, missing),
            other => panic!("expected LocalRead, got {other:?}"),
        }
        assert!(fx.rasterizer.calls.lock().unwrap().is_empty());
        assert!(fx.assembler.store.list().await.is_empty());
    }

    #[tokio::test]
    async fn unresolvable_handle_is_named_in_error() {
        let fx = fixture();
        let err = fx
            .assembler
            .assemble(&["content://media/9"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("content://media/9"));
    }
}
