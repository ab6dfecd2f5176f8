//! PDF page export: render every page of a PDF to a PNG file via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and blocks while painting. The whole export runs on tokio's blocking
//! pool so the cooperative scheduler keeps serving other work.
//!
//! A page that fails to render or write is skipped with a warning; the
//! caller receives the pages that did make it, in page order.

use crate::error::ConverterError;
use chrono::Utc;
use image::ImageFormat;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Longest edge of a rendered page, in pixels.
pub const MAX_RENDERED_PIXELS: i32 = 2000;

/// Render each page of `pdf_path` into `output_dir` as `pdf_page_<secs>_<n>.png`.
pub async fn export_pages(
    pdf_path: &Path,
    output_dir: &Path,
    pdfium_lib_path: Option<&Path>,
) -> Result<Vec<PathBuf>, ConverterError> {
    let path = pdf_path.to_path_buf();
    let out = output_dir.to_path_buf();
    let lib = pdfium_lib_path.map(Path::to_path_buf);

    tokio::fs::create_dir_all(&out)
        .await
        .map_err(|e| ConverterError::Internal(format!("Failed to create {}: {}", out.display(), e)))?;

    tokio::task::spawn_blocking(move || export_pages_blocking(&path, &out, lib.as_deref()))
        .await
        .map_err(|e| ConverterError::Internal(format!("Render task panicked: {}", e)))?
}

/// Number of pages in a PDF.
pub async fn page_count(pdf_path: &Path, pdfium_lib_path: Option<&Path>) -> Result<usize, ConverterError> {
    let path = pdf_path.to_path_buf();
    let lib = pdfium_lib_path.map(Path::to_path_buf);

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium(lib.as_deref())?;
        let document = open_document(&pdfium, &path)?;
        Ok(document.pages().len() as usize)
    })
    .await
    .map_err(|e| ConverterError::Internal(format!("Page-count task panicked: {}", e)))?
}

fn bind_pdfium(lib: Option<&Path>) -> Result<Pdfium, ConverterError> {
    let bindings = match lib {
        Some(path) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
            .or_else(|_| Pdfium::bind_to_library(path)),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ConverterError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

fn open_document<'a>(pdfium: &'a Pdfium, path: &Path) -> Result<PdfDocument<'a>, ConverterError> {
    pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| ConverterError::CorruptPdf {
            path: path.to_path_buf(),
            detail: format!("{:?}", e),
        })
}

fn export_pages_blocking(
    pdf_path: &Path,
    output_dir: &Path,
    lib: Option<&Path>,
) -> Result<Vec<PathBuf>, ConverterError> {
    let pdfium = bind_pdfium(lib)?;
    let document = open_document(&pdfium, pdf_path)?;

    let pages = document.pages();
    let total = pages.len() as usize;
    info!("Exporting {} pages of {}", total, pdf_path.display());

    let render_config = PdfRenderConfig::new()
        .set_target_width(MAX_RENDERED_PIXELS)
        .set_maximum_height(MAX_RENDERED_PIXELS);

    let stamp = Utc::now().timestamp();
    let mut written = Vec::with_capacity(total);

    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let bitmap = match page.render_with_config(&render_config) {
            Ok(b) => b,
            Err(e) => {
                warn!("Skipping page {}: render failed: {:?}", page_num, e);
                continue;
            }
        };

        let image = bitmap.as_image();
        let out = output_dir.join(page_file_name(stamp, page_num));
        if let Err(e) = image.save_with_format(&out, ImageFormat::Png) {
            warn!("Skipping page {}: write failed: {}", page_num, e);
            continue;
        }
        debug!(
            "Page {} → {} ({}x{} px)",
            page_num,
            out.display(),
            image.width(),
            image.height()
        );
        written.push(out);
    }

    Ok(written)
}

/// `pdf_page_<unix-secs>_<1-based page>.png`
pub fn page_file_name(stamp: i64, page_num: usize) -> String {
    format!("pdf_page_{stamp}_{page_num}.png")
}
