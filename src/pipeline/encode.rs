//! Image encoding: raw image bytes → base64 data URI inside a page block.
//!
//! The HTML handed to the rasterizer is self-contained: every image is
//! inlined as `data:<mime>;base64,…` so the external engine never needs
//! filesystem or network access to our inputs.

use crate::template::page_block;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// MIME type for an image path: `png` → `image/png`, everything else → `image/jpeg`.
///
/// This is an extension heuristic, not content sniffing.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        _ => "image/jpeg",
    }
}

/// An encoded page ready to be placed in the document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPage {
    pub mime_type: &'static str,
    pub data: String,
}

impl EncodedPage {
    /// The page wrapper with its full-bleed image.
    pub fn to_html(&self) -> String {
        page_block(self.mime_type, &self.data)
    }
}

/// Base64-encode one image.
pub fn encode_image(bytes: &[u8], mime_type: &'static str) -> EncodedPage {
    let data = STANDARD.encode(bytes);
    debug!("Encoded image → {} bytes base64 ({})", data.len(), mime_type);
    EncodedPage { mime_type, data }
}
