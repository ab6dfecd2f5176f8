//! Local pipeline stages.
//!
//! Each submodule implements exactly one step, so each is testable on its own
//! and the external engines (rasteriser, pdfium) stay behind narrow seams.
//!
//! ## Data Flow
//!
//! ```text
//! normalize ──▶ encode ──▶ assemble ──▶ rasterize        (images → PDF)
//! normalize ──▶ render                                  (PDF → PNG pages)
//! ```
//!
//! 1. [`normalize`] : turn a file path, `file://` URL or opaque handle into a
//!    readable local path
//! 2. [`encode`]    : base64-wrap image bytes into an HTML page block
//! 3. [`assemble`]  : fan out reads, keep input order, build the document
//! 4. [`rasterize`] : hand the HTML to an external HTML → PDF engine
//! 5. [`render`]    : rasterise PDF pages via pdfium; runs in `spawn_blocking`

pub mod assemble;
pub mod encode;
pub mod normalize;
pub mod rasterize;
pub mod render;
