//! HTML template for image-to-PDF assembly.
//!
//! Every page is one `<div class="page">` wrapping one full-width image; the
//! wrapper forces a page break after itself, so the page count of the
//! rasterised PDF equals the number of wrappers.

/// Class name of a page wrapper.
pub const PAGE_CLASS: &str = "page";

/// Document head: viewport, 12 mm page margins, one page per wrapper.
pub const DOCUMENT_HEAD: &str = concat!(
    r#"<head><meta charset="utf-8">"#,
    r#"<meta name="viewport" content="width=device-width,initial-scale=1.0">"#,
    "<style>",
    "@page{size:auto;margin:12mm;}",
    "html,body{margin:0;padding:0;}",
    "img{max-width:100%;height:auto}",
    ".page{page-break-after:always;break-after:page;}",
    ".page:last-child{page-break-after:auto;break-after:auto;}",
    "</style></head>"
);

/// One page: the wrapper, an unbreakable block, and the image.
pub fn page_block(mime_type: &str, base64_data: &str) -> String {
    format!(
        r#"<div class="{PAGE_CLASS}"><div style="page-break-inside:avoid;"><img src="data:{mime_type};base64,{base64_data}" style="width:100%;height:auto;display:block;"/></div></div>"#
    )
}

/// The whole document around already rendered page blocks, in order.
pub fn document(pages: &[String]) -> String {
    format!(
        "<!DOCTYPE html><html>{DOCUMENT_HEAD}<body>\n{}\n</body></html>",
        pages.join("\n")
    )
}

/// Number of page wrappers in a document produced by [`document`].
pub fn count_pages(html: &str) -> usize {
    html.matches(&format!(r#"<div class="{PAGE_CLASS}">"#)).count()
}
