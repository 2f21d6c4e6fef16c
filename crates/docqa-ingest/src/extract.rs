//! Text extraction for uploaded files.
//!
//! Uploads arrive as bytes plus a declared content type; this module returns
//! plain UTF-8 text. Only `text/plain` and `application/pdf` are accepted.

use docqa_core::{Error, Result};
use tracing::debug;

use crate::upload::MimeType;

/// Extract the text content of an upload.
pub fn extract_text(name: &str, bytes: &[u8], mime_type: &MimeType) -> Result<String> {
    match mime_type {
        MimeType::PlainText => extract_plain(name, bytes),
        MimeType::Pdf => extract_pdf(name, bytes),
        MimeType::Other(_) => Err(Error::unsupported(name)),
    }
}

fn extract_plain(name: &str, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| Error::decode(name, e.to_string()))
}

/// Concatenate page text in page order with no separator. A page without an
/// extractable text layer contributes nothing.
fn extract_pdf(name: &str, bytes: &[u8]) -> Result<String> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| Error::parse(name, format!("not a readable PDF: {}", e)))?;

    let pages = doc.get_pages();
    let mut content = String::new();

    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(text) => content.push_str(&text),
            Err(e) => {
                debug!("No text layer on page {} of {}: {}", page_num, name, e);
            }
        }
    }

    debug!(
        "Extracted {} chars from {} PDF pages of {}",
        content.chars().count(),
        pages.len(),
        name
    );
    Ok(content)
}
