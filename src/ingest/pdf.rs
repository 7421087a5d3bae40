//! PDF text extraction.
//!
//! Extraction is deliberately forgiving: a document that fails to parse, is
//! encrypted, or carries no extractable text (scanned/image-only pages) yields
//! an empty page list rather than an error. Callers treat the empty sequence
//! as a rejectable condition at the HTTP boundary.

use lopdf::Document;

use super::types::PageText;

/// Extract per-page text from raw PDF bytes, in page order.
///
/// Pages whose text is empty or whitespace-only are dropped.
pub fn extract_pages(bytes: &[u8]) -> Vec<PageText> {
    let document = match Document::load_mem(bytes) {
        Ok(document) => document,
        Err(error) => {
            tracing::warn!(error = %error, "Failed to parse PDF");
            return Vec::new();
        }
    };

    if document.is_encrypted() {
        tracing::warn!("Refusing to extract text from an encrypted PDF");
        return Vec::new();
    }

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    pages.push(PageText {
                        page: *page_number,
                        text: trimmed.to_string(),
                    });
                }
            }
            Err(error) => {
                tracing::debug!(page = *page_number, error = %error, "Skipping unextractable page");
            }
        }
    }

    tracing::debug!(pages = pages.len(), "Extracted PDF text");
    pages
}
