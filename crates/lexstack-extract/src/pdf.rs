//! PDF text extraction with lopdf.

use lopdf::Document;
use tracing::{debug, warn};

use crate::ExtractError;

/// Extract the text of every page, in page order.
///
/// Returns an empty string when the bytes are not a readable PDF.
pub fn extract_pdf(bytes: &[u8]) -> String {
    match try_extract_pdf(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "pdf parse failed, treating as empty");
            String::new()
        }
    }
}

/// Extract the text of every page, failing when the document cannot be loaded.
///
/// Pages whose content cannot be decoded are skipped. Each page that yields
/// text contributes that text followed by a newline.
pub fn try_extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let document = Document::load_mem(bytes)?;
    let pages = document.get_pages();

    let mut text = String::new();
    for &page_number in pages.keys() {
        match document.extract_text(&[page_number]) {
            Ok(page_text) if !page_text.is_empty() => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Ok(_) => {}
            Err(e) => debug!(page = page_number, error = %e, "skipping unreadable page"),
        }
    }

    debug!(pages = pages.len(), chars = text.len(), "extracted pdf text");
    Ok(text)
}
