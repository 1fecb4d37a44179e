//! Text extraction: format-specific readers converting uploaded bytes to plain text.
//!
//! The infallible entry points ([`extract`], [`extract_pdf`], [`extract_docx`])
//! return an empty string when a document cannot be parsed; the `try_`
//! variants surface the reason.

mod docx;
mod error;
mod pdf;

pub use docx::{extract_docx, try_extract_docx};
pub use error::ExtractError;
pub use pdf::{extract_pdf, try_extract_pdf};

use lexstack_core::DocumentKind;

/// Decode plain text, dropping invalid UTF-8 sequences.
pub fn extract_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace('\u{FFFD}', "")
}

/// Extract text from `bytes` using the reader for `kind`.
pub fn extract(bytes: &[u8], kind: DocumentKind) -> String {
    match kind {
        DocumentKind::Pdf => extract_pdf(bytes),
        DocumentKind::Docx => extract_docx(bytes),
        DocumentKind::Text => extract_text(bytes),
    }
}

/// Like [`extract`], but reports why a document could not be read.
pub fn try_extract(bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractError> {
    match kind {
        DocumentKind::Pdf => try_extract_pdf(bytes),
        DocumentKind::Docx => try_extract_docx(bytes),
        DocumentKind::Text => Ok(extract_text(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(extract_text(b"Civil Appeal No. 42"), "Civil Appeal No. 42");
    }

    #[test]
    fn plain_text_drops_invalid_utf8() {
        assert_eq!(extract_text(b"ab\xffcd"), "abcd");
    }

    #[test]
    fn garbage_yields_empty_text_for_binary_formats() {
        let junk = b"definitely not a document";
        assert_eq!(extract(junk, DocumentKind::Pdf), "");
        assert_eq!(extract(junk, DocumentKind::Docx), "");
        assert!(try_extract(junk, DocumentKind::Pdf).is_err());
        assert!(try_extract(junk, DocumentKind::Docx).is_err());
    }

    #[test]
    fn text_dispatch() {
        assert_eq!(extract(b"hello", DocumentKind::Text), "hello");
        assert_eq!(try_extract(b"hello", DocumentKind::Text).unwrap(), "hello");
    }
}
