//! Uploaded documents and their format detection.

use std::fmt;

use thiserror::Error;

/// File formats the extractors understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    /// Office Open XML. Legacy `.doc` names are routed here as well and
    /// simply yield no text when the bytes are not a zip container.
    Docx,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported document type: {0:?}")]
pub struct UnsupportedDocument(pub String);

impl DocumentKind {
    /// Detect the kind from a file name by its (case-insensitive) extension.
    pub fn from_filename(name: &str) -> Result<Self, UnsupportedDocument> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" | "doc" => Ok(Self::Docx),
            "txt" => Ok(Self::Text),
            _ => Err(UnsupportedDocument(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Text => "txt",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document held for the duration of one request.
#[derive(Clone)]
pub struct Document {
    /// Lower-cased original file name.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(filename: &str, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.to_lowercase(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn kind(&self) -> Result<DocumentKind, UnsupportedDocument> {
        DocumentKind::from_filename(&self.filename)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}
