use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed document.xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("docx archive has no word/document.xml")]
    MissingDocumentXml,
}
