use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use lexstack_core::{ClassifyResponse, Document, DocumentKind, has_enough_text, preview};
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

/// `POST /predict`: classify an uploaded PDF or DOCX document.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ServerResult<Json<ClassifyResponse>> {
    let doc = read_upload(&mut multipart).await?;

    if doc.is_empty() {
        return Err(ServerError::EmptyUpload);
    }
    let kind = upload_kind(&doc.filename).ok_or(ServerError::UnsupportedType)?;

    let min_chars = state.config.min_text_chars;
    let preview_chars = state.config.preview_chars;
    let worker = state.clone();

    // Extraction and inference are CPU-bound; keep them off the runtime threads.
    let (filename, text, result) = tokio::task::spawn_blocking(move || {
        let text = lexstack_extract::extract(&doc.bytes, kind);
        if !has_enough_text(&text, min_chars) {
            return Err(ServerError::TooLittleText);
        }
        let result = worker
            .predict_text(&text)
            .map_err(|e| ServerError::Prediction(format!("{e:#}")))?;
        Ok((doc.filename, text, result))
    })
    .await??;

    info!(
        filename = %filename,
        %kind,
        prediction = %result.prediction,
        confidence = result.confidence,
        "classified document"
    );

    Ok(Json(ClassifyResponse {
        filename,
        text_preview: preview(&text, preview_chars),
        result,
    }))
}

async fn read_upload(multipart: &mut Multipart) -> ServerResult<Document> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Document::new(&filename, bytes.to_vec()));
    }
    warn!("upload without a `file` field");
    Err(ServerError::BadRequest(format!(
        "Missing multipart field `{FILE_FIELD}`"
    )))
}

/// Formats accepted over HTTP, by lower-cased file name.
fn upload_kind(filename: &str) -> Option<DocumentKind> {
    if filename.ends_with(".pdf") {
        Some(DocumentKind::Pdf)
    } else if filename.ends_with(".docx") {
        Some(DocumentKind::Docx)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pdf_and_docx_are_accepted() {
        assert_eq!(upload_kind("judgment.pdf"), Some(DocumentKind::Pdf));
        assert_eq!(upload_kind("order.docx"), Some(DocumentKind::Docx));
        assert_eq!(upload_kind("order.doc"), None);
        assert_eq!(upload_kind("notes.txt"), None);
        assert_eq!(upload_kind("pdf"), None);
    }
}
