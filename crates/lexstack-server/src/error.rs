use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lexstack_core::ErrorBody;

pub type ServerResult<T> = Result<T, ServerError>;

/// Failures surfaced to API callers as `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Uploaded file is empty")]
    EmptyUpload,

    #[error("Only PDF or DOCX files are supported")]
    UnsupportedType,

    #[error("File contains too little readable text")]
    TooLittleText,

    #[error("{0}")]
    BadRequest(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("Uploaded file is too large")]
    PayloadTooLarge,

    #[error("Request timed out")]
    Timeout,

    #[error("Not found")]
    NotFound,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::EmptyUpload | ServerError::UnsupportedType | ServerError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::TooLittleText => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Prediction(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for ServerError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ServerError::PayloadTooLarge;
        }
        ServerError::BadRequest(format!("Invalid multipart upload: {}", err.body_text()))
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(format!("worker task failed: {err}"))
    }
}
