use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("expected {expected} features, got {got}")]
    Dimension { expected: usize, got: usize },

    #[error("invalid {model} artifact: {reason}")]
    InvalidArtifact { model: String, reason: String },

    #[error("class index {0} has no label")]
    UnknownClass(usize),

    #[error("stack has no base estimators")]
    EmptyStack,

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Onnx(#[from] ort::Error),
}

impl ModelError {
    pub(crate) fn invalid(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArtifact {
            model: model.into(),
            reason: reason.into(),
        }
    }
}
