//! Inference layer: chunked transformer embeddings feeding a stacking ensemble
//! of pretrained estimators.

pub mod artifacts;
pub mod embedder;
mod error;
pub mod estimator;
pub mod labels;
pub mod predictor;
pub mod scaler;
pub mod stacking;
pub mod stub;

#[cfg(feature = "onnx")]
pub mod encoder;
#[cfg(feature = "onnx")]
pub use encoder::OnnxEncoder;

pub use artifacts::ModelArtifacts;
pub use embedder::{ChunkEncoder, embed_document};
pub use error::ModelError;
pub use estimator::{Estimator, EstimatorSpec, Scores};
pub use labels::LabelMap;
pub use predictor::{Predictor, PredictorConfig};
pub use scaler::StandardScaler;
pub use stacking::{StackOutput, StackingClassifier};
pub use stub::StubEncoder;
