//! End-to-end inference: cleaned text in, labelled prediction out.

use std::path::PathBuf;

use lexstack_core::{Prediction, clean_text};
use tracing::{debug, info_span};

use crate::artifacts::ModelArtifacts;
use crate::embedder::{ChunkEncoder, DEFAULT_WINDOW, embed_document};
use crate::labels::LabelMap;
use crate::scaler::StandardScaler;
use crate::stacking::StackingClassifier;

#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Directory holding the classifier artifacts.
    pub models_dir: PathBuf,
    /// Directory holding `model.onnx` and `tokenizer.json`; defaults to `<models_dir>/encoder`.
    pub encoder_dir: Option<PathBuf>,
    pub chunk_window: usize,
}

impl PredictorConfig {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            encoder_dir: None,
            chunk_window: DEFAULT_WINDOW,
        }
    }

    pub fn encoder_dir(&self) -> PathBuf {
        self.encoder_dir
            .clone()
            .unwrap_or_else(|| self.models_dir.join("encoder"))
    }
}

/// The whole pipeline behind one handle. Encoders need `&mut` to run, so
/// callers sharing a predictor wrap it in a mutex.
pub struct Predictor {
    encoder: Box<dyn ChunkEncoder>,
    scaler: StandardScaler,
    stack: StackingClassifier,
    labels: LabelMap,
    window: usize,
}

impl Predictor {
    pub fn new(encoder: Box<dyn ChunkEncoder>, artifacts: ModelArtifacts, window: usize) -> Self {
        let ModelArtifacts {
            scaler,
            stack,
            labels,
            ..
        } = artifacts;
        Self {
            encoder,
            scaler,
            stack,
            labels,
            window,
        }
    }

    /// Load the ONNX encoder and the classifier artifacts.
    #[cfg(feature = "onnx")]
    pub fn load(config: &PredictorConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let artifacts = ModelArtifacts::load(&config.models_dir)?;
        let encoder_dir = config.encoder_dir();
        let encoder = crate::encoder::OnnxEncoder::load(&encoder_dir)
            .with_context(|| format!("loading encoder from {}", encoder_dir.display()))?;
        anyhow::ensure!(
            artifacts
                .scaler
                .n_features()
                .is_none_or(|n| n == encoder.hidden_size()),
            "encoder hidden size {} does not match the scaler",
            encoder.hidden_size()
        );
        Ok(Self::new(Box::new(encoder), artifacts, config.chunk_window))
    }

    pub fn base_model_names(&self) -> impl Iterator<Item = &str> {
        self.stack.base_names()
    }

    /// Classify raw document text.
    pub fn predict_text(&mut self, text: &str) -> anyhow::Result<Prediction> {
        let _span = info_span!("predict", chars = text.len()).entered();

        let cleaned = clean_text(text);
        let embedding = embed_document(self.encoder.as_mut(), &cleaned, self.window)?;
        let scaled = self.scaler.transform(&embedding)?;
        let out = self.stack.predict(&scaled)?;
        let label = self.labels.label(out.class)?;

        debug!(class = out.class, label, probability = out.probability, "prediction");
        Ok(Prediction {
            prediction: label.to_string(),
            confidence: Prediction::confidence_percent(out.probability),
            base_model_outputs: out.base_outputs,
        })
    }
}
