//! ONNX Runtime backends: the transformer encoder and sklearn-onnx estimators.
//!
//! The encoder directory must contain `model.onnx` (a BERT-family export with
//! `input_ids`, `attention_mask` and `token_type_ids` inputs and
//! `last_hidden_state` as its first output) and `tokenizer.json`.

use std::path::{Path, PathBuf};

use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::info;

use crate::ModelError;
use crate::embedder::ChunkEncoder;
use crate::estimator::{Estimator, Scores, check_dim};

/// Hidden size of BERT-base encoders, used when the export has a dynamic last axis.
const DEFAULT_HIDDEN: usize = 768;

/// Transformer encoder pooled at the `[CLS]` position.
pub struct OnnxEncoder {
    session: Session,
    tokenizer: Tokenizer,
    hidden: usize,
}

impl OnnxEncoder {
    /// Load an encoder from a directory containing `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let hidden = infer_dim(session.outputs()[0].dtype()).unwrap_or(DEFAULT_HIDDEN);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;

        // Whole documents are tokenized; windowing happens afterwards.
        tokenizer
            .with_truncation(None)
            .map_err(|e| anyhow::anyhow!("disable truncation: {e}"))?;
        tokenizer.with_padding(None);

        info!(hidden, model = %model_path.display(), "loaded encoder");
        Ok(Self {
            session,
            tokenizer,
            hidden,
        })
    }
}

impl ChunkEncoder for OnnxEncoder {
    fn hidden_size(&self) -> usize {
        self.hidden
    }

    fn tokenize(&self, text: &str) -> anyhow::Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn encode_chunk(&mut self, ids: &[u32]) -> anyhow::Result<Vec<f32>> {
        let len = ids.len();
        let shape = [1i64, len as i64];

        let input_ids: Vec<i64> = ids.iter().map(|&id| i64::from(id)).collect();
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, vec![1i64; len].into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, vec![0i64; len].into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        // last_hidden_state: [1, len, hidden]
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] == 1 && dims[2] as usize == self.hidden,
            "unexpected output shape: {dims:?}, expected [1, {len}, {}]",
            self.hidden
        );

        Ok(output_data[..self.hidden].to_vec())
    }
}

/// Artifact of an estimator exported with sklearn-onnx.
///
/// Classifiers must be exported with `options={"zipmap": False}` so that the
/// probability output is a plain `[1, n_classes]` tensor.
#[derive(Debug, Clone, Deserialize)]
pub struct OnnxEstimatorParams {
    /// Model file, relative to the model directory.
    pub path: PathBuf,
    #[serde(default = "default_input")]
    pub input: String,
    /// Output holding the `[1, n_classes]` probability tensor.
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default)]
    pub n_features: Option<usize>,
}

fn default_input() -> String {
    "float_input".into()
}

fn default_output() -> String {
    "output_probability".into()
}

pub struct OnnxEstimator {
    name: String,
    session: Session,
    input: String,
    output: String,
    n_features: Option<usize>,
}

impl OnnxEstimator {
    pub(crate) fn load(
        name: &str,
        params: OnnxEstimatorParams,
        base_dir: &Path,
    ) -> Result<Self, ModelError> {
        let path = base_dir.join(&params.path);
        if !path.exists() {
            return Err(ModelError::invalid(
                name,
                format!("{} not found", path.display()),
            ));
        }
        let session = Session::builder()?.commit_from_file(&path)?;

        if !session.inputs().iter().any(|i| i.name() == params.input) {
            return Err(ModelError::invalid(
                name,
                format!("{} has no input named {:?}", path.display(), params.input),
            ));
        }
        let outputs: Vec<(&str, bool)> = session
            .outputs()
            .iter()
            .map(|o| (o.name(), matches!(o.dtype(), ort::value::ValueType::Tensor { .. })))
            .collect();
        check_output(name, &params.output, &outputs)?;

        info!(model = name, path = %path.display(), "loaded onnx estimator");
        Ok(Self {
            name: name.to_string(),
            session,
            input: params.input,
            output: params.output,
            n_features: params.n_features,
        })
    }
}

impl Estimator for OnnxEstimator {
    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn scores(&mut self, x: &[f32]) -> Result<Scores, ModelError> {
        if let Some(n) = self.n_features {
            check_dim(n, x)?;
        }
        let tensor = Tensor::from_array(([1i64, x.len() as i64], x.to_vec().into_boxed_slice()))?;
        let outputs = self
            .session
            .run(ort::inputs![self.input.as_str() => tensor])?;
        let value = outputs.get(self.output.as_str()).ok_or_else(|| {
            ModelError::invalid(&self.name, format!("no output named {:?}", self.output))
        })?;
        let (_, data) = value.try_extract_tensor::<f32>()?;
        Ok(Scores::Probabilities(data.to_vec()))
    }
}

/// The probability output must exist and be a tensor rather than a ZipMap.
fn check_output(model: &str, wanted: &str, outputs: &[(&str, bool)]) -> Result<(), ModelError> {
    match outputs.iter().find(|(name, _)| *name == wanted) {
        Some((_, true)) => Ok(()),
        Some((_, false)) => Err(ModelError::invalid(
            model,
            format!("output {wanted:?} is not a tensor; export with zipmap=False"),
        )),
        None => {
            let names: Vec<&str> = outputs.iter().map(|(name, _)| *name).collect();
            Err(ModelError::invalid(
                model,
                format!("no output named {wanted:?}, model has {names:?}"),
            ))
        }
    }
}

/// Try to infer the hidden size from the ONNX model output type.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}
