//! Loading the pretrained stacking ensemble from a model directory.
//!
//! ```text
//! models/
//!   scaler.json             {"mean": [..], "scale": [..]}
//!   stack_base_models.json  [{"name": "logreg", "model": {"kind": ..}}, ..]
//!   stack_meta_clf.json     {"kind": ..}
//!   labels.json             optional, {"0": "..", "1": ".."}
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::estimator::EstimatorSpec;
use crate::labels::LabelMap;
use crate::scaler::StandardScaler;
use crate::stacking::{NamedEstimator, StackingClassifier};

pub const SCALER_FILE: &str = "scaler.json";
pub const BASE_MODELS_FILE: &str = "stack_base_models.json";
pub const META_FILE: &str = "stack_meta_clf.json";
pub const LABELS_FILE: &str = "labels.json";

/// One entry of the ordered base-model list.
#[derive(Debug, Clone, Deserialize)]
pub struct BaseModelEntry {
    pub name: String,
    pub model: EstimatorSpec,
}

/// Validated classifier artifacts, ready to run.
pub struct ModelArtifacts {
    pub scaler: StandardScaler,
    pub stack: StackingClassifier,
    pub labels: LabelMap,
    pub dir: PathBuf,
}

impl ModelArtifacts {
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        anyhow::ensure!(dir.is_dir(), "model directory {dir:?} does not exist");

        let scaler: StandardScaler = read_json(&dir.join(SCALER_FILE))?;
        scaler.validate()?;

        let entries: Vec<BaseModelEntry> = read_json(&dir.join(BASE_MODELS_FILE))?;
        let meta: EstimatorSpec = read_json(&dir.join(META_FILE))?;
        let labels = LabelMap::load_or_default(&dir.join(LABELS_FILE))?;

        let mut base = Vec::with_capacity(entries.len());
        for BaseModelEntry { name, model } in entries {
            anyhow::ensure!(
                base.iter().all(|b: &NamedEstimator| b.name != name),
                "duplicate base model name {name:?}"
            );
            let estimator = model
                .build(&name, dir)
                .with_context(|| format!("building base model {name:?}"))?;
            base.push(NamedEstimator { name, estimator });
        }
        let meta = meta.build("meta", dir).context("building meta model")?;
        let stack = StackingClassifier::new(base, meta, labels.n_classes())?;

        if let (Some(scaled), Some(expected)) = (scaler.n_features(), stack.n_features()) {
            anyhow::ensure!(
                scaled == expected,
                "scaler has {scaled} features but base models expect {expected}"
            );
        }

        info!(
            dir = %dir.display(),
            base_models = ?stack.base_names().collect::<Vec<_>>(),
            classes = stack.n_classes(),
            "loaded stacking ensemble"
        );
        Ok(Self {
            scaler,
            stack,
            labels,
            dir: dir.to_path_buf(),
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Write a two-feature ensemble into `dir`.
    pub(crate) fn write_ensemble(dir: &Path, n_features: usize) {
        let ones = vec![1.0f32; n_features];
        let zeros = vec![0.0f32; n_features];
        let mut neg = vec![0.0f32; n_features];
        neg[0] = -1.0;

        std::fs::write(
            dir.join(SCALER_FILE),
            serde_json::json!({"mean": zeros, "scale": ones}).to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.join(BASE_MODELS_FILE),
            serde_json::json!([
                {"name": "logreg", "model": {"kind": "logistic_regression", "coef": [ones], "intercept": [0.0]}},
                {"name": "svc", "model": {"kind": "linear_svc", "coef": [neg]}},
                {"name": "centroid", "model": {"kind": "nearest_centroid", "centroids": [neg, ones]}},
            ])
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.join(META_FILE),
            r#"{"kind": "logistic_regression", "coef": [[-1, 1, -1, 1, -1, 1]], "intercept": [0]}"#,
        )
        .unwrap();
    }

    #[test]
    fn loads_ensemble_in_stored_order() {
        let dir = tempfile::tempdir().unwrap();
        write_ensemble(dir.path(), 4);

        let artifacts = ModelArtifacts::load(dir.path()).unwrap();
        let names: Vec<&str> = artifacts.stack.base_names().collect();
        assert_eq!(names, ["logreg", "svc", "centroid"]);
        assert_eq!(artifacts.stack.n_classes(), 2);
        assert_eq!(artifacts.scaler.n_features(), Some(4));
        assert_eq!(artifacts.labels, LabelMap::default());
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        write_ensemble(dir.path(), 2);
        std::fs::remove_file(dir.path().join(META_FILE)).unwrap();

        let err = ModelArtifacts::load(dir.path()).err().unwrap();
        assert!(format!("{err:#}").contains(META_FILE));
    }

    #[test]
    fn scaler_and_models_must_agree() {
        let dir = tempfile::tempdir().unwrap();
        write_ensemble(dir.path(), 2);
        std::fs::write(
            dir.path().join(SCALER_FILE),
            r#"{"mean": [0, 0, 0], "scale": [1, 1, 1]}"#,
        )
        .unwrap();
        assert!(ModelArtifacts::load(dir.path()).is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_ensemble(dir.path(), 1);
        std::fs::write(
            dir.path().join(BASE_MODELS_FILE),
            r#"[{"name": "a", "model": {"kind": "linear_svc", "coef": [[1]]}},
                {"name": "a", "model": {"kind": "linear_svc", "coef": [[1]]}},
                {"name": "b", "model": {"kind": "linear_svc", "coef": [[1]]}}]"#,
        )
        .unwrap();
        let err = ModelArtifacts::load(dir.path()).err().unwrap();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn missing_directory() {
        assert!(ModelArtifacts::load(Path::new("/nonexistent/lexstack/models")).is_err());
    }
}
