//! Pretrained estimators of the stacking ensemble.
//!
//! Artifacts are JSON documents tagged by `kind`, exported from the
//! scikit-learn models the ensemble was trained with. Each estimator reports
//! the strongest output it has ([`Scores`]); [`Scores::probabilities`] turns
//! any of them into a class-probability vector:
//!
//! 1. probabilities are used as-is,
//! 2. decision scores go through a softmax (a single binary score `d`
//!    becomes `[-d, d]` first),
//! 3. a bare predicted label becomes a one-hot vector.

use std::path::Path;

use serde::Deserialize;

use crate::ModelError;

/// Raw output of one estimator for one sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Scores {
    Probabilities(Vec<f32>),
    Decision(Vec<f32>),
    Label(usize),
}

impl Scores {
    /// Convert into a probability vector over `n_classes` classes.
    pub fn probabilities(self, n_classes: usize) -> Result<Vec<f32>, ModelError> {
        match self {
            Scores::Probabilities(p) => Ok(p),
            Scores::Decision(d) if d.len() == 1 => Ok(softmax(&[-d[0], d[0]])),
            Scores::Decision(d) => Ok(softmax(&d)),
            Scores::Label(label) => {
                if label >= n_classes {
                    return Err(ModelError::UnknownClass(label));
                }
                let mut one_hot = vec![0.0f32; n_classes];
                one_hot[label] = 1.0;
                Ok(one_hot)
            }
        }
    }
}

/// A pretrained classifier evaluated on one feature vector at a time.
pub trait Estimator: Send {
    /// Expected input dimensionality, when the artifact declares it.
    fn n_features(&self) -> Option<usize>;

    fn scores(&mut self, x: &[f32]) -> Result<Scores, ModelError>;
}

/// Serialized estimator artifact.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorSpec {
    /// Logistic regression: `predict_proba` available.
    LogisticRegression(LinearParams),
    /// Linear SVM: decision function only.
    LinearSvc(LinearParams),
    /// Nearest centroid: predicted label only.
    NearestCentroid(CentroidParams),
    /// sklearn-onnx export with a probability tensor output.
    #[cfg(feature = "onnx")]
    Onnx(crate::encoder::OnnxEstimatorParams),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearParams {
    /// One row per class, or a single row for a binary problem.
    pub coef: Vec<Vec<f32>>,
    #[serde(default)]
    pub intercept: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CentroidParams {
    /// One centroid per class, indexed by class.
    pub centroids: Vec<Vec<f32>>,
}

impl EstimatorSpec {
    /// Validate the artifact and build a runnable estimator.
    ///
    /// `base_dir` resolves relative paths of file-backed artifacts.
    #[cfg_attr(not(feature = "onnx"), allow(unused_variables))]
    pub fn build(self, name: &str, base_dir: &Path) -> Result<Box<dyn Estimator>, ModelError> {
        match self {
            EstimatorSpec::LogisticRegression(p) => {
                Ok(Box::new(LinearModel::new(name, p, Link::Logistic)?))
            }
            EstimatorSpec::LinearSvc(p) => Ok(Box::new(LinearModel::new(name, p, Link::Decision)?)),
            EstimatorSpec::NearestCentroid(p) => Ok(Box::new(NearestCentroid::new(name, p)?)),
            #[cfg(feature = "onnx")]
            EstimatorSpec::Onnx(p) => Ok(Box::new(crate::encoder::OnnxEstimator::load(
                name, p, base_dir,
            )?)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Logistic,
    Decision,
}

/// Linear model `coef · x + intercept`, one row per class.
pub struct LinearModel {
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
    n_features: usize,
    link: Link,
}

impl LinearModel {
    fn new(name: &str, params: LinearParams, link: Link) -> Result<Self, ModelError> {
        let LinearParams { coef, intercept } = params;
        let n_features = coef
            .first()
            .map(|row| row.len())
            .ok_or_else(|| ModelError::invalid(name, "coef is empty"))?;
        if n_features == 0 || coef.iter().any(|row| row.len() != n_features) {
            return Err(ModelError::invalid(name, "coef rows must be non-empty and equal length"));
        }
        let intercept = if intercept.is_empty() {
            vec![0.0; coef.len()]
        } else if intercept.len() == coef.len() {
            intercept
        } else {
            return Err(ModelError::invalid(
                name,
                format!("{} intercepts for {} coef rows", intercept.len(), coef.len()),
            ));
        };
        Ok(Self {
            coef,
            intercept,
            n_features,
            link,
        })
    }

    fn decision(&self, x: &[f32]) -> Result<Vec<f32>, ModelError> {
        check_dim(self.n_features, x)?;
        Ok(self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| dot(row, x) + b)
            .collect())
    }
}

impl Estimator for LinearModel {
    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn scores(&mut self, x: &[f32]) -> Result<Scores, ModelError> {
        let d = self.decision(x)?;
        Ok(match self.link {
            Link::Decision => Scores::Decision(d),
            Link::Logistic if d.len() == 1 => {
                let p = sigmoid(d[0]);
                Scores::Probabilities(vec![1.0 - p, p])
            }
            Link::Logistic => Scores::Probabilities(softmax(&d)),
        })
    }
}

/// Predicts the class whose centroid is closest in Euclidean distance.
pub struct NearestCentroid {
    centroids: Vec<Vec<f32>>,
    n_features: usize,
}

impl NearestCentroid {
    fn new(name: &str, params: CentroidParams) -> Result<Self, ModelError> {
        let n_features = params
            .centroids
            .first()
            .map(|c| c.len())
            .ok_or_else(|| ModelError::invalid(name, "no centroids"))?;
        if params.centroids.iter().any(|c| c.len() != n_features) {
            return Err(ModelError::invalid(name, "centroids differ in length"));
        }
        Ok(Self {
            centroids: params.centroids,
            n_features,
        })
    }
}

impl Estimator for NearestCentroid {
    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn scores(&mut self, x: &[f32]) -> Result<Scores, ModelError> {
        check_dim(self.n_features, x)?;
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (class, centroid) in self.centroids.iter().enumerate() {
            let dist: f32 = centroid.iter().zip(x).map(|(c, v)| (c - v) * (c - v)).sum();
            if dist < best_dist {
                best_dist = dist;
                best = class;
            }
        }
        Ok(Scores::Label(best))
    }
}

pub(crate) fn check_dim(expected: usize, x: &[f32]) -> Result<(), ModelError> {
    if x.len() != expected {
        return Err(ModelError::Dimension {
            expected,
            got: x.len(),
        });
    }
    Ok(())
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn sigmoid(z: f32) -> f32 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Numerically stable softmax.
pub(crate) fn softmax(z: &[f32]) -> Vec<f32> {
    let max = z.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = z.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|v| v / sum).collect()
}
