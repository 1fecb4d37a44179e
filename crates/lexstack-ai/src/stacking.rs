//! Two-stage stacking ensemble.
//!
//! Each base estimator turns the scaled embedding into a class-probability
//! vector. The vectors are concatenated in the stack's stored order into one
//! meta-feature vector, and the meta estimator makes the final decision.

use lexstack_core::{BaseModelOutput, BaseModelOutputs};
use tracing::debug;

use crate::ModelError;
use crate::estimator::Estimator;

/// A base estimator together with the name it was stored under.
pub struct NamedEstimator {
    pub name: String,
    pub estimator: Box<dyn Estimator>,
}

/// Result of one pass through the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct StackOutput {
    /// Winning class index.
    pub class: usize,
    /// Meta-estimator probability of the winning class.
    pub probability: f32,
    /// Probability vector of each base estimator, in stack order.
    pub base_outputs: BaseModelOutputs,
}

pub struct StackingClassifier {
    base: Vec<NamedEstimator>,
    meta: Box<dyn Estimator>,
    n_classes: usize,
}

impl StackingClassifier {
    pub fn new(
        base: Vec<NamedEstimator>,
        meta: Box<dyn Estimator>,
        n_classes: usize,
    ) -> Result<Self, ModelError> {
        if base.is_empty() {
            return Err(ModelError::EmptyStack);
        }
        // The meta estimator consumes one probability per class per base model.
        if let Some(n) = meta.n_features() {
            let expected = base.len() * n_classes;
            if n != expected {
                return Err(ModelError::invalid(
                    "meta",
                    format!(
                        "expects {n} meta-features but {} base models x {n_classes} classes give {expected}",
                        base.len()
                    ),
                ));
            }
        }
        Ok(Self {
            base,
            meta,
            n_classes,
        })
    }

    /// Base estimator names in stack order.
    pub fn base_names(&self) -> impl Iterator<Item = &str> {
        self.base.iter().map(|b| b.name.as_str())
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Input dimensionality of the first base estimator that declares one.
    pub fn n_features(&self) -> Option<usize> {
        self.base.iter().find_map(|b| b.estimator.n_features())
    }

    /// Run the scaled embedding through the base estimators and the meta estimator.
    pub fn predict(&mut self, x: &[f32]) -> Result<StackOutput, ModelError> {
        let mut meta_features = Vec::with_capacity(self.base.len() * self.n_classes);
        let mut base_outputs = Vec::with_capacity(self.base.len());

        for NamedEstimator { name, estimator } in &mut self.base {
            let proba = estimator.scores(x)?.probabilities(self.n_classes)?;
            if proba.len() != self.n_classes {
                return Err(ModelError::invalid(
                    name.as_str(),
                    format!("returned {} probabilities for {} classes", proba.len(), self.n_classes),
                ));
            }
            debug!(model = %name, ?proba, "base estimator");
            meta_features.extend_from_slice(&proba);
            base_outputs.push(BaseModelOutput {
                name: name.clone(),
                probabilities: proba,
            });
        }

        let meta_proba = self.meta.scores(&meta_features)?.probabilities(self.n_classes)?;
        let (class, probability) = argmax(&meta_proba).ok_or(ModelError::EmptyStack)?;
        debug!(class, probability, "meta estimator");

        Ok(StackOutput {
            class,
            probability,
            base_outputs: BaseModelOutputs(base_outputs),
        })
    }
}

/// Index and value of the largest element; the first one wins ties.
fn argmax(v: &[f32]) -> Option<(usize, f32)> {
    v.iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, p)| match best {
            Some((_, bp)) if bp >= p => best,
            _ => Some((i, p)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{EstimatorSpec, Scores};
    use std::path::Path;

    fn est(json: &str) -> Box<dyn Estimator> {
        let spec: EstimatorSpec = serde_json::from_str(json).unwrap();
        spec.build("test", Path::new(".")).unwrap()
    }

    fn named(name: &str, json: &str) -> NamedEstimator {
        NamedEstimator {
            name: name.into(),
            estimator: est(json),
        }
    }

    /// Records what the meta estimator was fed.
    struct Recorder {
        seen: std::sync::Arc<std::sync::Mutex<Vec<f32>>>,
    }

    impl Estimator for Recorder {
        fn n_features(&self) -> Option<usize> {
            None
        }

        fn scores(&mut self, x: &[f32]) -> Result<Scores, ModelError> {
            *self.seen.lock().unwrap() = x.to_vec();
            Ok(Scores::Probabilities(vec![0.2, 0.8]))
        }
    }

    fn stack() -> StackingClassifier {
        StackingClassifier::new(
            vec![
                named("logreg", r#"{"kind": "logistic_regression", "coef": [[1.0, 0.0]]}"#),
                named("svc", r#"{"kind": "linear_svc", "coef": [[0.0, 1.0]]}"#),
                named(
                    "centroid",
                    r#"{"kind": "nearest_centroid", "centroids": [[-1.0, -1.0], [1.0, 1.0]]}"#,
                ),
            ],
            // Trusts only the centroid model's positive-class column.
            est(r#"{"kind": "logistic_regression", "coef": [[0, 0, 0, 0, -8, 8]], "intercept": [0]}"#),
            2,
        )
        .unwrap()
    }

    #[test]
    fn base_outputs_follow_stack_order() {
        let out = stack().predict(&[0.5, 0.5]).unwrap();
        let names: Vec<&str> = out.base_outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["logreg", "svc", "centroid"]);
        assert_eq!(out.base_outputs.get("centroid"), Some(&[0.0, 1.0][..]));
        for o in out.base_outputs.iter() {
            assert!((o.probabilities.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn meta_decides_class_and_confidence() {
        let mut clf = stack();

        let pos = clf.predict(&[0.9, 0.9]).unwrap();
        assert_eq!(pos.class, 1);
        assert!(pos.probability > 0.99);

        let neg = clf.predict(&[-0.9, -0.9]).unwrap();
        assert_eq!(neg.class, 0);
        assert!(neg.probability > 0.99);
    }

    #[test]
    fn meta_features_are_concatenated_probabilities() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut clf = StackingClassifier::new(
            vec![
                named("a", r#"{"kind": "nearest_centroid", "centroids": [[0.0], [1.0]]}"#),
                named("b", r#"{"kind": "nearest_centroid", "centroids": [[1.0], [0.0]]}"#),
            ],
            Box::new(Recorder { seen: seen.clone() }),
            2,
        )
        .unwrap();

        let out = clf.predict(&[0.9]).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0.0, 1.0, 1.0, 0.0]);
        assert_eq!(out.class, 1);
        assert!((out.probability - 0.8).abs() < 1e-6);
    }

    #[test]
    fn rejects_empty_stack() {
        let meta = est(r#"{"kind": "logistic_regression", "coef": [[1.0, 1.0]]}"#);
        assert!(matches!(
            StackingClassifier::new(vec![], meta, 2),
            Err(ModelError::EmptyStack)
        ));
    }

    #[test]
    fn rejects_meta_with_wrong_width() {
        let result = StackingClassifier::new(
            vec![named("a", r#"{"kind": "linear_svc", "coef": [[1.0]]}"#)],
            est(r#"{"kind": "logistic_regression", "coef": [[1.0, 1.0, 1.0]]}"#),
            2,
        );
        assert!(matches!(result, Err(ModelError::InvalidArtifact { .. })));
    }

    #[test]
    fn propagates_dimension_errors() {
        assert!(matches!(
            stack().predict(&[1.0, 2.0, 3.0]),
            Err(ModelError::Dimension { .. })
        ));
    }

    #[test]
    fn argmax_first_wins_ties() {
        assert_eq!(argmax(&[0.5, 0.5]), Some((0, 0.5)));
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some((1, 0.7)));
        assert_eq!(argmax(&[]), None);
    }
}
