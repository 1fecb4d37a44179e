use serde::Deserialize;

use crate::ModelError;
use crate::estimator::check_dim;

/// Standard scaler fitted on the training embeddings: `(x - mean) / scale`.
///
/// Either statistic may be absent (`with_mean=False` / `with_std=False`).
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    #[serde(default)]
    mean: Option<Vec<f32>>,
    #[serde(default)]
    scale: Option<Vec<f32>>,
}

impl StandardScaler {
    pub fn new(mean: Option<Vec<f32>>, scale: Option<Vec<f32>>) -> Result<Self, ModelError> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Check that mean and scale agree on dimensionality.
    pub fn validate(&self) -> Result<(), ModelError> {
        if let (Some(mean), Some(scale)) = (&self.mean, &self.scale)
            && mean.len() != scale.len()
        {
            return Err(ModelError::invalid(
                "scaler",
                format!("mean has {} entries, scale has {}", mean.len(), scale.len()),
            ));
        }
        Ok(())
    }

    /// Feature count the scaler was fitted on, if it carries any statistics.
    pub fn n_features(&self) -> Option<usize> {
        self.mean
            .as_ref()
            .or(self.scale.as_ref())
            .map(|v| v.len())
    }

    pub fn transform(&self, x: &[f32]) -> Result<Vec<f32>, ModelError> {
        if let Some(n) = self.n_features() {
            check_dim(n, x)?;
        }
        let mut out = x.to_vec();
        if let Some(mean) = &self.mean {
            for (v, m) in out.iter_mut().zip(mean) {
                *v -= m;
            }
        }
        if let Some(scale) = &self.scale {
            for (v, s) in out.iter_mut().zip(scale) {
                // Zero-variance features are left unscaled.
                if *s != 0.0 {
                    *v /= s;
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centers_and_scales() {
        let scaler: StandardScaler =
            serde_json::from_str(r#"{"mean": [1.0, 2.0], "scale": [2.0, 0.5]}"#).unwrap();
        assert_eq!(scaler.transform(&[3.0, 3.0]).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn zero_scale_is_identity() {
        let scaler = StandardScaler::new(Some(vec![1.0]), Some(vec![0.0])).unwrap();
        assert_eq!(scaler.transform(&[4.0]).unwrap(), vec![3.0]);
    }

    #[test]
    fn mean_only_and_empty() {
        let scaler: StandardScaler = serde_json::from_str(r#"{"mean": [1.0]}"#).unwrap();
        assert_eq!(scaler.transform(&[1.5]).unwrap(), vec![0.5]);

        let identity: StandardScaler = serde_json::from_str("{}").unwrap();
        assert_eq!(identity.n_features(), None);
        assert_eq!(identity.transform(&[7.0, 8.0]).unwrap(), vec![7.0, 8.0]);
    }

    #[test]
    fn rejects_wrong_dimension() {
        let scaler = StandardScaler::new(Some(vec![0.0; 3]), Some(vec![1.0; 3])).unwrap();
        assert!(matches!(
            scaler.transform(&[1.0, 2.0]),
            Err(ModelError::Dimension {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn rejects_mismatched_statistics() {
        assert!(StandardScaler::new(Some(vec![0.0; 2]), Some(vec![1.0; 3])).is_err());
    }
}
