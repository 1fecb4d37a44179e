//! Outcome labels keyed by the meta-classifier's class index.
//!
//! The ensemble is trained on appeal outcomes: class 0 is a rejected appeal,
//! class 1 an approved one. A `labels.json` next to the model artifacts
//! (`{"0": "...", "1": "..."}`) overrides the defaults.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::ModelError;

/// Default outcome labels of the appeal classifier.
pub const DEFAULT_LABELS: &[(usize, &str)] = &[(0, "appeal rejected"), (1, "appeal approved")];

/// Class index → human-readable label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LabelMap {
    labels: BTreeMap<usize, String>,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS
                .iter()
                .map(|&(class, label)| (class, label.to_string()))
                .collect(),
        }
    }
}

impl LabelMap {
    pub fn new(labels: impl IntoIterator<Item = (usize, String)>) -> Self {
        Self {
            labels: labels.into_iter().collect(),
        }
    }

    /// Read a label file, or fall back to the defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let labels: LabelMap =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        anyhow::ensure!(!labels.is_empty(), "{} defines no labels", path.display());
        Ok(labels)
    }

    pub fn label(&self, class: usize) -> Result<&str, ModelError> {
        self.labels
            .get(&class)
            .map(String::as_str)
            .ok_or(ModelError::UnknownClass(class))
    }

    /// Number of classes: one past the highest labelled index.
    pub fn n_classes(&self) -> usize {
        self.labels.keys().next_back().map_or(0, |&max| max + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().map(|(&k, v)| (k, v.as_str()))
    }
}
