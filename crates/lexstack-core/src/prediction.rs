//! Prediction results and the JSON shapes returned by the classify endpoint.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Class probabilities produced by one base estimator of the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseModelOutput {
    pub name: String,
    pub probabilities: Vec<f32>,
}

/// Base estimator outputs in the stack's stored order.
///
/// Serialised as a JSON object (`{"name": [p0, p1]}`) whose key order
/// follows the stack, not alphabetical order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseModelOutputs(pub Vec<BaseModelOutput>);

impl BaseModelOutputs {
    pub fn get(&self, name: &str) -> Option<&[f32]> {
        self.0
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.probabilities.as_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BaseModelOutput> {
        self.0.iter()
    }
}

impl Serialize for BaseModelOutputs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for output in &self.0 {
            map.serialize_entry(&output.name, &output.probabilities)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BaseModelOutputs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = BaseModelOutputs;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of model name to probability list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut outputs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, probabilities)) = access.next_entry::<String, Vec<f32>>()? {
                    outputs.push(BaseModelOutput {
                        name,
                        probabilities,
                    });
                }
                Ok(BaseModelOutputs(outputs))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Final decision of the stacking classifier for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Human-readable label of the winning class.
    pub prediction: String,
    /// Probability of the winning class as a percentage, two decimals.
    pub confidence: f64,
    pub base_model_outputs: BaseModelOutputs,
}

impl Prediction {
    /// Convert a probability in `[0, 1]` into a percentage rounded to 2 decimals.
    pub fn confidence_percent(probability: f32) -> f64 {
        (f64::from(probability) * 100.0 * 100.0).round() / 100.0
    }
}

/// Successful response body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub filename: String,
    pub text_preview: String,
    pub result: Prediction,
}

/// Error response body: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs() -> BaseModelOutputs {
        BaseModelOutputs(vec![
            BaseModelOutput {
                name: "svc".into(),
                probabilities: vec![0.25, 0.75],
            },
            BaseModelOutput {
                name: "logreg".into(),
                probabilities: vec![0.5, 0.5],
            },
        ])
    }

    #[test]
    fn base_outputs_keep_stack_order() {
        let json = serde_json::to_string(&outputs()).unwrap();
        assert_eq!(json, r#"{"svc":[0.25,0.75],"logreg":[0.5,0.5]}"#);

        let parsed: BaseModelOutputs = serde_json::from_str(&json).unwrap();
        let names: Vec<&str> = parsed.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["svc", "logreg"]);
    }

    #[test]
    fn base_outputs_lookup_by_name() {
        let out = outputs();
        assert_eq!(out.get("logreg"), Some(&[0.5, 0.5][..]));
        assert_eq!(out.get("forest"), None);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn confidence_rounds_to_two_decimals() {
        assert_eq!(Prediction::confidence_percent(0.87234), 87.23);
        assert_eq!(Prediction::confidence_percent(0.5), 50.0);
        assert_eq!(Prediction::confidence_percent(1.0), 100.0);
        assert_eq!(Prediction::confidence_percent(0.123456), 12.35);
    }

    #[test]
    fn classify_response_shape() {
        let resp = ClassifyResponse {
            filename: "appeal.pdf".into(),
            text_preview: "in the high court".into(),
            result: Prediction {
                prediction: "appeal approved".into(),
                confidence: 91.5,
                base_model_outputs: outputs(),
            },
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["filename"], "appeal.pdf");
        assert_eq!(value["result"]["prediction"], "appeal approved");
        assert_eq!(value["result"]["confidence"], 91.5);
        assert_eq!(value["result"]["base_model_outputs"]["svc"][1], 0.75);
    }

    #[test]
    fn error_body_shape() {
        let json = serde_json::to_string(&ErrorBody::new("Uploaded file is empty")).unwrap();
        assert_eq!(json, r#"{"error":"Uploaded file is empty"}"#);
    }
}
