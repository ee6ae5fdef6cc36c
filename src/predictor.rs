//! Regression model wrapper.
//!
//! A model artifact is a JSON document tagged by `kind`. Two shapes are
//! understood: a linear model over the five features and an ensemble of
//! regression trees (averaged or summed).

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ForecastError, Result};
use crate::models::FeatureVector;

pub trait Predictor {
    /// Raw model estimate for the next day's ticket volume.
    fn predict(&self, features: &FeatureVector) -> f64;

    fn describe(&self) -> String;
}

/// Runs the model and converts its estimate into a ticket count.
///
/// The estimate is truncated toward zero. Negative estimates become zero;
/// non-finite estimates mean the model is unusable.
pub fn predict_ticket_count(predictor: &dyn Predictor, features: &FeatureVector) -> Result<u32> {
    let estimate = predictor.predict(features);
    if !estimate.is_finite() {
        return Err(ForecastError::ModelUnavailable(format!(
            "model returned non-finite estimate {estimate} for features {:?}",
            features.values()
        )));
    }

    let truncated = estimate.trunc();
    if truncated < 0.0 {
        warn!(estimate, "negative prediction clamped to zero");
        return Ok(0);
    }

    Ok(truncated.min(f64::from(u32::MAX)) as u32)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Mean,
    Sum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

pub fn load_model(path: &Path) -> Result<Box<dyn Predictor>> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        ForecastError::ModelUnavailable(format!("cannot read {}: {err}", path.display()))
    })?;
    let model = parse_model(&raw).map_err(|err| match err {
        ForecastError::ModelUnavailable(reason) => {
            ForecastError::ModelUnavailable(format!("{}: {reason}", path.display()))
        }
        other => other,
    })?;
    info!(path = %path.display(), model = %model.describe(), "loaded model");
    Ok(model)
}

pub fn parse_model(raw: &str) -> Result<Box<dyn Predictor>> {
    let artifact: ModelArtifact = serde_json::from_str(raw)
        .map_err(|err| ForecastError::ModelUnavailable(format!("malformed artifact: {err}")))?;
    artifact.validate()?;

    let predictor: Box<dyn Predictor> = match artifact {
        ModelArtifact::Linear(model) => Box::new(model),
        ModelArtifact::TreeEnsemble(model) => Box::new(model),
    };
    Ok(predictor)
}

impl ModelArtifact {
    fn validate(&self) -> Result<()> {
        match self {
            ModelArtifact::Linear(model) => model.validate(),
            ModelArtifact::TreeEnsemble(model) => model.validate(),
        }
    }
}

fn unavailable(reason: impl Into<String>) -> ForecastError {
    ForecastError::ModelUnavailable(reason.into())
}

impl LinearModel {
    fn validate(&self) -> Result<()> {
        if self.coefficients.len() != FeatureVector::LEN {
            return Err(unavailable(format!(
                "linear model needs {} coefficients, found {}",
                FeatureVector::LEN,
                self.coefficients.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(unavailable("linear model has non-finite parameters"));
        }
        Ok(())
    }
}

impl Predictor for LinearModel {
    fn predict(&self, features: &FeatureVector) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.values())
                .map(|(coef, value)| coef * value)
                .sum::<f64>()
    }

    fn describe(&self) -> String {
        format!("linear (intercept {:.3})", self.intercept)
    }
}

impl TreeEnsemble {
    fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(unavailable("tree ensemble has no trees"));
        }
        if !self.base_score.is_finite() {
            return Err(unavailable("tree ensemble has a non-finite base score"));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|reason| unavailable(format!("tree {index}: {reason}")))?;
        }
        Ok(())
    }
}

impl Predictor for TreeEnsemble {
    fn predict(&self, features: &FeatureVector) -> f64 {
        let total: f64 = self.trees.iter().map(|tree| tree.evaluate(features)).sum();
        match self.aggregation {
            Aggregation::Mean => total / self.trees.len() as f64,
            Aggregation::Sum => self.base_score + total,
        }
    }

    fn describe(&self) -> String {
        let aggregation = match self.aggregation {
            Aggregation::Mean => "mean",
            Aggregation::Sum => "sum",
        };
        format!("tree ensemble ({} trees, {aggregation})", self.trees.len())
    }
}

impl RegressionTree {
    /// Children must point forward so every walk from the root ends on a leaf.
    fn validate(&self) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= FeatureVector::LEN {
                        return Err(format!("node {index} splits on unknown feature {feature}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {index} has a non-finite threshold"));
                    }
                    for child in [left, right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(format!("node {index} has invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {index} has a non-finite value"));
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, features: &FeatureVector) -> f64 {
        let values = features.values();
        let mut index = 0;
        loop {
            match self.nodes[index] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if values[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl Predictor for Fixed {
        fn predict(&self, _features: &FeatureVector) -> f64 {
            self.0
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    fn features() -> FeatureVector {
        FeatureVector([2.0, 0.0, 19.0, 20.0, 21.857])
    }

    #[test]
    fn truncates_toward_zero() {
        assert_eq!(predict_ticket_count(&Fixed(17.9), &features()).unwrap(), 17);
        assert_eq!(predict_ticket_count(&Fixed(3.0), &features()).unwrap(), 3);
    }

    #[test]
    fn clamps_negative_estimates() {
        assert_eq!(predict_ticket_count(&Fixed(-0.4), &features()).unwrap(), 0);
        assert_eq!(predict_ticket_count(&Fixed(-12.0), &features()).unwrap(), 0);
    }

    #[test]
    fn non_finite_estimate_is_model_unavailable() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                predict_ticket_count(&Fixed(value), &features()),
                Err(ForecastError::ModelUnavailable(_))
            ));
        }
    }

    #[test]
    fn linear_model_is_dot_product_plus_intercept() {
        let model = parse_model(
            r#"{"kind":"linear","intercept":1.5,"coefficients":[0.5,-3.0,0.25,0.25,0.5]}"#,
        )
        .unwrap();
        let estimate = model.predict(&FeatureVector([2.0, 1.0, 8.0, 4.0, 10.0]));
        assert!((estimate - (1.5 + 1.0 - 3.0 + 2.0 + 1.0 + 5.0)).abs() < 1e-9);
    }

    #[test]
    fn tree_ensemble_averages_or_sums() {
        let trees = r#"[
            {"nodes":[{"feature":1,"threshold":0.5,"left":1,"right":2},{"value":20.0},{"value":8.0}]},
            {"nodes":[{"value":10.0}]}
        ]"#;
        let mean = parse_model(&format!(r#"{{"kind":"tree_ensemble","trees":{trees}}}"#)).unwrap();
        let sum = parse_model(&format!(
            r#"{{"kind":"tree_ensemble","aggregation":"sum","base_score":2.0,"trees":{trees}}}"#
        ))
        .unwrap();

        let weekday = FeatureVector([1.0, 0.0, 5.0, 5.0, 5.0]);
        let weekend = FeatureVector([6.0, 1.0, 5.0, 5.0, 5.0]);
        assert!((mean.predict(&weekday) - 15.0).abs() < 1e-9);
        assert!((mean.predict(&weekend) - 9.0).abs() < 1e-9);
        assert!((sum.predict(&weekday) - 32.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_invalid_artifacts() {
        let cases = [
            "not json",
            r#"{"kind":"svm"}"#,
            r#"{"kind":"linear","intercept":0.0,"coefficients":[1.0,2.0]}"#,
            r#"{"kind":"tree_ensemble","trees":[]}"#,
            r#"{"kind":"tree_ensemble","trees":[{"nodes":[{"feature":9,"threshold":1.0,"left":1,"right":2},{"value":1.0},{"value":2.0}]}]}"#,
            r#"{"kind":"tree_ensemble","trees":[{"nodes":[{"feature":0,"threshold":1.0,"left":0,"right":1},{"value":1.0}]}]}"#,
        ];
        for raw in cases {
            assert!(
                matches!(parse_model(raw), Err(ForecastError::ModelUnavailable(_))),
                "accepted {raw}"
            );
        }
    }

    #[test]
    fn missing_file_is_model_unavailable() {
        let result = load_model(Path::new("/nonexistent/load_model.json"));
        assert!(matches!(result, Err(ForecastError::ModelUnavailable(_))));
    }
}
