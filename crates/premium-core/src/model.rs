//! Classifier seam and the JSON linear model artifact.
//!
//! Artifact layout:
//! - `numeric`: standardized as `(x - mean) / scale`, in declared order
//! - `categorical`: one-hot per declared category, unknown value -> all zeros
//! - `coef` / `intercept`: one row per class, `score = coef . x + intercept`
//!
//! `linear_softmax` artifacts expose probabilities; `linear_margin` artifacts
//! only expose the arg-max label.

use crate::features::{ColumnValue, DerivedFeatures, FeatureColumn};
use crate::util::{argmax, softmax};
use anyhow::{anyhow, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Class labels used when an artifact does not list its own.
pub const FALLBACK_CLASSES: [&str; 3] = ["Low", "Medium", "High"];

pub trait Classifier: Send + Sync + fmt::Debug {
    /// Category label for one derived record.
    fn predict(&self, row: &DerivedFeatures) -> Result<String>;

    /// Probability handle of the same artifact, `None` when it has no
    /// probability output. Resolved once by `ModelRuntime` at load.
    fn proba_handle(self: Arc<Self>) -> Option<Arc<dyn ProbaClassifier>> {
        None
    }
}

pub trait ProbaClassifier: Send + Sync + fmt::Debug {
    /// Label order of `predict_proba` output.
    fn classes(&self) -> &[String];

    fn predict_proba(&self, row: &DerivedFeatures) -> Result<Vec<f64>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LinearSoftmax,
    LinearMargin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericSpec {
    pub column: String,
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "one")]
    pub scale: f64,
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalSpec {
    pub column: String,
    pub categories: Vec<String>,
}

/// On-disk form of the model (`model.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub kind: ModelKind,
    #[serde(default)]
    pub classes: Option<Vec<String>>,
    #[serde(default)]
    pub numeric: Vec<NumericSpec>,
    #[serde(default)]
    pub categorical: Vec<CategoricalSpec>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

#[derive(Debug, Clone)]
struct NumericInput {
    column: FeatureColumn,
    mean: f64,
    scale: f64,
}

#[derive(Debug, Clone)]
struct OneHotInput {
    column: FeatureColumn,
    categories: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LinearModel {
    kind: ModelKind,
    classes: Vec<String>,
    numeric: Vec<NumericInput>,
    one_hot: Vec<OneHotInput>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    width: usize,
}

impl LinearModel {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let artifact: ModelArtifact = serde_json::from_str(s).context("parse model artifact")?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(a: ModelArtifact) -> Result<Self> {
        let n_rows = a.coef.len();
        ensure!(n_rows > 0, "model artifact has no class rows");
        ensure!(
            a.intercept.len() == n_rows,
            "intercept len {} != coef rows {}",
            a.intercept.len(),
            n_rows
        );

        let classes = match a.classes {
            Some(classes) => {
                ensure!(
                    classes.len() == n_rows,
                    "classes len {} != coef rows {}",
                    classes.len(),
                    n_rows
                );
                classes
            }
            None => {
                ensure!(
                    n_rows == FALLBACK_CLASSES.len(),
                    "model artifact has no classes and {n_rows} class rows, cannot apply fallback labels"
                );
                tracing::warn!(
                    classes = ?FALLBACK_CLASSES,
                    "model artifact has no classes, using fallback labels"
                );
                FALLBACK_CLASSES.iter().map(|c| c.to_string()).collect()
            }
        };

        let mut numeric = Vec::with_capacity(a.numeric.len());
        for spec in a.numeric {
            let column = resolve_column(&spec.column)?;
            ensure!(
                column.is_numeric(),
                "column '{}' is categorical and cannot be standardized",
                spec.column
            );
            ensure!(
                spec.scale.is_finite() && spec.scale > 0.0,
                "column '{}' scale must be positive, got {}",
                spec.column,
                spec.scale
            );
            ensure!(spec.mean.is_finite(), "column '{}' mean is not finite", spec.column);
            numeric.push(NumericInput {
                column,
                mean: spec.mean,
                scale: spec.scale,
            });
        }

        let mut one_hot = Vec::with_capacity(a.categorical.len());
        for spec in a.categorical {
            let column = resolve_column(&spec.column)?;
            ensure!(
                !spec.categories.is_empty(),
                "column '{}' has no categories",
                spec.column
            );
            one_hot.push(OneHotInput {
                column,
                categories: spec.categories,
            });
        }

        let width = numeric.len() + one_hot.iter().map(|o| o.categories.len()).sum::<usize>();
        for (i, row) in a.coef.iter().enumerate() {
            ensure!(
                row.len() == width,
                "coef row {i} ({}) has {} weights, encoded width is {width}",
                classes[i],
                row.len()
            );
        }

        Ok(Self {
            kind: a.kind,
            classes,
            numeric,
            one_hot,
            coef: a.coef,
            intercept: a.intercept,
            width,
        })
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn labels(&self) -> &[String] {
        &self.classes
    }

    /// Dense input vector in artifact order.
    pub fn encode(&self, row: &DerivedFeatures) -> Vec<f64> {
        let mut x = Vec::with_capacity(self.width);
        for n in &self.numeric {
            let v = match row.value(n.column) {
                ColumnValue::Number(v) => v,
                // rejected at load time
                ColumnValue::Category(_) => f64::NAN,
            };
            x.push((v - n.mean) / n.scale);
        }
        for o in &self.one_hot {
            let value = category_of(row.value(o.column));
            x.extend(
                o.categories
                    .iter()
                    .map(|c| if *c == value { 1.0 } else { 0.0 }),
            );
        }
        x
    }

    pub fn scores(&self, row: &DerivedFeatures) -> Vec<f64> {
        let x = self.encode(row);
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(w, b)| w.iter().zip(&x).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect()
    }
}

impl Classifier for LinearModel {
    fn predict(&self, row: &DerivedFeatures) -> Result<String> {
        let scores = self.scores(row);
        let best = argmax(&scores).ok_or_else(|| anyhow!("model produced no scores"))?;
        Ok(self.classes[best].clone())
    }

    fn proba_handle(self: Arc<Self>) -> Option<Arc<dyn ProbaClassifier>> {
        match self.kind {
            ModelKind::LinearSoftmax => Some(self as Arc<dyn ProbaClassifier>),
            ModelKind::LinearMargin => None,
        }
    }
}

impl ProbaClassifier for LinearModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, row: &DerivedFeatures) -> Result<Vec<f64>> {
        let p = softmax(&self.scores(row));
        ensure!(
            p.iter().all(|v| v.is_finite()),
            "probabilities are not finite"
        );
        Ok(p)
    }
}

fn resolve_column(name: &str) -> Result<FeatureColumn> {
    FeatureColumn::from_name(name).ok_or_else(|| anyhow!("unknown feature column '{name}'"))
}

/// Category string of a column value; whole numbers print without a fraction
/// so `city_tier` can be one-hot encoded as "1" / "2" / "3".
fn category_of(v: ColumnValue) -> String {
    match v {
        ColumnValue::Category(s) => s.to_string(),
        ColumnValue::Number(n) if n.fract() == 0.0 => format!("{}", n as i64),
        ColumnValue::Number(n) => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{AgeGroup, CityTier, LifestyleRisk};
    use crate::schema::Occupation;

    const SOFTMAX: &str = r#"{
        "kind": "linear_softmax",
        "classes": ["High", "Low", "Medium"],
        "numeric": [{"column": "bmi", "mean": 25.0, "scale": 5.0}],
        "categorical": [
            {"column": "lifestyle_risk", "categories": ["high", "low", "medium"]},
            {"column": "city_tier", "categories": ["1", "2", "3"]}
        ],
        "coef": [
            [0.0, 2.0, -1.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, -1.0, 2.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0]
        ],
        "intercept": [0.0, 0.0, 0.0]
    }"#;

    fn row(risk: LifestyleRisk) -> DerivedFeatures {
        DerivedFeatures {
            bmi: 30.0,
            lifestyle_risk: risk,
            age_group: AgeGroup::Adult,
            city_tier: CityTier::Tier2,
            income: 10.0,
            occupation: Occupation::Chef,
        }
    }

    #[test]
    fn encodes_numeric_then_one_hot() {
        let m = LinearModel::from_json_str(SOFTMAX).unwrap();
        assert_eq!(m.width(), 7);
        let x = m.encode(&row(LifestyleRisk::Medium));
        assert_eq!(x, vec![1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn predicts_argmax_label() {
        let m = LinearModel::from_json_str(SOFTMAX).unwrap();
        assert_eq!(m.predict(&row(LifestyleRisk::High)).unwrap(), "High");
        assert_eq!(m.predict(&row(LifestyleRisk::Low)).unwrap(), "Low");
        assert_eq!(m.predict(&row(LifestyleRisk::Medium)).unwrap(), "Medium");
    }

    #[test]
    fn softmax_kind_exposes_probabilities() {
        let m = Arc::new(LinearModel::from_json_str(SOFTMAX).unwrap());
        let proba = m.proba_handle().expect("softmax model has probabilities");
        let p = proba.predict_proba(&row(LifestyleRisk::Low)).unwrap();
        assert_eq!(proba.classes(), ["High", "Low", "Medium"]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        // scores [-1, 2, 0]
        let expect_low = 2f64.exp() / ((-1f64).exp() + 2f64.exp() + 1.0);
        assert!((p[1] - expect_low).abs() < 1e-9);
    }

    #[test]
    fn margin_kind_has_no_probabilities() {
        let json = SOFTMAX.replace("linear_softmax", "linear_margin");
        let m = Arc::new(LinearModel::from_json_str(&json).unwrap());
        assert_eq!(m.predict(&row(LifestyleRisk::Low)).unwrap(), "Low");
        assert!(m.proba_handle().is_none());
    }

    #[test]
    fn unknown_category_encodes_as_zeros() {
        let json = SOFTMAX.replace(r#"["1", "2", "3"]"#, r#"["1", "3", "9"]"#);
        let m = LinearModel::from_json_str(&json).unwrap();
        let x = m.encode(&row(LifestyleRisk::Low));
        assert_eq!(&x[4..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn missing_classes_fall_back_to_clean_labels() {
        let json = SOFTMAX.replace(r#""classes": ["High", "Low", "Medium"],"#, "");
        let m = LinearModel::from_json_str(&json).unwrap();
        assert_eq!(m.labels(), ["Low", "Medium", "High"]);
    }

    #[test]
    fn rejects_width_mismatch() {
        let json = SOFTMAX.replace(
            "[0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0]",
            "[0.0, 0.0, 2.0, 0.0, 0.0, 0.0]",
        );
        let err = LinearModel::from_json_str(&json).unwrap_err();
        assert!(format!("{err:#}").contains("encoded width is 7"));
    }

    #[test]
    fn rejects_standardizing_a_categorical_column() {
        let json = SOFTMAX.replace(r#""column": "bmi""#, r#""column": "occupation""#);
        assert!(LinearModel::from_json_str(&json).is_err());
    }

    #[test]
    fn rejects_unknown_column() {
        let json = SOFTMAX.replace(r#""column": "bmi""#, r#""column": "zip_code""#);
        let err = LinearModel::from_json_str(&json).unwrap_err();
        assert!(format!("{err:#}").contains("zip_code"));
    }
}
