//! JSON pipeline artifacts.
//!
//! An artifact bundles the encoding and the estimator: numeric columns enter a
//! linear score directly, text columns are one-hot encoded against the
//! categories listed in the artifact. Categories the artifact has never seen
//! contribute nothing, the usual "ignore unknown" one-hot behavior.
//!
//! Two estimators are supported:
//! - `linear-regressor`: the score is the prediction
//! - `linear-classifier`: one score per class, the highest wins (ties go to
//!   the class listed first)

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::{FieldValue, Prediction};
use crate::models::model::{Model, ModelError};
use crate::record::FeatureRecord;

/// Serialized form of a trained pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PipelineArtifact {
    LinearRegressor(LinearRegressor),
    LinearClassifier(LinearClassifier),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressor {
    #[serde(default)]
    pub name: String,
    /// Columns the pipeline was trained on; every record must carry them.
    pub columns: Vec<String>,
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub numeric: BTreeMap<String, f64>,
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    #[serde(default)]
    pub name: String,
    pub columns: Vec<String>,
    pub classes: Vec<ClassScore>,
}

/// Linear score terms for one class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassScore {
    pub label: String,
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub numeric: BTreeMap<String, f64>,
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
}

impl PipelineArtifact {
    pub fn describe(&self) -> String {
        match self {
            PipelineArtifact::LinearRegressor(m) => format!("linear regressor '{}'", m.name),
            PipelineArtifact::LinearClassifier(m) => {
                format!("linear classifier '{}' ({} classes)", m.name, m.classes.len())
            }
        }
    }

    fn columns(&self) -> &[String] {
        match self {
            PipelineArtifact::LinearRegressor(m) => &m.columns,
            PipelineArtifact::LinearClassifier(m) => &m.columns,
        }
    }

    /// Structural checks run once at load time.
    pub fn check(&self) -> Result<(), String> {
        let columns: HashSet<&str> = self.columns().iter().map(|c| c.as_str()).collect();
        if columns.is_empty() {
            return Err("artifact declares no columns".to_string());
        }
        if columns.len() != self.columns().len() {
            return Err("artifact declares a column twice".to_string());
        }

        match self {
            PipelineArtifact::LinearRegressor(m) => {
                check_terms(&columns, m.intercept, &m.numeric, &m.categorical)?;
            }
            PipelineArtifact::LinearClassifier(m) => {
                if m.classes.is_empty() {
                    return Err("classifier declares no classes".to_string());
                }
                let mut labels = HashSet::new();
                for class in &m.classes {
                    if !labels.insert(class.label.as_str()) {
                        return Err(format!("class '{}' declared twice", class.label));
                    }
                    check_terms(&columns, class.intercept, &class.numeric, &class.categorical)
                        .map_err(|e| format!("class '{}': {e}", class.label))?;
                }
            }
        }
        Ok(())
    }

    fn predict_row(&self, record: &FeatureRecord) -> Result<Prediction, ModelError> {
        for column in self.columns() {
            if record.get(column).is_none() {
                return Err(ModelError::MissingColumn(column.clone()));
            }
        }

        match self {
            PipelineArtifact::LinearRegressor(m) => {
                let y = linear_score(record, m.intercept, &m.numeric, &m.categorical)?;
                Ok(Prediction::Value(y))
            }
            PipelineArtifact::LinearClassifier(m) => {
                let mut best: Option<(&str, f64)> = None;
                for class in &m.classes {
                    let s = linear_score(record, class.intercept, &class.numeric, &class.categorical)?;
                    log::debug!("class {} scored {s:.4}", class.label);
                    if best.is_none_or(|(_, b)| s > b) {
                        best = Some((class.label.as_str(), s));
                    }
                }
                best.map(|(label, _)| Prediction::Label(label.to_string()))
                    .ok_or_else(|| ModelError::Failed("classifier has no classes".to_string()))
            }
        }
    }
}

impl Model for PipelineArtifact {
    fn predict(&self, batch: &[FeatureRecord]) -> Result<Vec<Prediction>, ModelError> {
        batch.iter().map(|record| self.predict_row(record)).collect()
    }

    fn describe(&self) -> String {
        PipelineArtifact::describe(self)
    }
}

fn check_terms(
    columns: &HashSet<&str>,
    intercept: f64,
    numeric: &BTreeMap<String, f64>,
    categorical: &BTreeMap<String, BTreeMap<String, f64>>,
) -> Result<(), String> {
    if !intercept.is_finite() {
        return Err("intercept is not finite".to_string());
    }
    for (column, weight) in numeric {
        if !columns.contains(column.as_str()) {
            return Err(format!("numeric term for undeclared column '{column}'"));
        }
        if !weight.is_finite() {
            return Err(format!("weight for '{column}' is not finite"));
        }
    }
    for (column, levels) in categorical {
        if !columns.contains(column.as_str()) {
            return Err(format!("categorical term for undeclared column '{column}'"));
        }
        if numeric.contains_key(column) {
            return Err(format!("column '{column}' is both numeric and categorical"));
        }
        if let Some((level, _)) = levels.iter().find(|(_, w)| !w.is_finite()) {
            return Err(format!("weight for '{column}={level}' is not finite"));
        }
    }
    Ok(())
}

fn linear_score(
    record: &FeatureRecord,
    intercept: f64,
    numeric: &BTreeMap<String, f64>,
    categorical: &BTreeMap<String, BTreeMap<String, f64>>,
) -> Result<f64, ModelError> {
    let mut score = intercept;

    for (column, weight) in numeric {
        let value = record
            .get(column)
            .ok_or_else(|| ModelError::MissingColumn(column.clone()))?;
        let x = value.as_f64().ok_or_else(|| ModelError::BadColumn {
            column: column.clone(),
            message: format!("expected a number, got '{value}'"),
        })?;
        score += weight * x;
    }

    for (column, levels) in categorical {
        let value = record
            .get(column)
            .ok_or_else(|| ModelError::MissingColumn(column.clone()))?;
        let key = match value {
            FieldValue::Text(s) => s.clone(),
            other => other.to_string(),
        };
        if let Some(weight) = levels.get(&key) {
            score += weight;
        }
    }

    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(columns: &[(&str, FieldValue)]) -> FeatureRecord {
        FeatureRecord::from_columns(columns.iter().map(|(n, v)| (n.to_string(), v.clone())).collect())
    }

    fn regressor() -> PipelineArtifact {
        let mut categorical = BTreeMap::new();
        categorical.insert(
            "town".to_string(),
            BTreeMap::from([("Bishan".to_string(), 50_000.0), ("Woodlands".to_string(), -20_000.0)]),
        );
        PipelineArtifact::LinearRegressor(LinearRegressor {
            name: "toy".to_string(),
            columns: vec!["floor_area_sqm".to_string(), "town".to_string()],
            intercept: 100_000.0,
            numeric: BTreeMap::from([("floor_area_sqm".to_string(), 3_000.0)]),
            categorical,
        })
    }

    #[test]
    fn regressor_adds_numeric_and_one_hot_terms() {
        let model = regressor();
        let out = model
            .predict(&[record(&[
                ("floor_area_sqm", FieldValue::Integer(90)),
                ("town", FieldValue::Text("Bishan".to_string())),
            ])])
            .unwrap();
        match &out[..] {
            [Prediction::Value(v)] => assert_relative_eq!(*v, 420_000.0),
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn unknown_categories_contribute_nothing() {
        let out = regressor()
            .predict(&[record(&[
                ("floor_area_sqm", FieldValue::Real(10.0)),
                ("town", FieldValue::Text("Punggol".to_string())),
            ])])
            .unwrap();
        assert_eq!(out, vec![Prediction::Value(130_000.0)]);
    }

    #[test]
    fn batch_outputs_preserve_order() {
        let rows = [
            record(&[
                ("floor_area_sqm", FieldValue::Integer(1)),
                ("town", FieldValue::Text("Woodlands".to_string())),
            ]),
            record(&[
                ("floor_area_sqm", FieldValue::Integer(2)),
                ("town", FieldValue::Text("Bishan".to_string())),
            ]),
        ];
        let out = regressor().predict(&rows).unwrap();
        assert_eq!(out, vec![Prediction::Value(83_000.0), Prediction::Value(156_000.0)]);
    }

    #[test]
    fn missing_and_mistyped_columns_fail() {
        let model = regressor();
        let err = model
            .predict(&[record(&[("floor_area_sqm", FieldValue::Integer(90))])])
            .unwrap_err();
        assert_eq!(err, ModelError::MissingColumn("town".to_string()));

        let err = model
            .predict(&[record(&[
                ("floor_area_sqm", FieldValue::Text("big".to_string())),
                ("town", FieldValue::Text("Bishan".to_string())),
            ])])
            .unwrap_err();
        assert!(matches!(err, ModelError::BadColumn { .. }));
    }

    #[test]
    fn classifier_ties_go_to_the_first_class() {
        let model = PipelineArtifact::LinearClassifier(LinearClassifier {
            name: "tie".to_string(),
            columns: vec!["odor".to_string()],
            classes: vec![
                ClassScore {
                    label: "edible".to_string(),
                    intercept: 1.0,
                    numeric: BTreeMap::new(),
                    categorical: BTreeMap::new(),
                },
                ClassScore {
                    label: "poisonous".to_string(),
                    intercept: 1.0,
                    numeric: BTreeMap::new(),
                    categorical: BTreeMap::new(),
                },
            ],
        });
        let out = model
            .predict(&[record(&[("odor", FieldValue::Text("none".to_string()))])])
            .unwrap();
        assert_eq!(out, vec![Prediction::Label("edible".to_string())]);
    }

    #[test]
    fn check_rejects_undeclared_columns_and_bad_weights() {
        let mut artifact = regressor();
        if let PipelineArtifact::LinearRegressor(m) = &mut artifact {
            m.numeric.insert("cbd_dist".to_string(), 1.0);
        }
        assert!(artifact.check().unwrap_err().contains("cbd_dist"));

        let mut artifact = regressor();
        if let PipelineArtifact::LinearRegressor(m) = &mut artifact {
            m.intercept = f64::NAN;
        }
        assert!(artifact.check().is_err());

        let empty = PipelineArtifact::LinearClassifier(LinearClassifier {
            name: String::new(),
            columns: vec!["odor".to_string()],
            classes: Vec::new(),
        });
        assert!(empty.check().is_err());
        assert!(regressor().check().is_ok());
    }
}
