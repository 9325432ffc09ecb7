//! The model boundary.
//!
//! Everything downstream of the record builder talks to a `Model`: an opaque,
//! immutable object that maps a batch of records to one output per record, in
//! order. The session owns one handle for its whole life and lends it out by
//! reference, so the trait requires `Send + Sync` for hosts that share it.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::domain::Prediction;
use crate::models::artifact::PipelineArtifact;
use crate::record::FeatureRecord;

/// Batch prediction over feature records.
pub trait Model: Send + Sync {
    /// One output per input record, order-preserving.
    fn predict(&self, batch: &[FeatureRecord]) -> Result<Vec<Prediction>, ModelError>;

    /// Short description for logs and headers.
    fn describe(&self) -> String {
        "model".to_string()
    }
}

/// Failures loading or running a model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    Io { path: PathBuf, message: String },
    InvalidArtifact { path: PathBuf, message: String },
    /// The record lacks a column the model was trained on.
    MissingColumn(String),
    /// A column holds a value of the wrong kind for the model.
    BadColumn { column: String, message: String },
    /// Anything else the model reports.
    Failed(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "failed to open model '{}': {message}", path.display())
            }
            Self::InvalidArtifact { path, message } => {
                write!(f, "invalid model artifact '{}': {message}", path.display())
            }
            Self::MissingColumn(column) => write!(f, "record is missing column '{column}'"),
            Self::BadColumn { column, message } => write!(f, "column '{column}': {message}"),
            Self::Failed(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Resolve an artifact identifier to a file path.
///
/// Identifiers are usually given without an extension (`models/mushroom-pipeline`);
/// those get `.json` appended.
pub fn resolve_artifact_path(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("json")
    }
}

/// Load a model from a JSON pipeline artifact.
pub fn load(path: &Path) -> Result<Box<dyn Model>, ModelError> {
    let path = resolve_artifact_path(path);
    let file = File::open(&path).map_err(|e| ModelError::Io {
        path: path.clone(),
        message: e.to_string(),
    })?;
    let artifact: PipelineArtifact = serde_json::from_reader(file).map_err(|e| ModelError::InvalidArtifact {
        path: path.clone(),
        message: e.to_string(),
    })?;
    artifact.check().map_err(|message| ModelError::InvalidArtifact {
        path: path.clone(),
        message,
    })?;

    log::info!("loaded {} from {}", artifact.describe(), path.display());
    Ok(Box::new(artifact))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn extensionless_identifiers_get_json_suffix() {
        assert_eq!(
            resolve_artifact_path(Path::new("models/mushroom-pipeline")),
            PathBuf::from("models/mushroom-pipeline.json")
        );
        assert_eq!(
            resolve_artifact_path(Path::new("models/custom.model")),
            PathBuf::from("models/custom.model")
        );
    }

    #[test]
    fn load_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent")).err().unwrap();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn load_rejects_malformed_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = load(file.path()).err().unwrap();
        assert!(matches!(err, ModelError::InvalidArtifact { .. }));
    }

    #[test]
    fn load_reads_a_classifier() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "kind": "linear-classifier",
                "name": "tiny",
                "columns": ["odor"],
                "classes": [
                    {{ "label": "edible", "intercept": 0.5 }},
                    {{ "label": "poisonous", "categorical": {{ "odor": {{ "foul": 2.0 }} }} }}
                ]
            }}"#
        )
        .unwrap();

        let model = load(file.path()).unwrap();
        let record = FeatureRecord::from_columns(vec![(
            "odor".to_string(),
            crate::domain::FieldValue::Text("foul".to_string()),
        )]);
        let out = model.predict(&[record]).unwrap();
        assert_eq!(out, vec![Prediction::Label("poisonous".to_string())]);
    }
}
