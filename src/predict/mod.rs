//! Single-record prediction.
//!
//! `predict_one` is the only place the model is called. It sends a batch of
//! exactly one record and insists on exactly one output back; anything else is
//! a contract violation and no result is produced.

use std::fmt;

use serde::Serialize;

use crate::domain::{DisplayFormat, Prediction};
use crate::models::{Model, ModelError};
use crate::record::FeatureRecord;
use crate::report::format_currency;

/// A prediction paired with how to show it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub value: Prediction,
    pub format: DisplayFormat,
}

impl PredictionResult {
    /// The value as shown to the user (`$412,000.00`, `poisonous`).
    pub fn display_text(&self) -> String {
        match (&self.value, self.format) {
            (Prediction::Value(v), DisplayFormat::Currency) => format_currency(*v),
            (Prediction::Value(v), DisplayFormat::Label) => v.to_string(),
            (Prediction::Label(label), _) => label.clone(),
        }
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

/// The model failed or broke its output contract.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelInvocationError {
    /// The model's own predict call failed.
    Model(ModelError),
    /// A one-row batch did not come back with exactly one output.
    OutputCount(usize),
    /// The output cannot be shown in the requested format.
    Unrepresentable { output: Prediction, format: DisplayFormat },
}

impl fmt::Display for ModelInvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(err) => write!(f, "{err}"),
            Self::OutputCount(n) => write!(f, "model returned {n} outputs for a single-row input, expected 1"),
            Self::Unrepresentable { output, format } => {
                write!(f, "model output {output:?} cannot be displayed as {format:?}")
            }
        }
    }
}

impl std::error::Error for ModelInvocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Model(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelError> for ModelInvocationError {
    fn from(err: ModelError) -> Self {
        Self::Model(err)
    }
}

/// Predict for one record and wrap the single output for display.
pub fn predict_one(
    model: &dyn Model,
    record: &FeatureRecord,
    format: DisplayFormat,
) -> Result<PredictionResult, ModelInvocationError> {
    let outputs = model.predict(std::slice::from_ref(record))?;
    let value = match <[Prediction; 1]>::try_from(outputs) {
        Ok([value]) => value,
        Err(outputs) => return Err(ModelInvocationError::OutputCount(outputs.len())),
    };

    if format == DisplayFormat::Currency {
        match &value {
            Prediction::Value(v) if v.is_finite() => {}
            other => {
                return Err(ModelInvocationError::Unrepresentable {
                    output: other.clone(),
                    format,
                });
            }
        }
    }

    Ok(PredictionResult { value, format })
}
