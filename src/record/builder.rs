//! Single-row feature record assembly.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{AnomalyPolicy, AppVariant, FieldValue};
use crate::record::DerivedAnomaly;
use crate::schema::{Schema, ValidatedInputs};

/// The one-row input handed to a model.
///
/// Columns follow the schema's column contract exactly, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    columns: Vec<(String, FieldValue)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    anomalies: Vec<DerivedAnomaly>,
}

impl FeatureRecord {
    /// Build a record from explicit columns (no derived-feature bookkeeping).
    ///
    /// Mostly useful for exercising models directly.
    pub fn from_columns(columns: Vec<(String, FieldValue)>) -> Self {
        Self {
            columns,
            anomalies: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Derived values that fell outside their expected range.
    pub fn anomalies(&self) -> &[DerivedAnomaly] {
        &self.anomalies
    }

    /// Apply `policy` to any recorded anomalies.
    ///
    /// `Pass` keeps the record untouched, `Clamp` rewrites the offending
    /// values into range, `Reject` returns the first anomaly.
    pub fn apply_policy(mut self, policy: AnomalyPolicy) -> Result<Self, DerivedAnomaly> {
        match policy {
            AnomalyPolicy::Pass => Ok(self),
            AnomalyPolicy::Reject => match self.anomalies.first() {
                Some(anomaly) => Err(anomaly.clone()),
                None => Ok(self),
            },
            AnomalyPolicy::Clamp => {
                for anomaly in &mut self.anomalies {
                    if let Some((_, value)) = self.columns.iter_mut().find(|(n, _)| *n == anomaly.feature) {
                        log::info!("clamping {} from {} to {}", anomaly.feature, anomaly.value, anomaly.clamped());
                        *value = FieldValue::Integer(anomaly.clamped());
                        anomaly.sent = Some(anomaly.clamped());
                    }
                }
                Ok(self)
            }
        }
    }
}

/// Inputs and schema that cannot produce a complete record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Inputs were validated against another variant's schema.
    SchemaMismatch { validated: AppVariant, schema: AppVariant },
    /// A contract column has no input value and no derived value.
    MissingColumn(String),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaMismatch { validated, schema } => write!(
                f,
                "inputs validated for {} cannot build a {} record",
                validated.title(),
                schema.title()
            ),
            Self::MissingColumn(column) => write!(f, "no value for column '{column}'"),
        }
    }
}

impl std::error::Error for RecordError {}

/// Assemble the record for one request.
///
/// Pure in its inputs: `now` is passed in rather than read from the clock.
/// Derived features are computed in declared order and passed through even
/// when out of range; such values are logged and listed in `anomalies`.
/// Every contract column is present or the call fails.
pub fn build_record(inputs: &ValidatedInputs, schema: &Schema, now: NaiveDate) -> Result<FeatureRecord, RecordError> {
    if inputs.variant() != schema.variant() {
        return Err(RecordError::SchemaMismatch {
            validated: inputs.variant(),
            schema: schema.variant(),
        });
    }

    let mut derived: Vec<(&str, FieldValue)> = Vec::with_capacity(schema.derived().len());
    let mut anomalies = Vec::new();

    for feature in schema.derived() {
        let value = feature
            .compute(|name| inputs.get(name), now)
            .ok_or_else(|| RecordError::MissingColumn(feature.name.clone()))?;
        if let Some(anomaly) = feature.check(&value) {
            log::warn!("{anomaly}; passing it through");
            anomalies.push(anomaly);
        }
        derived.push((feature.name.as_str(), value));
    }

    let columns = schema
        .columns()
        .iter()
        .map(|column| {
            let value = inputs
                .get(column)
                .cloned()
                .or_else(|| {
                    derived
                        .iter()
                        .find(|(name, _)| name == column)
                        .map(|(_, v)| v.clone())
                })
                .ok_or_else(|| RecordError::MissingColumn(column.clone()))?;
            Ok((column.clone(), value))
        })
        .collect::<Result<Vec<_>, RecordError>>()?;

    Ok(FeatureRecord { columns, anomalies })
}
