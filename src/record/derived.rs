//! Derived features: columns computed from other inputs, never asked for.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::domain::FieldValue;

/// How a derived column is computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Derivation {
    /// `lease_years - (now.year - lease_start)`.
    RemainingLease { lease_start: String, lease_years: i64 },
}

/// A derived column and its recipe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedFeature {
    pub name: String,
    pub derivation: Derivation,
}

impl DerivedFeature {
    pub fn remaining_lease(name: &str, lease_start: &str, lease_years: i64) -> Self {
        Self {
            name: name.to_string(),
            derivation: Derivation::RemainingLease {
                lease_start: lease_start.to_string(),
                lease_years,
            },
        }
    }

    /// Names of the fields this feature reads.
    pub fn inputs(&self) -> Vec<&str> {
        match &self.derivation {
            Derivation::RemainingLease { lease_start, .. } => vec![lease_start.as_str()],
        }
    }

    /// Compute the value from already-validated inputs.
    ///
    /// `lookup` resolves an input name to its value. Returns `None` when an input
    /// is absent or not numeric, which validation rules out for catalog schemas.
    pub fn compute<'a, F>(&self, lookup: F, now: NaiveDate) -> Option<FieldValue>
    where
        F: Fn(&str) -> Option<&'a FieldValue>,
    {
        match &self.derivation {
            Derivation::RemainingLease {
                lease_start,
                lease_years,
            } => {
                let start = match lookup(lease_start)? {
                    FieldValue::Integer(v) => *v,
                    _ => return None,
                };
                let elapsed = i64::from(now.year()) - start;
                Some(FieldValue::Integer(lease_years - elapsed))
            }
        }
    }

    /// Inclusive range the value is expected to fall in.
    pub fn expected_range(&self) -> (i64, i64) {
        match &self.derivation {
            Derivation::RemainingLease { lease_years, .. } => (0, *lease_years),
        }
    }

    /// Returns an anomaly if `value` falls outside `expected_range`.
    pub fn check(&self, value: &FieldValue) -> Option<DerivedAnomaly> {
        let (min, max) = self.expected_range();
        match value {
            FieldValue::Integer(v) if *v < min || *v > max => Some(DerivedAnomaly {
                feature: self.name.clone(),
                value: *v,
                min,
                max,
                sent: None,
            }),
            _ => None,
        }
    }
}

/// A derived value outside its expected range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedAnomaly {
    pub feature: String,
    pub value: i64,
    pub min: i64,
    pub max: i64,
    /// Value handed to the model instead of `value`, once clamped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent: Option<i64>,
}

impl DerivedAnomaly {
    pub fn clamped(&self) -> i64 {
        self.value.clamp(self.min, self.max)
    }
}

impl fmt::Display for DerivedAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "derived feature '{}' = {} is outside the expected range {}..={}",
            self.feature, self.value, self.min, self.max
        )?;
        match self.sent {
            Some(sent) => write!(f, "; clamped to {sent}"),
            None => Ok(()),
        }
    }
}

impl std::error::Error for DerivedAnomaly {}
