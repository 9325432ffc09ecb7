//! Raw input validation.
//!
//! Front-ends hand over whatever their widgets hold: typed values from the TUI,
//! plain strings from the command line. Validation coerces each raw value into
//! its field's kind and checks the declared domain, stopping at the first
//! violation so no partial record ever reaches the model.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{AppVariant, FieldKind, FieldSpec, FieldValue};
use crate::schema::Schema;

/// One raw value per field name, as collected from a form.
pub type RawInputs = BTreeMap<String, FieldValue>;

/// Why a raw value was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationReason {
    /// No value, or blank text.
    Missing,
    /// The value cannot be read as the field's kind.
    WrongKind { expected: &'static str, got: String },
    NotInDomain { value: String, options: Vec<String> },
    BelowMinimum { value: String, min: String },
    AboveMaximum { value: String, max: String },
    /// A raw key no field declares.
    UnknownField,
}

/// First violation found while validating raw inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    fn new(field: &str, reason: ValidationReason) -> Self {
        Self {
            field: field.to_string(),
            reason,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = &self.field;
        match &self.reason {
            ValidationReason::Missing => write!(f, "field '{field}' is missing"),
            ValidationReason::WrongKind { expected, got } => {
                write!(f, "field '{field}' expects a {expected} value, got '{got}'")
            }
            ValidationReason::NotInDomain { value, options } => write!(
                f,
                "field '{field}': '{value}' is not one of [{}]",
                options.join(", ")
            ),
            ValidationReason::BelowMinimum { value, min } => {
                write!(f, "field '{field}': {value} is below the minimum {min}")
            }
            ValidationReason::AboveMaximum { value, max } => {
                write!(f, "field '{field}': {value} is above the maximum {max}")
            }
            ValidationReason::UnknownField => write!(f, "unknown field '{field}'"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Inputs that passed validation, typed and in form order.
///
/// Only `validate` constructs this, so holding one proves every value matches
/// its field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInputs {
    variant: AppVariant,
    values: Vec<(String, FieldValue)>,
}

impl ValidatedInputs {
    /// Variant of the schema these inputs were checked against.
    pub fn variant(&self) -> AppVariant {
        self.variant
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Validate `raw` against `schema`, fail-fast.
pub fn validate(raw: &RawInputs, schema: &Schema) -> Result<ValidatedInputs, ValidationError> {
    let mut values = Vec::with_capacity(schema.fields().len());
    for spec in schema.fields() {
        let value = raw
            .get(&spec.name)
            .ok_or_else(|| ValidationError::new(&spec.name, ValidationReason::Missing))?;
        values.push((spec.name.clone(), check_field(spec, value)?));
    }

    if let Some(unknown) = raw.keys().find(|name| schema.field(name).is_none()) {
        return Err(ValidationError::new(unknown, ValidationReason::UnknownField));
    }

    Ok(ValidatedInputs {
        variant: schema.variant(),
        values,
    })
}

/// Coerce and check one value against its field.
pub fn check_field(spec: &FieldSpec, value: &FieldValue) -> Result<FieldValue, ValidationError> {
    let fail = |reason| Err(ValidationError::new(&spec.name, reason));

    match &spec.kind {
        FieldKind::Text => match value {
            FieldValue::Text(s) if s.trim().is_empty() => fail(ValidationReason::Missing),
            FieldValue::Text(s) => Ok(FieldValue::Text(s.clone())),
            other => fail(wrong_kind(&spec.kind, other)),
        },
        FieldKind::Choice { options } => {
            let Some(s) = value.as_str() else {
                return fail(wrong_kind(&spec.kind, value));
            };
            if s.is_empty() {
                return fail(ValidationReason::Missing);
            }
            if options.iter().any(|o| o == s) {
                Ok(FieldValue::Text(s.to_string()))
            } else {
                fail(ValidationReason::NotInDomain {
                    value: s.to_string(),
                    options: options.clone(),
                })
            }
        }
        FieldKind::Integer { min, max } => {
            let v = match value {
                FieldValue::Integer(v) => *v,
                FieldValue::Real(r) if r.is_finite() && r.fract() == 0.0 && r.abs() < i64::MAX as f64 => *r as i64,
                FieldValue::Text(s) if s.trim().is_empty() => return fail(ValidationReason::Missing),
                FieldValue::Text(s) => match s.trim().parse::<i64>() {
                    Ok(v) => v,
                    Err(_) => return fail(wrong_kind(&spec.kind, value)),
                },
                other => return fail(wrong_kind(&spec.kind, other)),
            };
            if let Some(min) = min {
                if v < *min {
                    return fail(ValidationReason::BelowMinimum {
                        value: v.to_string(),
                        min: min.to_string(),
                    });
                }
            }
            if let Some(max) = max {
                if v > *max {
                    return fail(ValidationReason::AboveMaximum {
                        value: v.to_string(),
                        max: max.to_string(),
                    });
                }
            }
            Ok(FieldValue::Integer(v))
        }
        FieldKind::Real { min, max } => {
            let v = match value {
                FieldValue::Real(v) => *v,
                FieldValue::Integer(v) => *v as f64,
                FieldValue::Text(s) if s.trim().is_empty() => return fail(ValidationReason::Missing),
                FieldValue::Text(s) => match s.trim().parse::<f64>() {
                    Ok(v) => v,
                    Err(_) => return fail(wrong_kind(&spec.kind, value)),
                },
            };
            if !v.is_finite() {
                return fail(wrong_kind(&spec.kind, value));
            }
            if let Some(min) = min {
                if v < *min {
                    return fail(ValidationReason::BelowMinimum {
                        value: v.to_string(),
                        min: min.to_string(),
                    });
                }
            }
            if let Some(max) = max {
                if v > *max {
                    return fail(ValidationReason::AboveMaximum {
                        value: v.to_string(),
                        max: max.to_string(),
                    });
                }
            }
            Ok(FieldValue::Real(v))
        }
    }
}

fn wrong_kind(kind: &FieldKind, got: &FieldValue) -> ValidationReason {
    ValidationReason::WrongKind {
        expected: kind.name(),
        got: got.to_string(),
    }
}
