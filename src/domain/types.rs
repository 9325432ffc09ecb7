//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built fresh for every prediction request
//! - printed as JSON by `formcast predict --json`
//! - compared in tests (determinism checks rely on `PartialEq`)

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which prediction application to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AppVariant {
    /// HDB resale price regression.
    HousePrice,
    /// Mushroom edibility classification.
    Mushroom,
}

impl AppVariant {
    pub const ALL: [AppVariant; 2] = [AppVariant::HousePrice, AppVariant::Mushroom];

    /// Title shown at the top of every front-end.
    pub fn title(self) -> &'static str {
        match self {
            AppVariant::HousePrice => "HDB Resale Price Prediction",
            AppVariant::Mushroom => "Mushroom Species Prediction",
        }
    }

    pub fn intro(self) -> &'static str {
        match self {
            AppVariant::HousePrice => "Enter the details of the HDB flat to predict its resale price.",
            AppVariant::Mushroom => "Enter the details to predict if the mushroom is edible or poisonous",
        }
    }

    /// Model artifact used when neither flags, environment nor config name one.
    pub fn default_model_path(self) -> &'static str {
        match self {
            AppVariant::HousePrice => "models/hdb_resale_pipeline",
            AppVariant::Mushroom => "models/mushroom-pipeline",
        }
    }

    pub fn display_format(self) -> DisplayFormat {
        match self {
            AppVariant::HousePrice => DisplayFormat::Currency,
            AppVariant::Mushroom => DisplayFormat::Label,
        }
    }

    /// Whether interactive front-ends re-predict after every edit.
    ///
    /// The classifier is cheap and was always live; the price form waits for
    /// an explicit predict action.
    pub fn predicts_on_change(self) -> bool {
        matches!(self, AppVariant::Mushroom)
    }
}

/// Declared shape of one input field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text; must be non-blank.
    Text,
    Integer { min: Option<i64>, max: Option<i64> },
    Real { min: Option<f64>, max: Option<f64> },
    /// Enumerated choice over an ordered domain.
    Choice { options: Vec<String> },
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "free-text",
            FieldKind::Integer { .. } => "bounded-integer",
            FieldKind::Real { .. } => "bounded-real",
            FieldKind::Choice { .. } => "enumerated-choice",
        }
    }

    /// Whether `value` has the runtime kind this field stores.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (FieldKind::Text, FieldValue::Text(_))
                | (FieldKind::Choice { .. }, FieldValue::Text(_))
                | (FieldKind::Integer { .. }, FieldValue::Integer(_))
                | (FieldKind::Real { .. }, FieldValue::Real(_))
        )
    }
}

/// One field of an application's input form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    /// Column name the model expects.
    pub name: String,
    /// Human-readable label for forms.
    pub label: String,
    pub kind: FieldKind,
    pub default: FieldValue,
}

impl FieldSpec {
    pub fn text(name: &str, label: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text,
            default: FieldValue::Text(default.to_string()),
        }
    }

    pub fn integer(name: &str, label: &str, min: Option<i64>, max: Option<i64>, default: i64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Integer { min, max },
            default: FieldValue::Integer(default),
        }
    }

    pub fn real(name: &str, label: &str, min: Option<f64>, max: Option<f64>, default: f64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Real { min, max },
            default: FieldValue::Real(default),
        }
    }

    /// A choice field whose default is the first option.
    ///
    /// # Panics
    /// Panics if `options` is empty. Catalog entries are static and covered by tests.
    pub fn choice(name: &str, label: &str, options: Vec<String>) -> Self {
        let default = FieldValue::Text(options[0].clone());
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Choice { options },
            default,
        }
    }

    /// Options of a choice field (empty for other kinds).
    pub fn options(&self) -> &[String] {
        match &self.kind {
            FieldKind::Choice { options } => options,
            _ => &[],
        }
    }

    /// Key used for this field in the configuration tree (`cap-shape` -> `cap_shape`).
    pub fn config_key(&self) -> String {
        self.name.replace('-', "_")
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Real(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Real(v) => write!(f, "{v}"),
            FieldValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prediction {
    Value(f64),
    Label(String),
}

/// How a prediction is rendered for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayFormat {
    /// `$1,234.56`
    Currency,
    /// The raw label string.
    Label,
}

/// What to do with a derived feature that lands outside its expected range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyPolicy {
    /// Keep the computed value and log a warning.
    #[default]
    Pass,
    /// Clamp the value into the expected range.
    Clamp,
    /// Fail the request.
    Reject,
}
