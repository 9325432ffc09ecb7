//! Schema registry: per-variant field lists and model column contracts.
//!
//! The registry is the single place option domains come from. Literal catalogs
//! and the configuration tree are two `OptionSource`s feeding the same catalog
//! code, so there is one code path for both.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::domain::{AppVariant, FieldKind, FieldSpec};
use crate::io::config::{AppConfig, ConfigError};
use crate::record::DerivedFeature;
use crate::schema::catalog;
use crate::schema::validate::RawInputs;

/// Ordered inputs, derived features and column contract for one variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    variant: AppVariant,
    fields: Vec<FieldSpec>,
    derived: Vec<DerivedFeature>,
    columns: Vec<String>,
}

/// Internal inconsistency in a schema definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    DuplicateName(String),
    EmptyDomain(String),
    DefaultKindMismatch(String),
    UnresolvedColumn(String),
    /// A derived feature reads something other than a solicited field.
    DerivedInput { feature: String, input: String },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "duplicate field name '{name}'"),
            Self::EmptyDomain(name) => write!(f, "choice field '{name}' has no options"),
            Self::DefaultKindMismatch(name) => write!(f, "default of '{name}' does not match its kind"),
            Self::UnresolvedColumn(name) => write!(f, "column '{name}' is neither a field nor a derived feature"),
            Self::DerivedInput { feature, input } => {
                write!(f, "derived feature '{feature}' reads '{input}', which is not an input field")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

impl Schema {
    /// Build a schema, checking names, defaults, columns and derived inputs.
    pub fn new(
        variant: AppVariant,
        fields: Vec<FieldSpec>,
        derived: Vec<DerivedFeature>,
        columns: Vec<String>,
    ) -> Result<Self, SchemaError> {
        let schema = Self {
            variant,
            fields,
            derived,
            columns,
        };
        schema.check()?;
        Ok(schema)
    }

    fn check(&self) -> Result<(), SchemaError> {
        let mut names = HashSet::new();
        for name in self
            .fields
            .iter()
            .map(|f| &f.name)
            .chain(self.derived.iter().map(|d| &d.name))
        {
            if !names.insert(name.as_str()) {
                return Err(SchemaError::DuplicateName(name.clone()));
            }
        }

        for field in &self.fields {
            if let FieldKind::Choice { options } = &field.kind {
                if options.is_empty() {
                    return Err(SchemaError::EmptyDomain(field.name.clone()));
                }
            }
            if !field.kind.accepts(&field.default) {
                return Err(SchemaError::DefaultKindMismatch(field.name.clone()));
            }
        }

        for feature in &self.derived {
            for input in feature.inputs() {
                if self.field(input).is_none() {
                    return Err(SchemaError::DerivedInput {
                        feature: feature.name.clone(),
                        input: input.to_string(),
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !names.contains(column.as_str()) {
                return Err(SchemaError::UnresolvedColumn(column.clone()));
            }
            if !seen.insert(column.as_str()) {
                return Err(SchemaError::DuplicateName(column.clone()));
            }
        }

        Ok(())
    }

    pub fn variant(&self) -> AppVariant {
        self.variant
    }

    /// Solicited fields, in form order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn derived(&self) -> &[DerivedFeature] {
        &self.derived
    }

    /// Column names the model expects, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look a field up by name or by its config key (`cap_shape` for `cap-shape`).
    pub fn resolve(&self, name: &str) -> Option<&FieldSpec> {
        self.field(name)
            .or_else(|| self.fields.iter().find(|f| f.config_key() == name))
    }

    /// Every field at its default value, as a form shows it before any edits.
    pub fn defaults(&self) -> RawInputs {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect()
    }
}

/// Where choice domains come from.
#[derive(Debug, Clone)]
pub enum OptionSource {
    /// Hard-coded lists.
    Literal,
    /// `config.inputs.<key>`, falling back to the literal list for absent keys.
    Config(BTreeMap<String, Vec<String>>),
}

/// Hands out schemas per variant.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    source: OptionSource,
}

impl SchemaRegistry {
    pub fn literal() -> Self {
        Self {
            source: OptionSource::Literal,
        }
    }

    /// Registry whose choice domains come from a configuration tree.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            source: OptionSource::Config(config.inputs.clone()),
        })
    }

    pub fn source(&self) -> &OptionSource {
        &self.source
    }

    /// The schema for `variant`.
    pub fn get_schema(&self, variant: AppVariant) -> Schema {
        for key in self.unused_config_keys(variant) {
            log::warn!("config inputs.{key} matches no {} field and is ignored", variant.title());
        }

        let entry = catalog::entry(variant, |key, literal| match &self.source {
            OptionSource::Literal => to_owned(literal),
            OptionSource::Config(inputs) => match inputs.get(key) {
                Some(options) => options.clone(),
                None => {
                    log::warn!("config has no options for '{key}', using the built-in list");
                    to_owned(literal)
                }
            },
        });

        let schema = Schema {
            variant,
            fields: entry.fields,
            derived: entry.derived,
            columns: entry.columns,
        };
        debug_assert!(schema.check().is_ok(), "catalog schema for {variant:?} is inconsistent");
        schema
    }

    /// Config option keys that no field of `variant` reads.
    pub fn unused_config_keys(&self, variant: AppVariant) -> Vec<String> {
        let OptionSource::Config(inputs) = &self.source else {
            return Vec::new();
        };
        let mut wanted = Vec::new();
        let _ = catalog::entry(variant, |key, literal| {
            wanted.push(key.to_string());
            to_owned(literal)
        });
        inputs
            .keys()
            .filter(|key| !wanted.contains(key))
            .cloned()
            .collect()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::literal()
    }
}

fn to_owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
