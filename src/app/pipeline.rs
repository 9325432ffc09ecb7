//! Shared predict pipeline used by the CLI, prompt and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! raw inputs -> validate -> build record (derived features) -> anomaly policy -> predict_one
//!
//! The front-ends can then focus on collecting inputs and presenting results.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::domain::{AnomalyPolicy, AppVariant};
use crate::error::AppError;
use crate::io::config::{AppConfig, resolve_config_path, resolve_model_path};
use crate::models::{self, Model};
use crate::predict::{ModelInvocationError, PredictionResult, predict_one};
use crate::record::{DerivedAnomaly, FeatureRecord, RecordError, build_record};
use crate::schema::{RawInputs, Schema, SchemaRegistry, ValidationError, validate};

/// Which stage of a request failed.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictError {
    Validation(ValidationError),
    /// Validated inputs did not fit the schema's column contract.
    Record(RecordError),
    /// Only raised under `AnomalyPolicy::Reject`.
    DerivedAnomaly(DerivedAnomaly),
    Invocation(ModelInvocationError),
}

impl PredictError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Record(_) => "record assembly",
            Self::DerivedAnomaly(_) => "derived feature",
            Self::Invocation(_) => "model invocation",
        }
    }
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{} failed: {err}", self.stage()),
            Self::Record(err) => write!(f, "{} failed: {err}", self.stage()),
            Self::DerivedAnomaly(err) => write!(f, "{} rejected: {err}", self.stage()),
            Self::Invocation(err) => write!(f, "{} failed: {err}", self.stage()),
        }
    }
}

impl std::error::Error for PredictError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Record(err) => Some(err),
            Self::DerivedAnomaly(err) => Some(err),
            Self::Invocation(err) => Some(err),
        }
    }
}

impl From<ValidationError> for PredictError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<RecordError> for PredictError {
    fn from(err: RecordError) -> Self {
        Self::Record(err)
    }
}

impl From<DerivedAnomaly> for PredictError {
    fn from(err: DerivedAnomaly) -> Self {
        Self::DerivedAnomaly(err)
    }
}

impl From<ModelInvocationError> for PredictError {
    fn from(err: ModelInvocationError) -> Self {
        Self::Invocation(err)
    }
}

/// Everything a successful request produced.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub record: FeatureRecord,
    pub result: PredictionResult,
}

/// How to assemble a session; usually derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub config: Option<PathBuf>,
    pub model: Option<PathBuf>,
    pub policy: AnomalyPolicy,
}

/// One interactive session: a schema plus a model loaded once and never mutated.
pub struct Session {
    schema: Schema,
    model: Box<dyn Model>,
    policy: AnomalyPolicy,
}

impl Session {
    pub fn new(schema: Schema, model: Box<dyn Model>, policy: AnomalyPolicy) -> Self {
        Self { schema, model, policy }
    }

    /// Resolve config and model locations, then load both.
    pub fn open(variant: AppVariant, options: &SessionOptions) -> Result<Self, AppError> {
        let config = match resolve_config_path(options.config.as_deref()) {
            Some(path) => Some(AppConfig::load(&path)?),
            None => None,
        };

        let registry = match &config {
            Some(config) => SchemaRegistry::from_config(config)?,
            None => SchemaRegistry::literal(),
        };
        let schema = registry.get_schema(variant);

        let model_path = resolve_model_path(options.model.as_deref(), config.as_ref(), variant);
        let model = load_model(&model_path)?;
        log::info!(
            "{} session ready: {} fields, model {}",
            variant.title(),
            schema.fields().len(),
            model.describe()
        );

        Ok(Self::new(schema, model, options.policy))
    }

    pub fn variant(&self) -> AppVariant {
        self.schema.variant()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn model(&self) -> &dyn Model {
        self.model.as_ref()
    }

    pub fn policy(&self) -> AnomalyPolicy {
        self.policy
    }

    /// Run one request end to end.
    pub fn predict(&self, raw: &RawInputs, now: NaiveDate) -> Result<Outcome, PredictError> {
        let validated = validate(raw, &self.schema)?;
        let record = build_record(&validated, &self.schema, now)?.apply_policy(self.policy)?;
        let result = predict_one(self.model(), &record, self.variant().display_format())?;
        log::debug!("predicted {result} from {} columns", record.len());
        Ok(Outcome { record, result })
    }
}

fn load_model(path: &Path) -> Result<Box<dyn Model>, AppError> {
    models::load(path).map_err(|e| AppError::new(4, format!("{e} (set --model or {})", crate::io::MODEL_ENV)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldValue, Prediction};
    use crate::models::ModelError;

    struct Echo;

    impl Model for Echo {
        fn predict(&self, batch: &[FeatureRecord]) -> Result<Vec<Prediction>, ModelError> {
            Ok(batch
                .iter()
                .map(|r| Prediction::Value(r.get("remaining_years").and_then(|v| v.as_f64()).unwrap_or(0.0)))
                .collect())
        }
    }

    fn session(policy: AnomalyPolicy) -> Session {
        let schema = SchemaRegistry::literal().get_schema(AppVariant::HousePrice);
        Session::new(schema, Box::new(Echo), policy)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn defaults_flow_through_to_a_result() {
        let s = session(AnomalyPolicy::Pass);
        let outcome = s.predict(&s.schema().defaults(), today()).unwrap();
        assert_eq!(outcome.result.display_text(), "$75.00");
        assert_eq!(outcome.record.len(), 10);
    }

    #[test]
    fn validation_stops_before_the_model() {
        let s = session(AnomalyPolicy::Pass);
        let mut raw = s.schema().defaults();
        raw.insert("flat_type".into(), FieldValue::Text("PENTHOUSE".into()));
        let err = s.predict(&raw, today()).unwrap_err();
        assert_eq!(err.stage(), "validation");
        assert!(err.to_string().starts_with("validation failed: field 'flat_type'"));
    }

    #[test]
    fn reject_policy_fails_future_leases() {
        let s = session(AnomalyPolicy::Reject);
        let mut raw = s.schema().defaults();
        raw.insert("lease_commence_date".into(), FieldValue::Integer(2030));
        let err = s.predict(&raw, today()).unwrap_err();
        assert!(matches!(err, PredictError::DerivedAnomaly(ref a) if a.value == 105));
    }

    #[test]
    fn session_survives_a_failed_request() {
        let s = session(AnomalyPolicy::Pass);
        let mut bad = s.schema().defaults();
        bad.remove("town");
        assert!(s.predict(&bad, today()).is_err());
        assert!(s.predict(&s.schema().defaults(), today()).is_ok());
    }

    #[test]
    fn open_reports_missing_model_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let options = SessionOptions {
            model: Some(dir.path().join("missing")),
            ..SessionOptions::default()
        };
        let err = Session::open(AppVariant::Mushroom, &options).err().unwrap();
        assert_eq!(err.exit_code(), 4);
    }
}
