use std::path::Path;

use chrono::NaiveDate;
use formcast::app::pipeline::{PredictError, Session};
use formcast::domain::{AnomalyPolicy, AppVariant, DisplayFormat, FieldKind, FieldValue, Prediction};
use formcast::models::{self, Model, ModelError};
use formcast::predict::{ModelInvocationError, predict_one};
use formcast::record::{FeatureRecord, build_record};
use formcast::schema::{RawInputs, SchemaRegistry, ValidationReason, validate};
use rstest::rstest;

struct Canned(Vec<Prediction>);

impl Model for Canned {
    fn predict(&self, _batch: &[FeatureRecord]) -> Result<Vec<Prediction>, ModelError> {
        Ok(self.0.clone())
    }
}

fn on(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 7, 1).unwrap()
}

fn text(s: &str) -> FieldValue {
    FieldValue::Text(s.to_string())
}

fn ang_mo_kio_flat() -> RawInputs {
    RawInputs::from([
        ("block".to_string(), FieldValue::Integer(123)),
        ("street_name".to_string(), text("Ang Mo Kio Ave 3")),
        ("town".to_string(), text("Ang Mo Kio")),
        ("flat_type".to_string(), text("4 ROOM")),
        ("storey_range".to_string(), text("7-9")),
        ("floor_area_sqm".to_string(), FieldValue::Integer(90)),
        ("flat_model".to_string(), text("Model A")),
        ("lease_commence_date".to_string(), FieldValue::Integer(1995)),
        ("cbd_dist".to_string(), FieldValue::Real(8000.0)),
        ("min_dist_mrt".to_string(), FieldValue::Real(300.0)),
    ])
}

#[test]
fn house_record_has_remaining_lease_and_every_column_in_order() {
    let schema = SchemaRegistry::literal().get_schema(AppVariant::HousePrice);
    let inputs = validate(&ang_mo_kio_flat(), &schema).unwrap();
    let record = build_record(&inputs, &schema, on(2024)).unwrap();

    assert_eq!(record.get("remaining_years"), Some(&FieldValue::Integer(70)));
    assert_eq!(
        record.names().collect::<Vec<_>>(),
        vec![
            "block",
            "street_name",
            "town",
            "flat_type",
            "storey_range",
            "floor_area_sqm",
            "flat_model",
            "remaining_years",
            "cbd_dist",
            "min_dist_mrt",
        ]
    );
    assert!(record.anomalies().is_empty());
}

#[test]
fn record_names_match_the_column_contract() {
    let registry = SchemaRegistry::literal();
    for variant in AppVariant::ALL {
        let schema = registry.get_schema(variant);
        let inputs = validate(&schema.defaults(), &schema).unwrap();
        let record = build_record(&inputs, &schema, on(2024)).unwrap();
        let names: Vec<&str> = record.names().collect();
        let columns: Vec<&str> = schema.columns().iter().map(String::as_str).collect();
        assert_eq!(names, columns, "{variant:?}");
    }
}

#[test]
fn building_twice_gives_the_same_record() {
    let schema = SchemaRegistry::literal().get_schema(AppVariant::HousePrice);
    let inputs = validate(&ang_mo_kio_flat(), &schema).unwrap();
    assert_eq!(
        build_record(&inputs, &schema, on(2031)).unwrap(),
        build_record(&inputs, &schema, on(2031)).unwrap()
    );
}

#[rstest]
#[case(2024, 2024, 99)]
#[case(1995, 2024, 70)]
#[case(1925, 2024, 0)]
fn remaining_lease_at_the_boundaries(#[case] start: i64, #[case] now: i32, #[case] expected: i64) {
    let schema = SchemaRegistry::literal().get_schema(AppVariant::HousePrice);
    let mut raw = ang_mo_kio_flat();
    raw.insert("lease_commence_date".to_string(), FieldValue::Integer(start));
    let inputs = validate(&raw, &schema).unwrap();
    let record = build_record(&inputs, &schema, on(now)).unwrap();
    assert_eq!(record.get("remaining_years"), Some(&FieldValue::Integer(expected)));
    assert!(record.anomalies().is_empty());
}

#[test]
fn foul_mushroom_is_reported_poisonous() {
    let schema = SchemaRegistry::literal().get_schema(AppVariant::Mushroom);
    let mut raw = schema.defaults();
    raw.insert("odor".to_string(), text("foul"));

    let inputs = validate(&raw, &schema).unwrap();
    let record = build_record(&inputs, &schema, on(2024)).unwrap();
    for field in schema.fields() {
        let FieldKind::Choice { options } = &field.kind else {
            panic!("mushroom fields are all choices");
        };
        let value = record.get(&field.name).and_then(FieldValue::as_str).unwrap();
        assert!(options.iter().any(|o| o == value), "{} = {value}", field.name);
    }

    let model = Canned(vec![Prediction::Label("poisonous".to_string())]);
    let result = predict_one(&model, &record, DisplayFormat::Label).unwrap();
    assert_eq!(result.display_text(), "poisonous");
}

#[test]
fn empty_model_output_is_an_invocation_error() {
    let schema = SchemaRegistry::literal().get_schema(AppVariant::Mushroom);
    let inputs = validate(&schema.defaults(), &schema).unwrap();
    let record = build_record(&inputs, &schema, on(2024)).unwrap();

    let err = predict_one(&Canned(Vec::new()), &record, DisplayFormat::Label).unwrap_err();
    assert_eq!(err, ModelInvocationError::OutputCount(0));
}

#[test]
fn out_of_domain_choice_names_the_field() {
    let schema = SchemaRegistry::literal().get_schema(AppVariant::Mushroom);
    let mut raw = schema.defaults();
    raw.insert("habitat".to_string(), text("ocean"));

    let err = validate(&raw, &schema).unwrap_err();
    assert_eq!(err.field, "habitat");
    assert!(matches!(err.reason, ValidationReason::NotInDomain { ref value, .. } if value == "ocean"));
}

#[test]
fn shipped_artifacts_load_and_predict() {
    let registry = SchemaRegistry::literal();

    let house = models::load(Path::new(AppVariant::HousePrice.default_model_path())).unwrap();
    let session = Session::new(registry.get_schema(AppVariant::HousePrice), house, AnomalyPolicy::Pass);
    let outcome = session.predict(&ang_mo_kio_flat(), on(2024)).unwrap();
    assert!(matches!(outcome.result.value, Prediction::Value(v) if v > 0.0));
    assert!(outcome.result.display_text().starts_with('$'));

    let mushroom = models::load(Path::new(AppVariant::Mushroom.default_model_path())).unwrap();
    let session = Session::new(registry.get_schema(AppVariant::Mushroom), mushroom, AnomalyPolicy::Pass);
    let mut raw = session.schema().defaults();
    raw.insert("odor".to_string(), text("foul"));
    assert_eq!(session.predict(&raw, on(2024)).unwrap().result.display_text(), "poisonous");
    raw.insert("odor".to_string(), text("almond"));
    assert_eq!(session.predict(&raw, on(2024)).unwrap().result.display_text(), "edible");
}

#[test]
fn a_failed_request_leaves_the_session_usable() {
    let schema = SchemaRegistry::literal().get_schema(AppVariant::HousePrice);
    let session = Session::new(schema, Box::new(Canned(Vec::new())), AnomalyPolicy::Pass);
    let err = session.predict(&ang_mo_kio_flat(), on(2024)).unwrap_err();
    assert!(matches!(err, PredictError::Invocation(_)));
    assert_eq!(err.stage(), "model invocation");

    let mut bad = ang_mo_kio_flat();
    bad.insert("storey_range".to_string(), text("51-53"));
    assert_eq!(session.predict(&bad, on(2024)).unwrap_err().stage(), "validation");
}

#[test]
fn shipped_config_matches_the_literal_options() {
    let config = formcast::io::AppConfig::load(Path::new("conf/config.json")).unwrap();
    assert_eq!(config, formcast::io::AppConfig::default_for(AppVariant::Mushroom));
}
