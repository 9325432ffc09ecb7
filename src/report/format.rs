//! Formatted terminal output: prediction headlines, record tables, schema listings.
//!
//! We keep formatting code in one place so the front-ends (CLI, prompt, TUI)
//! print the same text and output changes stay localized.

use crate::domain::{AppVariant, FieldKind, FieldSpec};
use crate::predict::PredictionResult;
use crate::record::FeatureRecord;
use crate::schema::Schema;

/// Format a number as dollars: two decimals, comma thousands separators.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // `-0.00` would read oddly; only sign values that survive rounding.
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

/// The sentence each variant shows under its form.
pub fn headline(variant: AppVariant, result: &PredictionResult) -> String {
    match variant {
        AppVariant::HousePrice => format!("Predicted Resale Price: {result}"),
        AppVariant::Mushroom => format!("The predicted class is: {result}"),
    }
}

/// Two-column `column  value` table of a record.
pub fn format_record(record: &FeatureRecord) -> String {
    let width = record.names().map(|n| n.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, value) in record.iter() {
        out.push_str(&format!("{name:<width$}  {value}\n"));
    }
    for anomaly in record.anomalies() {
        out.push_str(&format!("warning: {anomaly}\n"));
    }
    out
}

/// Describe a field's kind and domain in one short line.
pub fn describe_kind(field: &FieldSpec) -> String {
    match &field.kind {
        FieldKind::Text => "text".to_string(),
        FieldKind::Integer { min, max } => format!("integer{}", fmt_bounds(*min, *max)),
        FieldKind::Real { min, max } => format!("real{}", fmt_bounds(*min, *max)),
        FieldKind::Choice { options } => format!("one of: {}", options.join(", ")),
    }
}

fn fmt_bounds<T: std::fmt::Display>(min: Option<T>, max: Option<T>) -> String {
    match (min, max) {
        (None, None) => String::new(),
        (Some(lo), None) => format!(" >= {lo}"),
        (None, Some(hi)) => format!(" <= {hi}"),
        (Some(lo), Some(hi)) => format!(" in [{lo}, {hi}]"),
    }
}

/// Full schema listing for `formcast schema`.
pub fn format_schema(schema: &Schema) -> String {
    let variant = schema.variant();
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n", variant.title()));
    out.push_str("\nFields:\n");
    let width = schema.fields().iter().map(|f| f.name.len()).max().unwrap_or(0);
    for field in schema.fields() {
        out.push_str(&format!(
            "  {:<width$}  {} [default: {}]\n",
            field.name,
            describe_kind(field),
            field.default
        ));
    }

    if !schema.derived().is_empty() {
        out.push_str("\nDerived:\n");
        for feature in schema.derived() {
            let (lo, hi) = feature.expected_range();
            out.push_str(&format!(
                "  {} <- {} (expected {lo}..={hi})\n",
                feature.name,
                feature.inputs().join(", ")
            ));
        }
    }

    out.push_str("\nModel columns:\n  ");
    out.push_str(&schema.columns().join(", "));
    out.push('\n');
    out
}
