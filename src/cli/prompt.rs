//! Line-oriented form.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the prompt walks the schema and asks for one field per line
//!
//! Blank input keeps the default, choices accept a number or the option text,
//! `q` cancels. Reader and writer are generic so the loop is testable.

use std::io::{BufRead, Write};

use chrono::NaiveDate;

use crate::app::pipeline::Session;
use crate::domain::{FieldKind, FieldSpec, FieldValue};
use crate::error::AppError;
use crate::report::{describe_kind, format_record, headline};
use crate::schema::{RawInputs, Schema, check_field};

/// Collect every field of `schema`. Returns `None` when the user cancels.
pub fn prompt_inputs<R: BufRead, W: Write>(
    schema: &Schema,
    input: &mut R,
    output: &mut W,
) -> Result<Option<RawInputs>, AppError> {
    let mut raw = RawInputs::new();
    for field in schema.fields() {
        match prompt_field(field, input, output)? {
            Some(value) => {
                raw.insert(field.name.clone(), value);
            }
            None => return Ok(None),
        }
    }
    Ok(Some(raw))
}

fn prompt_field<R: BufRead, W: Write>(
    field: &FieldSpec,
    input: &mut R,
    output: &mut W,
) -> Result<Option<FieldValue>, AppError> {
    if let FieldKind::Choice { options } = &field.kind {
        for (idx, option) in options.iter().enumerate() {
            say(output, &format!("{:>3}) {option}\n", idx + 1))?;
        }
    }

    loop {
        say(output, &format!("{} [{}]: ", field.label, field.default))?;
        let Some(line) = read_line(input)? else {
            return Err(AppError::new(2, "No input received. Use `formcast predict --set ...` instead."));
        };
        let line = line.trim();

        if line.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        if line.is_empty() {
            return Ok(Some(field.default.clone()));
        }

        let candidate = match (&field.kind, line.parse::<usize>()) {
            (FieldKind::Choice { options }, Ok(n)) if (1..=options.len()).contains(&n) => {
                FieldValue::Text(options[n - 1].clone())
            }
            _ => FieldValue::Text(line.to_string()),
        };

        match check_field(field, &candidate) {
            Ok(value) => return Ok(Some(value)),
            Err(err) => {
                say(output, &format!("{err} (expected {})\n", describe_kind(field)))?;
            }
        }
    }
}

/// Run the prompt loop until the user declines another prediction.
pub fn run<R: BufRead, W: Write>(
    session: &Session,
    now: NaiveDate,
    input: &mut R,
    output: &mut W,
) -> Result<(), AppError> {
    let variant = session.variant();
    say(output, &format!("{}\n{}\n\n", variant.title(), variant.intro()))?;

    loop {
        let Some(raw) = prompt_inputs(session.schema(), input, output)? else {
            say(output, "Canceled.\n")?;
            return Ok(());
        };

        // A failed request is reported and the loop carries on.
        match session.predict(&raw, now) {
            Ok(outcome) => {
                say(output, &format!("\n{}\n", format_record(&outcome.record)))?;
                say(output, &format!("{}\n", headline(variant, &outcome.result)))?;
            }
            Err(err) => {
                log::warn!("prediction failed at {} stage", err.stage());
                say(output, &format!("\n{err}\n"))?;
            }
        }

        say(output, "\nPredict again? [y/N]: ")?;
        match read_line(input)? {
            Some(answer) if answer.trim().eq_ignore_ascii_case("y") => say(output, "\n")?,
            _ => return Ok(()),
        }
    }
}

fn say<W: Write>(output: &mut W, text: &str) -> Result<(), AppError> {
    output
        .write_all(text.as_bytes())
        .and_then(|_| output.flush())
        .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>, AppError> {
    let mut line = String::new();
    let bytes = input
        .read_line(&mut line)
        .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;
    Ok((bytes > 0).then_some(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AppVariant;
    use crate::schema::SchemaRegistry;
    use std::io::Cursor;

    fn mushroom() -> Schema {
        SchemaRegistry::literal().get_schema(AppVariant::Mushroom)
    }

    #[test]
    fn blank_lines_keep_defaults() {
        let schema = mushroom();
        let mut input = Cursor::new("\n".repeat(schema.fields().len()));
        let mut output = Vec::new();
        let raw = prompt_inputs(&schema, &mut input, &mut output).unwrap().unwrap();
        assert_eq!(raw, schema.defaults());
    }

    #[test]
    fn choices_accept_numbers_and_text_and_retry_on_bad_input() {
        let schema = SchemaRegistry::literal().get_schema(AppVariant::HousePrice);
        // block, street, town, flat_type (#4), storey_range (text), floor area (bad then ok), rest default
        let script = "123\nAng Mo Kio Ave 3\nAng Mo Kio\n4\n7-9\nhuge\n90\n\n1995\n8000\n300\n";
        let mut input = Cursor::new(script);
        let mut output = Vec::new();
        let raw = prompt_inputs(&schema, &mut input, &mut output).unwrap().unwrap();

        assert_eq!(raw["flat_type"], FieldValue::Text("4 ROOM".to_string()));
        assert_eq!(raw["storey_range"], FieldValue::Text("7-9".to_string()));
        assert_eq!(raw["floor_area_sqm"], FieldValue::Integer(90));
        assert_eq!(raw["flat_model"], FieldValue::Text("New Generation".to_string()));
        assert_eq!(raw["cbd_dist"], FieldValue::Real(8000.0));

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("field 'floor_area_sqm' expects a bounded-integer value"));
    }

    #[test]
    fn q_cancels() {
        let schema = mushroom();
        let mut input = Cursor::new("1\nq\n");
        let mut output = Vec::new();
        assert!(prompt_inputs(&schema, &mut input, &mut output).unwrap().is_none());
    }

    #[test]
    fn end_of_input_is_an_error() {
        let schema = mushroom();
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        let err = prompt_inputs(&schema, &mut input, &mut output).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
