//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - opens a session (schema + model) for the chosen variant
//! - hands it to the TUI, the line prompt or a one-shot prediction

use std::io;

use chrono::{Local, NaiveDate};
use clap::Parser;

use crate::cli::{Command, InitConfigArgs, PredictArgs, SchemaArgs, SessionArgs};
use crate::domain::FieldValue;
use crate::error::AppError;
use crate::io::config::{AppConfig, resolve_config_path};
use crate::schema::{RawInputs, Schema, SchemaRegistry};

pub mod pipeline;

use pipeline::{Session, SessionOptions};

/// Entry point for the `formcast` binary.
pub fn run() -> Result<(), AppError> {
    // We want `formcast` and `formcast -v mushroom` to behave like `formcast tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_logging(&cli.command);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Prompt(args) => handle_prompt(args),
        Command::Predict(args) => handle_predict(args),
        Command::Schema(args) => handle_schema(args),
        Command::InitConfig(args) => handle_init_config(args),
    }
}

/// Line commands log warnings to stderr; the TUI owns the screen and stays quiet.
/// `RUST_LOG` overrides both.
fn init_logging(command: &Command) {
    let default = match command {
        Command::Tui(_) => "off",
        _ => "warn",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn handle_tui(args: SessionArgs) -> Result<(), AppError> {
    let session = Session::open(args.variant, &session_options(&args))?;
    crate::tui::run(session, as_of(&args))
}

fn handle_prompt(args: SessionArgs) -> Result<(), AppError> {
    let session = Session::open(args.variant, &session_options(&args))?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    crate::cli::prompt::run(&session, as_of(&args), &mut input, &mut output)
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let session = Session::open(args.session.variant, &session_options(&args.session))?;
    let raw = apply_assignments(session.schema(), &args.set);
    let now = as_of(&args.session);

    let outcome = session.predict(&raw, now)?;

    if args.json {
        let doc = serde_json::json!({
            "variant": session.variant(),
            "as_of": now,
            "record": outcome.record,
            "prediction": outcome.result.value,
            "display": outcome.result.display_text(),
        });
        let text = serde_json::to_string_pretty(&doc)
            .map_err(|e| AppError::new(4, format!("Failed to encode result: {e}")))?;
        println!("{text}");
    } else {
        for anomaly in outcome.record.anomalies() {
            eprintln!("warning: {anomaly}");
        }
        println!("{}", crate::report::headline(session.variant(), &outcome.result));
    }
    Ok(())
}

fn handle_schema(args: SchemaArgs) -> Result<(), AppError> {
    let registry = match resolve_config_path(args.config.as_deref()) {
        Some(path) => SchemaRegistry::from_config(&AppConfig::load(&path)?)?,
        None => SchemaRegistry::literal(),
    };
    print!("{}", crate::report::format_schema(&registry.get_schema(args.variant)));
    Ok(())
}

fn handle_init_config(args: InitConfigArgs) -> Result<(), AppError> {
    AppConfig::default_for(args.variant).write(&args.path)?;
    println!("Configuration file created at {}", args.path.display());
    Ok(())
}

pub fn session_options(args: &SessionArgs) -> SessionOptions {
    SessionOptions {
        config: args.config.clone(),
        model: args.model.clone(),
        policy: args.anomaly,
    }
}

fn as_of(args: &SessionArgs) -> NaiveDate {
    args.as_of.unwrap_or_else(|| Local::now().date_naive())
}

/// Start from the form defaults and overlay `--set` pairs as raw text.
///
/// Names may use the config spelling (`cap_shape` for `cap-shape`). Names that
/// match no field are passed through so validation reports them.
pub fn apply_assignments(schema: &Schema, set: &[(String, String)]) -> RawInputs {
    let mut raw = schema.defaults();
    for (name, value) in set {
        let key = schema.resolve(name).map_or_else(|| name.clone(), |f| f.name.clone());
        raw.insert(key, FieldValue::Text(value.clone()));
    }
    raw
}

/// Rewrite argv so `formcast` defaults to `formcast tui`.
///
/// Rules:
/// - `formcast`                      -> `formcast tui`
/// - `formcast -v mushroom ...`      -> `formcast tui -v mushroom ...`
/// - `formcast --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "tui" | "prompt" | "predict" | "schema" | "init-config"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
