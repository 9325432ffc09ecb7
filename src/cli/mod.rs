//! Command-line parsing for the prediction front-ends.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the schema/record/model code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{AnomalyPolicy, AppVariant};

pub mod prompt;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "formcast", version, about = "Single-record predictions from form inputs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive form (default).
    Tui(SessionArgs),
    /// Fill the form line by line on stdin.
    Prompt(SessionArgs),
    /// Predict once from `--set field=value` pairs; unset fields keep their defaults.
    Predict(PredictArgs),
    /// Print the fields, derived features and model columns of a variant.
    Schema(SchemaArgs),
    /// Write the default configuration file.
    InitConfig(InitConfigArgs),
}

/// Options shared by every command that opens a session.
#[derive(Debug, Args, Clone)]
pub struct SessionArgs {
    /// Which application to run.
    #[arg(short = 'v', long, value_enum, default_value_t = AppVariant::HousePrice)]
    pub variant: AppVariant,

    /// Configuration file supplying option lists and the model path.
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Model artifact (extension optional).
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// What to do with derived values outside their expected range.
    #[arg(long, value_enum, default_value_t = AnomalyPolicy::Pass)]
    pub anomaly: AnomalyPolicy,

    /// Date used for derived features (defaults to today).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Field value, repeatable: `--set town=Bishan --set floor_area_sqm=90`.
    #[arg(short = 's', long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,

    /// Print the record and prediction as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SchemaArgs {
    #[arg(short = 'v', long, value_enum, default_value_t = AppVariant::HousePrice)]
    pub variant: AppVariant,

    /// Take option lists from this configuration file.
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct InitConfigArgs {
    /// Where to write the file.
    #[arg(long, default_value = crate::io::DEFAULT_CONFIG_PATH)]
    pub path: PathBuf,

    /// Variant whose option lists go into the file.
    #[arg(short = 'v', long, value_enum, default_value_t = AppVariant::Mushroom)]
    pub variant: AppVariant,
}

/// Parse `field=value`; the value may itself contain `=`.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{s}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }
    Ok((field.to_string(), value.to_string()))
}
