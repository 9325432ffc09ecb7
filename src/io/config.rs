//! Configuration tree: option domains and model location.
//!
//! The file is JSON:
//!
//! ```json
//! {
//!   "model": { "path": "models/mushroom-pipeline" },
//!   "inputs": { "cap_shape": ["convex", "bell"], "odor": ["almond", "foul"] }
//! }
//! ```
//!
//! Where the file lives is resolved from flags first, then the environment
//! (`.env` is honored through dotenvy).

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::AppVariant;
use crate::schema::catalog::literal_options;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "FORMCAST_CONFIG";
/// Environment variable naming the model artifact.
pub const MODEL_ENV: &str = "FORMCAST_MODEL";
/// Where `init-config` writes by default.
pub const DEFAULT_CONFIG_PATH: &str = "conf/config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSection {
    pub path: String,
}

/// The whole configuration tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub model: ModelSection,
    #[serde(default)]
    pub inputs: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "config file '{}': {message}", path.display()),
            Self::Parse { path, message } => write!(f, "invalid config '{}': {message}", path.display()),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    pub fn new(model_path: impl Into<String>, inputs: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            model: ModelSection {
                path: model_path.into(),
            },
            inputs,
        }
    }

    /// The config `init-config` writes: built-in option lists plus the default model.
    pub fn default_for(variant: AppVariant) -> Self {
        Self::new(
            variant.default_model_path(),
            literal_options(variant).into_iter().collect(),
        )
    }

    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: AppConfig = serde_json::from_reader(file).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        log::debug!("loaded config from {} ({} option lists)", path.display(), config.inputs.len());
        Ok(config)
    }

    /// Reject configs a form could not be built from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.path.trim().is_empty() {
            return Err(ConfigError::Invalid("model.path is empty".to_string()));
        }
        for (key, options) in &self.inputs {
            if options.is_empty() {
                return Err(ConfigError::Invalid(format!("inputs.{key} has no options")));
            }
            let mut seen = HashSet::new();
            for option in options {
                if option.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!("inputs.{key} contains a blank option")));
                }
                if !seen.insert(option.as_str()) {
                    return Err(ConfigError::Invalid(format!("inputs.{key} lists '{option}' twice")));
                }
            }
        }
        Ok(())
    }

    /// Write the config as pretty JSON, creating parent directories and
    /// replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |e: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent).map_err(io_err)?;
            }
        }
        let file = File::create(path).map_err(io_err)?;
        serde_json::to_writer_pretty(file, self).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Pick the config file: explicit flag, else `FORMCAST_CONFIG`, else none.
pub fn resolve_config_path(flag: Option<&Path>) -> Option<PathBuf> {
    dotenvy::dotenv().ok();
    flag.map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

/// Pick the model artifact: flag, `FORMCAST_MODEL`, config, variant default.
pub fn resolve_model_path(flag: Option<&Path>, config: Option<&AppConfig>, variant: AppVariant) -> PathBuf {
    dotenvy::dotenv().ok();
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os(MODEL_ENV) {
        return PathBuf::from(path);
    }
    match config {
        Some(config) => PathBuf::from(&config.model.path),
        None => PathBuf::from(variant.default_model_path()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_load_keeps_every_option_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.json");

        let config = AppConfig::default_for(AppVariant::Mushroom);
        config.write(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.inputs.len(), 22);
        assert_eq!(loaded.model.path, "models/mushroom-pipeline");
    }

    #[test]
    fn write_replaces_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "stale").unwrap();

        AppConfig::new("models/other", BTreeMap::new()).write(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap().model.path, "models/other");
    }

    #[test]
    fn inputs_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "model": { "path": "models/m" } }"#).unwrap();
        assert!(AppConfig::load(&path).unwrap().inputs.is_empty());
    }

    #[test]
    fn load_reports_parse_and_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = AppConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "inputs": {} }"#).unwrap();
        assert!(matches!(AppConfig::load(&path).unwrap_err(), ConfigError::Parse { .. }));
    }

    #[test]
    fn validate_rejects_unusable_option_lists() {
        let mut inputs = BTreeMap::new();
        inputs.insert("odor".to_string(), Vec::new());
        assert!(AppConfig::new("m", inputs).validate().is_err());

        let mut inputs = BTreeMap::new();
        inputs.insert("odor".to_string(), vec!["foul".to_string(), "foul".to_string()]);
        let err = AppConfig::new("m", inputs).validate().unwrap_err();
        assert!(err.to_string().contains("twice"));

        assert!(AppConfig::new(" ", BTreeMap::new()).validate().is_err());
    }

    #[test]
    fn explicit_model_flag_wins() {
        let config = AppConfig::new("models/from-config", BTreeMap::new());
        let path = resolve_model_path(Some(Path::new("models/flag")), Some(&config), AppVariant::Mushroom);
        assert_eq!(path, PathBuf::from("models/flag"));
    }
}
