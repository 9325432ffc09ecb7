use crate::app::pipeline::PredictError;
use crate::io::config::ConfigError;
use crate::models::ModelError;

/// Error surfaced by the binary: a message plus the process exit code.
///
/// Exit codes:
/// - `2` bad input, flags or configuration
/// - `3` a derived feature was rejected by the anomaly policy
/// - `4` model or terminal failure
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        let code = match err {
            PredictError::Validation(_) => 2,
            PredictError::Record(_) => 4,
            PredictError::DerivedAnomaly(_) => 3,
            PredictError::Invocation(_) => 4,
        };
        AppError::new(code, err.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(2, err.to_string())
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::new(4, err.to_string())
    }
}
