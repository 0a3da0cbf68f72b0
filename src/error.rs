use std::path::PathBuf;
use thiserror::Error;

/// Startup failures while reading the model or feature schema.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("feature schema is empty")]
    EmptySchema,

    #[error("feature schema lists column {0:?} more than once")]
    DuplicateColumn(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("TorchScript model {0} requires building with the `torch` feature")]
    TorchUnavailable(PathBuf),

    #[error("model warm-up failed: {0}")]
    WarmUp(#[from] ModelError),
}

/// Failures raised by a loaded model at inference time.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("feature length mismatch: got {got}, expected {expected}")]
    LengthMismatch { got: usize, expected: usize },

    #[error("model produced a non-finite value ({0})")]
    NonFinite(f64),

    #[error("inference backend error: {0}")]
    Backend(String),
}

/// Rejected form or JSON input.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be at least {min} (got {value})")]
    BelowMinimum {
        field: &'static str,
        min: f64,
        value: f64,
    },
}

/// Anything that stops a single prediction request.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error("prediction failed: {0}")]
    Model(#[from] ModelError),
}

impl PredictError {
    /// True when the caller, not the model, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PredictError::Input(_))
    }
}
