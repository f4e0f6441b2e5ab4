//! Error types for reptrack.
//!
//! These are construction-time and I/O errors. Per-frame failures are not
//! errors of this kind; see [`crate::session::FrameError`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepTrackError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Angle table / classifier wiring
    #[error("Invalid angle table: {message}")]
    AngleTable { message: String },

    #[error("Classifier {classifier} expects {expected} features, angle table produces {actual}")]
    FeatureLengthMismatch {
        classifier: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid classifier model {name}: {message}")]
    InvalidModel { name: String, message: String },

    // Model files
    #[error("Model file not found at {path}")]
    ModelFileNotFound { path: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RepTrackError>;
