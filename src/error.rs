use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Malformed capture input, or data whose shape the encoder/scaler rejects.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read capture {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported capture file {}: expected a .csv file", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("capture is not valid delimited text: {0}")]
    Malformed(#[from] csv::Error),

    #[error("no columns to parse from capture")]
    NoColumns,

    #[error("column '{column}' row {row}: missing value")]
    MissingValue { column: String, row: usize },

    #[error("column '{column}' row {row}: could not convert '{value}' to a number")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("'{0}' is not a known category of the protocol encoder")]
    UnknownCategory(String),

    #[error("{stage} expects {expected} column(s), got {actual}")]
    Shape {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// The classifier rejected the feature table or returned unusable labels.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("feature names {actual:?} do not match {expected:?} seen at fit time")]
    FeatureMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("model returned {actual} label(s) for {expected} row(s)")]
    LabelCount { expected: usize, actual: usize },

    #[error("model produced non-binary label {0}")]
    NonBinaryLabel(i64),

    #[error("no classifier registered")]
    NoModel,

    #[error("model failed: {0}")]
    Model(String),
}

/// An artifact file could not be read or does not describe a usable artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse artifact {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {artifact}: {reason}")]
    Invalid {
        artifact: &'static str,
        reason: String,
    },
}

impl ArtifactError {
    pub(crate) fn invalid(artifact: &'static str, reason: impl Into<String>) -> Self {
        ArtifactError::Invalid {
            artifact,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no {0} artifact configured (use --{0} or the config file)")]
    Missing(&'static str),
}

/// Failure of a single detection run. Messages pass through unchanged.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

pub type DetectionResult<T> = std::result::Result<T, DetectionError>;
