//! error.rs: typed failures at the component boundaries.
//!
//! Only `ClassifyError::InvalidInput` and `ExportError::NotFound` are meant to
//! reach an HTTP client. Everything else is absorbed by the component that
//! produced it and shows up as a degraded result plus a log record.

use thiserror::Error;

/// Failure returned by `InferenceService::classify`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("`text` field is required")]
    InvalidInput,
}

/// Failure returned by the CSV export.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("no history available")]
    NotFound,
}

/// Internal history failures. Logged by `HistoryLog`, surfaced only through
/// `clear()` so the transport can report a failed clear.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("history serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A trained classifier could not produce an answer for this input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifierFailure {
    #[error("feature index {index} outside model width {width}")]
    DimensionMismatch { index: usize, width: usize },
    #[error("model has {classes} classes but produced {outputs} outputs")]
    ShapeMismatch { classes: usize, outputs: usize },
    #[error("model produced a non-finite score")]
    NonFinite,
    #[error("spam class index {index} outside probability vector of length {len}")]
    SpamIndexOutOfRange { index: usize, len: usize },
}

/// Loading one artifact candidate failed. The store moves to the next candidate.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("decoding {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid artifact {path}: {reason}")]
    Invalid { path: String, reason: String },
}

/// Dataset problems met by the bootstrap trainer.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset not found in any candidate location")]
    Missing,
    #[error("reading dataset {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("dataset has no header row")]
    NoHeader,
    #[error("dataset has no usable rows")]
    Empty,
    #[error("dataset still has a single class after relabeling")]
    SingleClass,
    #[error("dataset yields no features after tokenization")]
    NoFeatures,
}
