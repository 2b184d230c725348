use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort alignment, preprocessing or correlation.
///
/// No variant carries a partial result: a failed computation produces no
/// matrices at all.
#[derive(Debug, Error)]
pub enum CosError {
    /// Row counts (or observation counts) of two inputs disagree.
    #[error("data mismatch in {context}: expected {expected} rows, found {actual}")]
    DataMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Strict alignment found a replicate on a different wavenumber grid.
    #[error("replicate {replicate} differs from the first replicate's grid at row {row}: expected {expected}, found {actual}")]
    GridMismatch {
        replicate: usize,
        row: usize,
        expected: f64,
        actual: f64,
    },

    #[error("invalid filter parameters (window_length = {window_length}, polyorder = {polyorder}): {reason}")]
    InvalidFilterParameters {
        window_length: usize,
        polyorder: usize,
        reason: String,
    },

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("numerical failure: {0}")]
    Numerical(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed table {}: {reason}", .path.display())]
    Format { path: PathBuf, reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, CosError>;

impl CosError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CosError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        CosError::Csv {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CosError::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
