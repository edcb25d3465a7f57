//! Error types for querydiff operations

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuerydiffError>;

#[derive(Error, Debug)]
pub enum QuerydiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Data integrity error in {dataset} dataset, row {row}, field '{field}': {message}")]
    DataIntegrity {
        dataset: String,
        row: usize,
        field: String,
        message: String,
    },

    #[error("Schema mismatch: {message}")]
    SchemaMismatch { message: String },

    #[error("Duplicate fingerprint {fingerprint} in {dataset} dataset (rows {first_row} and {second_row})")]
    DuplicateFingerprint {
        dataset: String,
        fingerprint: String,
        first_row: usize,
        second_row: usize,
    },

    #[error("Warm-up failed: {message}")]
    WarmUp { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl QuerydiffError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn source_not_found(path: impl Into<PathBuf>) -> Self {
        Self::SourceNotFound { path: path.into() }
    }

    pub fn data_integrity(
        dataset: impl Into<String>,
        row: usize,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::DataIntegrity {
            dataset: dataset.into(),
            row,
            field: field.into(),
            message: msg.into(),
        }
    }

    pub fn schema_mismatch(msg: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: msg.into(),
        }
    }

    pub fn warm_up(msg: impl Into<String>) -> Self {
        Self::WarmUp {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }
}
