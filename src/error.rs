//! Error taxonomy shared by the library and its callers.
//!
//! [`LoadError`] covers everything that can go wrong while reading a dataset.
//! [`AreaError`] is what query and export operations return; callers map it to
//! a transport status with [`AreaError::status_code()`] and render the body
//! with [`AreaError::payload()`].

use std::{io, path::PathBuf};

use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read dataset {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed workbook: {0}")]
    Workbook(String),
    #[error("Failed to decode text with encoding {0}")]
    Decode(&'static str),
    #[error("Unknown encoding '{0}'")]
    Encoding(String),
    #[error("Dataset has no columns")]
    Empty,
}

#[derive(Debug, Error)]
pub enum AreaError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("No area provided")]
    NoAreaProvided,
    #[error("No records found")]
    NoRecordsFound { suggestions: Option<Vec<String>> },
    #[error("Failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to write CSV export: {0}")]
    Csv(#[from] csv::Error),
}

impl AreaError {
    /// HTTP-style status for the caller: 400 for missing input, 404 for an
    /// empty match, 500 for everything else.
    pub fn status_code(&self) -> u16 {
        match self {
            AreaError::NoAreaProvided => 400,
            AreaError::NoRecordsFound { .. } => 404,
            AreaError::Load(_) | AreaError::Serialization(_) | AreaError::Csv(_) => 500,
        }
    }

    /// Caller-facing error body. Suggestions are attached under `try` when present.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            AreaError::NoRecordsFound {
                suggestions: Some(suggestions),
            } => json!({ "error": self.to_string(), "try": suggestions }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}
