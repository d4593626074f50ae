//! Errors raised while building or rendering a temperature map.

use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to download {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to download {url}: {status}")]
    FetchStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed station record: {0}")]
    Parse(String),

    #[error("Observation archive could not be parsed")]
    Archive(#[from] ArrowError),

    #[error("Points artifact could not be assembled")]
    Artifact(#[source] ArrowError),

    #[error("No data: {0}")]
    EmptyResult(String),

    #[error("Cannot visualise `{}`: {reason}", .path.display())]
    Visualization { path: PathBuf, reason: String },

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Parquet error")]
    Parquet(#[from] ParquetError),
}

impl Error {
    pub fn visualization(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Visualization {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
