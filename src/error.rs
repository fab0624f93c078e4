//! Error types for the RFM pipeline.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RfmError {
    /// A field in the input could not be used. `row` is 1-based over data
    /// rows (the header is not counted).
    #[error("row {row}, field `{field}`: {message}")]
    DataFormat {
        row: usize,
        field: &'static str,
        message: String,
    },

    #[error("input contains no customers; cannot anchor the analysis date")]
    EmptyDataset,

    #[error("{population} customers cannot fill {buckets} quantile buckets")]
    InsufficientData { population: usize, buckets: usize },

    #[error("rf code {rf_code:?} matches no segment rule")]
    UnmappedSegment { rf_code: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("required column `{0}` is missing from the input")]
    MissingColumn(&'static str),

    #[error("failed to draw chart: {0}")]
    Chart(String),

    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RfmError {
    pub(crate) fn data_format(row: usize, field: &'static str, message: impl Into<String>) -> Self {
        RfmError::DataFormat {
            row,
            field,
            message: message.into(),
        }
    }
}

pub type Result<T, E = RfmError> = std::result::Result<T, E>;
