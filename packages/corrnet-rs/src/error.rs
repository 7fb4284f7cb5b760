use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum CorrNetError {
    #[error("malformed sample row at byte offset {offset}: {reason}")]
    MalformedSample { offset: u64, reason: String },

    #[error("stream length mismatch: location {location} has {actual} samples, expected {expected}")]
    DimensionMismatch {
        location: i64,
        expected: usize,
        actual: usize,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("serialized sketch column is {actual} characters, limit is {limit}")]
    RowOverflow { actual: usize, limit: usize },

    #[error("sketch store error: {0}")]
    Store(#[from] StoreError),

    #[error("sketch pipeline channel closed before all batches were delivered")]
    PipelineClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CorrNetError>;
