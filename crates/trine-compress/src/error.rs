use thiserror::Error;

use trine_types::TermId;

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("invalid snapshot magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),

    #[error("snapshot checksum mismatch: expected {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    #[error("corrupt snapshot: {0}")]
    Corrupt(String),

    #[error("bit {index} out of range (capacity {capacity})")]
    OutOfRange { index: usize, capacity: usize },

    #[error("term not in snapshot: {0}")]
    UnknownTerm(TermId),

    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    #[error("compression failed: {0}")]
    Compression(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::collections::TryReserveError> for CompressError {
    fn from(err: std::collections::TryReserveError) -> Self {
        CompressError::AllocationFailure(err.to_string())
    }
}

pub type CompressResult<T> = Result<T, CompressError>;
