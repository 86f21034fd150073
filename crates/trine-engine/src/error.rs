use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("type error: {0}")]
    Type(#[from] trine_types::TypeError),

    #[error("intern error: {0}")]
    Intern(#[from] trine_intern::InternError),

    #[error("index error: {0}")]
    Index(#[from] trine_index::IndexError),

    #[error("snapshot error: {0}")]
    Compress(#[from] trine_compress::CompressError),
}

pub type EngineResult<T> = Result<T, EngineError>;
