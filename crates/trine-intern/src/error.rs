//! Error types for the interner.

use trine_types::TermId;

/// Errors that can occur during interner operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InternError {
    /// The id was never issued by this interner.
    #[error("term id not found: {0}")]
    NotFound(TermId),

    /// Every non-zero 32-bit id has been issued.
    #[error("identifier space exhausted after {issued} terms")]
    Exhausted { issued: usize },
}

/// Convenience alias for interner results.
pub type InternResult<T> = Result<T, InternError>;
