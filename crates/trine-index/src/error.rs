//! Error types for the index crate.

use trine_types::{Position, TermId, TypeError};

/// Errors that can occur during index mutation.
///
/// Read paths never produce these: an out-of-range query is a miss.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IndexError {
    /// A triple component exceeds the configured capacity for its axis.
    #[error("{position} id {id} out of range (capacity {capacity})")]
    OutOfRange {
        position: Position,
        id: TermId,
        capacity: u32,
    },

    /// The wildcard id was used as a stored triple component.
    #[error("reserved id 0 used as {0}")]
    ReservedIdentifier(Position),

    /// A bit position at or beyond a bit vector's capacity.
    #[error("bit {index} out of range (capacity {capacity})")]
    BitOutOfRange { index: usize, capacity: usize },

    /// Memory could not be reserved for a new structure or for growth.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// The capacity passed at creation is unusable.
    #[error("invalid capacity: {0}")]
    InvalidCapacity(#[from] TypeError),
}

impl From<std::collections::TryReserveError> for IndexError {
    fn from(err: std::collections::TryReserveError) -> Self {
        IndexError::AllocationFailure(err.to_string())
    }
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
