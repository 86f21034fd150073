use thiserror::Error;

use crate::triple::Position;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid capacity: {axis} axis must be non-zero")]
    InvalidCapacity { axis: Position },

    #[error("invalid term id: {0}")]
    InvalidTermId(String),
}
