use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::term::TermId;
use crate::triple::Position;

/// Per-axis identifier bounds, fixed when an index is created.
///
/// An id is in range for an axis iff `id < bound`. Bit vectors are sized
/// to the bound, so the largest usable id is `bound - 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    pub max_subjects: u32,
    pub max_predicates: u32,
    pub max_objects: u32,
}

/// Default bound on every axis. Subjects, predicates and objects draw ids
/// from one sequence, so the axes share a bound.
pub const DEFAULT_BOUND: u32 = 1 << 20;

impl Default for Capacity {
    fn default() -> Self {
        Self::uniform(DEFAULT_BOUND)
    }
}

impl Capacity {
    /// The same bound on every axis.
    pub fn uniform(bound: u32) -> Self {
        Self {
            max_subjects: bound,
            max_predicates: bound,
            max_objects: bound,
        }
    }

    /// The bound for one axis.
    pub fn bound(&self, position: Position) -> u32 {
        match position {
            Position::Subject => self.max_subjects,
            Position::Predicate => self.max_predicates,
            Position::Object => self.max_objects,
        }
    }

    /// Returns `true` if `id` fits the axis at `position`.
    #[inline]
    pub fn admits(&self, position: Position, id: TermId) -> bool {
        id.get() < self.bound(position)
    }

    /// Reject zero bounds.
    pub fn validate(&self) -> Result<(), TypeError> {
        for axis in [Position::Subject, Position::Predicate, Position::Object] {
            if self.bound(axis) == 0 {
                return Err(TypeError::InvalidCapacity { axis });
            }
        }
        Ok(())
    }
}
