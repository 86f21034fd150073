//! Per-predicate presence rows.
//!
//! A [`PredicateRow`] answers "does this predicate have any triple with
//! subject `s`" (or object `o`) with one bit test, which backs wildcard asks.

use trine_types::{Capacity, TermId};

use crate::bitvec::BitVector;
use crate::error::IndexResult;

/// Presence vectors for one predicate.
///
/// Subject bit `s` is set iff the predicate has at least one triple with
/// subject `s`; object bit `o` likewise for objects.
#[derive(Clone, Debug)]
pub struct PredicateRow {
    subjects: BitVector,
    objects: BitVector,
    triples: usize,
}

impl PredicateRow {
    /// Allocate an empty row sized to `capacity`.
    pub fn try_new(capacity: &Capacity) -> IndexResult<Self> {
        Ok(Self {
            subjects: BitVector::try_new(capacity.max_subjects as usize)?,
            objects: BitVector::try_new(capacity.max_objects as usize)?,
            triples: 0,
        })
    }

    /// Subject-presence vector.
    pub fn subjects(&self) -> &BitVector {
        &self.subjects
    }

    /// Object-presence vector.
    pub fn objects(&self) -> &BitVector {
        &self.objects
    }

    /// Number of distinct triples recorded under this predicate.
    pub fn triple_count(&self) -> usize {
        self.triples
    }

    /// Returns `true` if the predicate has no triples.
    pub fn is_empty(&self) -> bool {
        self.triples == 0
    }

    /// Returns `true` if some triple of this predicate has `subject`.
    /// Out-of-range ids read as absent.
    #[inline]
    pub fn has_subject(&self, subject: TermId) -> bool {
        self.subjects.contains(subject.index())
    }

    /// Returns `true` if some triple of this predicate has `object`.
    #[inline]
    pub fn has_object(&self, object: TermId) -> bool {
        self.objects.contains(object.index())
    }

    /// Record a new triple. Ids must already be bounds-checked.
    pub(crate) fn record(&mut self, subject: TermId, object: TermId) {
        self.subjects.insert(subject.index());
        self.objects.insert(object.index());
        self.triples += 1;
    }

    /// Heap footprint in bytes.
    pub fn heap_bytes(&self) -> usize {
        self.subjects.heap_bytes() + self.objects.heap_bytes()
    }
}
