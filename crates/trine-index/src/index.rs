//! The live [`TripleIndex`].
//!
//! Combines lazily allocated [`PredicateRow`]s with two [`Adjacency`] maps:
//! `(p, s)` → objects and its mirror `(p, o)` → subjects. Every triple is
//! recorded in all three; an insert either lands in all of them or in none.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use trine_types::{Capacity, Position, TermId, Triple};

use crate::arena::{Adjacency, Values};
use crate::bitvec::{BitVector, Ones};
use crate::error::{IndexError, IndexResult};
use crate::row::PredicateRow;

/// Size and footprint summary of a [`TripleIndex`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub predicates: usize,
    pub triples: usize,
    pub subject_keys: usize,
    pub object_keys: usize,
    pub arena_chunks: usize,
    pub heap_bytes: usize,
}

/// In-memory triple index with fixed per-axis capacity.
#[derive(Clone)]
pub struct TripleIndex {
    capacity: Capacity,
    /// Rows of predicates with at least one triple, allocated on first use.
    rows: HashMap<TermId, PredicateRow>,
    /// Predicates with a row, in first-use order.
    active: Vec<TermId>,
    /// (p, s) -> objects.
    ps_o: Adjacency,
    /// (p, o) -> subjects.
    po_s: Adjacency,
    triples: usize,
}

impl TripleIndex {
    /// Create an empty index bounded by `capacity`.
    pub fn new(capacity: Capacity) -> IndexResult<Self> {
        capacity.validate()?;
        debug!(
            subjects = capacity.max_subjects,
            predicates = capacity.max_predicates,
            objects = capacity.max_objects,
            "created triple index"
        );
        Ok(Self {
            capacity,
            rows: HashMap::new(),
            active: Vec::new(),
            ps_o: Adjacency::new(),
            po_s: Adjacency::new(),
            triples: 0,
        })
    }

    /// The bounds fixed at creation.
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Number of distinct triples.
    pub fn len(&self) -> usize {
        self.triples
    }

    /// Returns `true` if no triple has been added.
    pub fn is_empty(&self) -> bool {
        self.triples == 0
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Add a triple. Returns `false` if it was already present.
    ///
    /// Fails with [`IndexError::OutOfRange`] if any component exceeds the
    /// capacity of its axis and [`IndexError::ReservedIdentifier`] if any
    /// component is the wildcard. On error nothing is modified.
    pub fn add_triple(&mut self, triple: Triple) -> IndexResult<bool> {
        self.check(&triple)?;
        let Triple {
            subject: s,
            predicate: p,
            object: o,
        } = triple;

        if self.ps_o.contains(p, s, o) {
            return Ok(false);
        }

        // Reserve everything up front so the commit below cannot fail halfway.
        let fresh_row = if self.rows.contains_key(&p) {
            None
        } else {
            self.rows.try_reserve(1)?;
            self.active.try_reserve(1)?;
            Some(PredicateRow::try_new(&self.capacity)?)
        };
        self.ps_o.reserve_for(p, s)?;
        self.po_s.reserve_for(p, o)?;

        if let Some(row) = fresh_row {
            debug!(predicate = %p, "allocated predicate row");
            self.rows.insert(p, row);
            self.active.push(p);
        }
        if let Some(row) = self.rows.get_mut(&p) {
            row.record(s, o);
        }
        self.ps_o.append(p, s, o);
        self.po_s.append(p, o, s);
        self.triples += 1;
        Ok(true)
    }

    /// Convenience form of [`add_triple`](Self::add_triple).
    pub fn insert(&mut self, subject: TermId, predicate: TermId, object: TermId) -> IndexResult<bool> {
        self.add_triple(Triple::new(subject, predicate, object))
    }

    fn check(&self, triple: &Triple) -> IndexResult<()> {
        for position in [Position::Subject, Position::Predicate, Position::Object] {
            let id = triple.get(position);
            if id.is_wildcard() {
                return Err(IndexError::ReservedIdentifier(position));
            }
            if !self.capacity.admits(position, id) {
                return Err(IndexError::OutOfRange {
                    position,
                    id,
                    capacity: self.capacity.bound(position),
                });
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Lookups (never fail; out of range reads as absent)
    // ---------------------------------------------------------------

    /// The presence row for `predicate`, if it has any triple.
    #[inline]
    pub fn row(&self, predicate: TermId) -> Option<&PredicateRow> {
        self.rows.get(&predicate)
    }

    /// Returns `true` if the exact triple is stored.
    #[inline]
    pub fn contains(&self, subject: TermId, predicate: TermId, object: TermId) -> bool {
        self.ps_o.contains(predicate, subject, object)
    }

    /// Returns `true` if `predicate` has any triple with `subject`.
    #[inline]
    pub fn has_subject(&self, predicate: TermId, subject: TermId) -> bool {
        self.row(predicate).is_some_and(|row| row.has_subject(subject))
    }

    /// Returns `true` if `predicate` has any triple with `object`.
    #[inline]
    pub fn has_object(&self, predicate: TermId, object: TermId) -> bool {
        self.row(predicate).is_some_and(|row| row.has_object(object))
    }

    /// Objects linked to `subject` through `predicate`, in insertion order.
    pub fn objects(&self, predicate: TermId, subject: TermId) -> Values<'_> {
        self.ps_o.values(predicate, subject)
    }

    /// Subjects linked to `object` through `predicate`, in insertion order.
    pub fn subjects(&self, predicate: TermId, object: TermId) -> Values<'_> {
        self.po_s.values(predicate, object)
    }

    /// Predicates with at least one triple, in first-use order.
    pub fn predicates(&self) -> impl Iterator<Item = TermId> + '_ {
        self.active.iter().copied()
    }

    /// Number of predicates with at least one triple.
    pub fn predicate_count(&self) -> usize {
        self.active.len()
    }

    /// Fresh vector of every subject `s` with `(s, predicate, object)`.
    ///
    /// A wildcard `object` yields every subject of the predicate. The vector
    /// is sized to the subject capacity and owned by the caller.
    pub fn get_subject_vector(&self, predicate: TermId, object: TermId) -> BitVector {
        if object.is_wildcard() {
            return match self.row(predicate) {
                Some(row) => row.subjects().clone(),
                None => BitVector::new(self.capacity.max_subjects as usize),
            };
        }
        let mut out = BitVector::new(self.capacity.max_subjects as usize);
        for subject in self.subjects(predicate, object) {
            out.insert(subject.index());
        }
        out
    }

    /// Fresh vector of every object `o` with `(subject, predicate, o)`.
    ///
    /// A wildcard `subject` yields every object of the predicate. The vector
    /// is sized to the object capacity and owned by the caller.
    pub fn get_object_vector(&self, predicate: TermId, subject: TermId) -> BitVector {
        if subject.is_wildcard() {
            return match self.row(predicate) {
                Some(row) => row.objects().clone(),
                None => BitVector::new(self.capacity.max_objects as usize),
            };
        }
        let mut out = BitVector::new(self.capacity.max_objects as usize);
        for object in self.objects(predicate, subject) {
            out.insert(object.index());
        }
        out
    }

    /// Every stored triple, grouped by predicate then ascending subject.
    pub fn iter_triples(&self) -> Triples<'_> {
        Triples {
            index: self,
            predicates: self.active.iter(),
            predicate: TermId::WILDCARD,
            subject: TermId::WILDCARD,
            subjects: None,
            objects: None,
        }
    }

    /// Size and footprint summary.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            predicates: self.active.len(),
            triples: self.triples,
            subject_keys: self.ps_o.key_count(),
            object_keys: self.po_s.key_count(),
            arena_chunks: self.ps_o.arena().chunk_count() + self.po_s.arena().chunk_count(),
            heap_bytes: self.heap_bytes(),
        }
    }

    /// Approximate heap footprint in bytes.
    pub fn heap_bytes(&self) -> usize {
        let slots = self.rows.capacity() * std::mem::size_of::<(TermId, PredicateRow)>();
        let rows: usize = self.rows.values().map(PredicateRow::heap_bytes).sum();
        slots
            + rows
            + self.active.capacity() * std::mem::size_of::<TermId>()
            + self.ps_o.heap_bytes()
            + self.po_s.heap_bytes()
    }
}

impl std::fmt::Debug for TripleIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripleIndex")
            .field("capacity", &self.capacity)
            .field("predicates", &self.active.len())
            .field("triples", &self.triples)
            .finish()
    }
}

/// Iterator over every triple of a [`TripleIndex`].
pub struct Triples<'a> {
    index: &'a TripleIndex,
    predicates: std::slice::Iter<'a, TermId>,
    predicate: TermId,
    subject: TermId,
    subjects: Option<Ones<'a>>,
    objects: Option<Values<'a>>,
}

impl Iterator for Triples<'_> {
    type Item = Triple;

    fn next(&mut self) -> Option<Triple> {
        loop {
            if let Some(objects) = self.objects.as_mut() {
                if let Some(object) = objects.next() {
                    return Some(Triple::new(self.subject, self.predicate, object));
                }
                self.objects = None;
            }
            if let Some(subjects) = self.subjects.as_mut() {
                if let Some(subject) = subjects.next() {
                    self.subject = TermId::new(subject as u32);
                    self.objects = Some(self.index.objects(self.predicate, self.subject));
                    continue;
                }
                self.subjects = None;
            }
            self.predicate = *self.predicates.next()?;
            self.subjects = self
                .index
                .row(self.predicate)
                .map(|row| row.subjects().iter_ones());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;

    fn t(raw: u32) -> TermId {
        TermId::new(raw)
    }

    fn small() -> TripleIndex {
        TripleIndex::new(Capacity::uniform(64)).unwrap()
    }

    // -----------------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------------

    #[test]
    fn add_and_contains() {
        let mut idx = small();
        assert!(idx.insert(t(1), t(2), t(3)).unwrap());
        assert!(idx.contains(t(1), t(2), t(3)));
        assert!(idx.has_subject(t(2), t(1)));
        assert!(idx.has_object(t(2), t(3)));
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn duplicate_triple_is_idempotent() {
        let mut idx = small();
        assert!(idx.insert(t(1), t(2), t(3)).unwrap());
        assert!(!idx.insert(t(1), t(2), t(3)).unwrap());
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.objects(t(2), t(1)).collect::<Vec<_>>(), vec![t(3)]);
        assert_eq!(idx.subjects(t(2), t(3)).collect::<Vec<_>>(), vec![t(1)]);
        assert_eq!(idx.row(t(2)).unwrap().triple_count(), 1);
    }

    #[test]
    fn multiple_objects_per_subject_are_all_kept() {
        let mut idx = small();
        idx.insert(t(1), t(2), t(3)).unwrap();
        idx.insert(t(1), t(2), t(4)).unwrap();
        idx.insert(t(1), t(2), t(5)).unwrap();
        idx.insert(t(1), t(2), t(6)).unwrap();
        idx.insert(t(1), t(2), t(7)).unwrap();
        for o in 3..=7 {
            assert!(idx.contains(t(1), t(2), t(o)), "object {o} lost");
        }
        assert_eq!(
            idx.objects(t(2), t(1)).map(TermId::get).collect::<Vec<_>>(),
            vec![3, 4, 5, 6, 7]
        );
    }

    #[test]
    fn rows_allocate_lazily() {
        let mut idx = small();
        assert!(idx.row(t(2)).is_none());
        idx.insert(t(1), t(2), t(3)).unwrap();
        assert!(idx.row(t(2)).is_some());
        assert!(idx.row(t(5)).is_none());
        assert_eq!(idx.predicates().collect::<Vec<_>>(), vec![t(2)]);
    }

    // -----------------------------------------------------------------------
    // Bounds and atomicity
    // -----------------------------------------------------------------------

    #[test]
    fn out_of_range_is_rejected_per_axis() {
        let mut idx = TripleIndex::new(Capacity {
            max_subjects: 10,
            max_predicates: 4,
            max_objects: 20,
        })
        .unwrap();

        let err = idx.insert(t(10), t(1), t(1)).unwrap_err();
        assert_eq!(
            err,
            IndexError::OutOfRange {
                position: Position::Subject,
                id: t(10),
                capacity: 10
            }
        );
        assert!(matches!(
            idx.insert(t(1), t(4), t(1)),
            Err(IndexError::OutOfRange {
                position: Position::Predicate,
                ..
            })
        ));
        assert!(matches!(
            idx.insert(t(1), t(1), t(20)),
            Err(IndexError::OutOfRange {
                position: Position::Object,
                ..
            })
        ));
        assert!(idx.insert(t(9), t(3), t(19)).unwrap());
    }

    #[test]
    fn wildcard_component_is_rejected() {
        let mut idx = small();
        assert_eq!(
            idx.insert(t(0), t(1), t(1)),
            Err(IndexError::ReservedIdentifier(Position::Subject))
        );
        assert_eq!(
            idx.insert(t(1), t(1), t(0)),
            Err(IndexError::ReservedIdentifier(Position::Object))
        );
    }

    #[test]
    fn failed_insert_leaves_index_unchanged() {
        let mut idx = small();
        idx.insert(t(1), t(2), t(3)).unwrap();
        let before = idx.iter_triples().collect::<Vec<_>>();

        assert!(idx.insert(t(1), t(2), t(64)).is_err());
        assert!(idx.insert(t(1), t(9), t(99)).is_err());

        assert_eq!(idx.iter_triples().collect::<Vec<_>>(), before);
        assert!(idx.row(t(9)).is_none());
        assert!(!idx.has_subject(t(9), t(1)));
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let err = TripleIndex::new(Capacity::uniform(0)).unwrap_err();
        assert!(matches!(err, IndexError::InvalidCapacity(_)));
    }

    #[test]
    fn reads_beyond_capacity_are_misses() {
        let mut idx = small();
        idx.insert(t(1), t(2), t(3)).unwrap();
        assert!(!idx.contains(t(1000), t(2), t(3)));
        assert!(!idx.has_subject(t(2000), t(1)));
        assert!(!idx.has_object(t(2), t(5000)));
        assert!(idx.row(t(u32::MAX)).is_none());
        assert_eq!(idx.objects(t(2), t(u32::MAX)).count(), 0);
    }

    // -----------------------------------------------------------------------
    // Vectors
    // -----------------------------------------------------------------------

    #[test]
    fn subject_vector_lists_all_subjects() {
        let mut idx = small();
        idx.insert(t(1), t(10), t(20)).unwrap();
        idx.insert(t(2), t(10), t(20)).unwrap();
        idx.insert(t(3), t(10), t(21)).unwrap();

        let v = idx.get_subject_vector(t(10), t(20));
        assert_eq!(v.capacity(), 64);
        assert_eq!(v.iter_ones().collect::<Vec<_>>(), vec![1, 2]);

        let all = idx.get_subject_vector(t(10), TermId::WILDCARD);
        assert_eq!(all.iter_ones().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn object_vector_lists_all_objects() {
        let mut idx = small();
        idx.insert(t(1), t(10), t(20)).unwrap();
        idx.insert(t(1), t(10), t(22)).unwrap();
        idx.insert(t(2), t(10), t(21)).unwrap();

        let v = idx.get_object_vector(t(10), t(1));
        assert_eq!(v.iter_ones().collect::<Vec<_>>(), vec![20, 22]);
        assert_eq!(v.popcount(), 2);

        let none = idx.get_object_vector(t(11), t(1));
        assert!(none.is_empty());
    }

    #[test]
    fn returned_vectors_are_independent_copies() {
        let mut idx = small();
        idx.insert(t(1), t(10), t(20)).unwrap();
        let mut v = idx.get_subject_vector(t(10), TermId::WILDCARD);
        v.set(5).unwrap();
        assert!(idx.has_subject(t(10), t(1)));
        assert!(!idx.has_subject(t(10), t(5)));

        idx.insert(t(7), t(10), t(20)).unwrap();
        assert!(!v.contains(7));
    }

    // -----------------------------------------------------------------------
    // Iteration and stats
    // -----------------------------------------------------------------------

    #[test]
    fn iter_triples_visits_everything_once() {
        let mut idx = small();
        let input = [(3, 1, 4), (1, 1, 5), (1, 1, 9), (2, 6, 5), (3, 5, 8)];
        for &(s, p, o) in &input {
            idx.insert(t(s), t(p), t(o)).unwrap();
        }
        let mut got: Vec<Triple> = idx.iter_triples().collect();
        got.sort();
        let mut want: Vec<Triple> = input.iter().map(|&tr| Triple::from(tr)).collect();
        want.sort();
        assert_eq!(got, want);
    }

    #[test]
    fn iter_triples_order() {
        let mut idx = small();
        idx.insert(t(3), t(1), t(4)).unwrap();
        idx.insert(t(1), t(1), t(5)).unwrap();
        idx.insert(t(1), t(1), t(2)).unwrap();
        let got: Vec<_> = idx.iter_triples().collect();
        assert_eq!(
            got,
            vec![
                Triple::from((1, 1, 5)),
                Triple::from((1, 1, 2)),
                Triple::from((3, 1, 4)),
            ]
        );
    }

    #[test]
    fn stats_reflect_content() {
        let mut idx = small();
        idx.insert(t(1), t(2), t(3)).unwrap();
        idx.insert(t(1), t(2), t(4)).unwrap();
        idx.insert(t(5), t(6), t(3)).unwrap();
        let stats = idx.stats();
        assert_eq!(stats.predicates, 2);
        assert_eq!(stats.triples, 3);
        assert_eq!(stats.subject_keys, 2);
        assert_eq!(stats.object_keys, 3);
        assert!(stats.heap_bytes > 0);
    }

    #[test]
    fn predicate_rows_are_sparse() {
        let mut idx = TripleIndex::new(Capacity::default()).unwrap();
        let before = idx.heap_bytes();
        idx.insert(t(1), t(900_000), t(2)).unwrap();
        idx.insert(t(3), t(5), t(4)).unwrap();
        assert!(idx.contains(t(1), t(900_000), t(2)));
        assert!(idx.has_subject(t(900_000), t(1)));
        assert!(idx.row(t(6)).is_none());
        assert_eq!(idx.predicate_count(), 2);
        // Only the two touched rows cost anything.
        let row = idx.row(t(5)).unwrap().heap_bytes();
        assert!(idx.heap_bytes() - before < 3 * row);
    }

    #[test]
    fn debug_format() {
        let idx = small();
        let debug = format!("{idx:?}");
        assert!(debug.contains("TripleIndex"));
        assert!(debug.contains("triples"));
    }

    // -----------------------------------------------------------------------
    // Model check
    // -----------------------------------------------------------------------

    proptest! {
        #[test]
        fn agrees_with_set_model(
            triples in proptest::collection::vec((1u32..16, 1u32..6, 1u32..16), 0..80),
        ) {
            let mut idx = TripleIndex::new(Capacity::uniform(16)).unwrap();
            let mut model = BTreeSet::new();
            for &(s, p, o) in &triples {
                let fresh = idx.insert(t(s), t(p), t(o)).unwrap();
                prop_assert_eq!(fresh, model.insert((s, p, o)));
            }
            prop_assert_eq!(idx.len(), model.len());

            let listed: BTreeSet<_> = idx
                .iter_triples()
                .map(|tr| (tr.subject.get(), tr.predicate.get(), tr.object.get()))
                .collect();
            prop_assert_eq!(&listed, &model);

            for &(s, p, o) in &model {
                prop_assert!(idx.contains(t(s), t(p), t(o)));
                prop_assert!(idx.get_object_vector(t(p), t(s)).contains(o as usize));
                prop_assert!(idx.get_subject_vector(t(p), t(o)).contains(s as usize));
            }
        }
    }
}
