//! Live triple index for the Trine triple store.
//!
//! Triples are never stored as records. A triple `(s, p, o)` exists iff it is
//! reachable through two complementary structures:
//!
//! - a [`PredicateRow`] per predicate: one [`BitVector`] over subjects and one
//!   over objects, answering "does `p` have any triple with subject `s`" with a
//!   single word probe;
//! - an [`Adjacency`] keyed by `(p, s)` listing every object in insertion order,
//!   plus a mirrored `(p, o)` → subjects adjacency for reverse lookups.
//!
//! Existence checks stay O(1); enumerating related terms is O(fan-out). A
//! `(p, s)` pair may hold any number of objects, none ever overwritten.
//!
//! # Key Types
//!
//! - [`BitVector`] -- fixed-capacity bitset with word-parallel popcount
//! - [`ObjectArena`] / [`Adjacency`] -- chunked append-only id lists
//! - [`TripleIndex`] -- the combined index with bounds-checked mutation
//!
//! # Design Rules
//!
//! 1. Capacity is fixed at creation. Writes beyond it fail; reads beyond it
//!    answer "absent".
//! 2. A failed write leaves the index unchanged.
//! 3. Adding a triple twice is a no-op.
//! 4. Vectors handed out by queries are fresh copies, never views.

pub mod arena;
pub mod bitvec;
pub mod error;
pub mod index;
pub mod row;

pub use arena::{Adjacency, ObjectArena, Span, Values};
pub use bitvec::{BitVector, Ones};
pub use error::{IndexError, IndexResult};
pub use index::{IndexStats, TripleIndex, Triples};
pub use row::PredicateRow;
