//! Foundation types for the Trine triple store.
//!
//! This crate provides the identifier, triple, and capacity types shared by
//! every other Trine crate. Nothing here touches text: strings are mapped to
//! [`TermId`]s by the interner and the rest of the engine works on ids only.
//!
//! # Key Types
//!
//! - [`TermId`] — Dense 32-bit identifier; `0` is the wildcard
//! - [`Triple`] — A concrete (subject, predicate, object) fact
//! - [`TriplePattern`] — A triple whose positions may be wildcards
//! - [`Position`] — Which slot of a triple an id occupies
//! - [`Capacity`] — Per-axis identifier bounds fixed at engine creation

pub mod capacity;
pub mod error;
pub mod term;
pub mod triple;

pub use capacity::Capacity;
pub use error::TypeError;
pub use term::TermId;
pub use triple::{Position, Triple, TriplePattern};
