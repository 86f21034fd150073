//! String interning for the Trine triple store.
//!
//! Every IRI, blank node label, and literal is interned once into a dense
//! [`TermId`](trine_types::TermId). The rest of the engine never sees text.
//!
//! # Design Rules
//!
//! 1. Interning is idempotent: the same text always yields the same id.
//! 2. Ids are issued sequentially from `1` and never reused; `0` is the wildcard.
//! 3. Lookup is hash-based, O(1) expected. There is no linear-scan fallback.
//! 4. Each string is stored once and shared by both directions of the map.

pub mod error;
pub mod interner;

pub use error::{InternError, InternResult};
pub use interner::Interner;
