//! Query evaluation over a [`TripleIndex`](trine_index::TripleIndex).
//!
//! - [`PatternMatcher`] -- `ask` for single and batched triple patterns, and
//!   enumeration of matching triples
//! - [`TransitiveReasoner`] -- depth-bounded reachability along one predicate,
//!   the building block for OWL transitive properties
//!
//! Both borrow the index immutably. Evaluation never fails: ids outside the
//! index capacity simply match nothing.

pub mod matcher;
pub mod reasoner;

pub use matcher::PatternMatcher;
pub use reasoner::{TransitiveReasoner, DEFAULT_MAX_DEPTH};
