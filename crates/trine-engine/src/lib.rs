//! The Trine triple store.
//!
//! [`Engine`] is the single handle an application holds. It owns the term
//! interner and the triple index; queries borrow it immutably, writes need
//! `&mut`. There is no global state, so several engines can live side by
//! side in one process.
//!
//! # Key Types
//!
//! - [`Engine`] -- intern, insert, ask, reason, snapshot
//! - [`EngineConfig`] -- capacity, reasoning depth, snapshot tuning
//! - [`EngineStats`] -- sizes and memory footprint
//! - [`Snapshot`] -- compressed read-only copy
//!
//! # Design Rules
//!
//! 1. Write-path errors are returned and leave the engine unchanged.
//! 2. Read paths never fail: out-of-range ids simply match nothing.
//! 3. Vectors handed out are owned copies; nothing aliases engine storage.
//!
//! ```
//! use trine_engine::{Engine, EngineConfig, TermId};
//!
//! let mut engine = Engine::new(EngineConfig::default()).unwrap();
//! engine.insert("alice", "knows", "charlie").unwrap();
//!
//! let alice = engine.lookup("alice").unwrap();
//! let knows = engine.lookup("knows").unwrap();
//! assert!(engine.ask(alice, knows, TermId::WILDCARD));
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::{Engine, EngineStats};
pub use error::{EngineError, EngineResult};

// Re-export key types
pub use trine_compress::{Snapshot, SnapshotConfig, SnapshotStats};
pub use trine_index::{BitVector, IndexStats};
pub use trine_query::DEFAULT_MAX_DEPTH;
pub use trine_types::{Capacity, Position, TermId, Triple, TriplePattern};
