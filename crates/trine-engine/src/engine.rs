use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use trine_compress::Snapshot;
use trine_index::{BitVector, IndexStats, TripleIndex, Triples};
use trine_intern::Interner;
use trine_query::{PatternMatcher, TransitiveReasoner};
use trine_types::{Capacity, TermId, Triple, TriplePattern};

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// Sizes and memory footprint of an [`Engine`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub terms: usize,
    pub triples: usize,
    pub transitive_predicates: usize,
    pub index: IndexStats,
    pub interner_bytes: usize,
    pub heap_bytes: usize,
}

/// An in-memory triple store.
///
/// Owns the interner, the index, and the set of predicates declared
/// transitive. `Engine` is `Send + Sync`; share it as `&Engine` across
/// scoped threads for concurrent reads, or wrap it in `Arc<RwLock<_>>` to
/// interleave writers.
pub struct Engine {
    config: EngineConfig,
    terms: Interner,
    index: TripleIndex,
    transitive: BTreeSet<TermId>,
}

impl Engine {
    /// Create an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let index = TripleIndex::new(config.capacity)?;
        let mut engine = Self {
            terms: Interner::new(),
            index,
            transitive: BTreeSet::new(),
            config,
        };
        for name in engine.config.transitive_predicates.clone() {
            let predicate = engine.terms.intern(&name)?;
            engine.transitive.insert(predicate);
        }
        debug!(
            capacity = ?engine.config.capacity,
            max_depth = engine.config.max_depth,
            transitive = engine.transitive.len(),
            "created engine"
        );
        Ok(engine)
    }

    /// Create an engine with default settings and the given bounds.
    pub fn with_capacity(capacity: Capacity) -> EngineResult<Self> {
        Self::new(EngineConfig::with_capacity(capacity))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn capacity(&self) -> Capacity {
        self.index.capacity()
    }

    // ---- Terms ----

    /// Intern `text`. Idempotent.
    pub fn intern(&mut self, text: &str) -> EngineResult<TermId> {
        Ok(self.terms.intern(text)?)
    }

    /// The id of `text`, without interning it.
    pub fn lookup(&self, text: &str) -> Option<TermId> {
        self.terms.lookup(text)
    }

    pub fn resolve(&self, id: TermId) -> EngineResult<&str> {
        Ok(self.terms.resolve(id)?)
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> &Interner {
        &self.terms
    }

    // ---- Writes ----

    /// Store `(s, p, o)`. Returns `false` if it was already present.
    pub fn add_triple(&mut self, subject: TermId, predicate: TermId, object: TermId) -> EngineResult<bool> {
        Ok(self.index.insert(subject, predicate, object)?)
    }

    /// Intern all three texts and store the triple.
    ///
    /// On error the engine is unchanged: texts interned by this call are
    /// forgotten again.
    pub fn insert(&mut self, subject: &str, predicate: &str, object: &str) -> EngineResult<bool> {
        let mark = self.terms.len();
        let result = self.intern_and_add(subject, predicate, object);
        if result.is_err() {
            self.terms.truncate(mark);
        }
        result
    }

    fn intern_and_add(&mut self, subject: &str, predicate: &str, object: &str) -> EngineResult<bool> {
        let s = self.terms.intern(subject)?;
        let p = self.terms.intern(predicate)?;
        let o = self.terms.intern(object)?;
        self.add_triple(s, p, o)
    }

    /// Mark `predicate` as transitive for [`ask_entailed`](Self::ask_entailed).
    /// Returns `false` if it already was.
    pub fn declare_transitive(&mut self, predicate: TermId) -> bool {
        self.transitive.insert(predicate)
    }

    pub fn is_transitive(&self, predicate: TermId) -> bool {
        self.transitive.contains(&predicate)
    }

    // ---- Reads ----

    fn matcher(&self) -> PatternMatcher<'_> {
        PatternMatcher::new(&self.index)
    }

    fn reasoner(&self) -> TransitiveReasoner<'_> {
        TransitiveReasoner::new(&self.index)
    }

    /// Returns `true` if a stored triple matches. `TermId::WILDCARD` matches anything.
    #[inline]
    pub fn ask(&self, subject: TermId, predicate: TermId, object: TermId) -> bool {
        self.matcher().ask(subject, predicate, object)
    }

    pub fn ask_pattern(&self, pattern: &TriplePattern) -> bool {
        self.matcher().ask_pattern(pattern)
    }

    pub fn ask_batch(&self, patterns: &[TriplePattern]) -> Vec<bool> {
        self.matcher().ask_batch(patterns)
    }

    pub fn ask_batch_into(&self, patterns: &[TriplePattern], results: &mut [bool]) -> usize {
        self.matcher().ask_batch_into(patterns, results)
    }

    pub fn ask_batch_parallel(&self, patterns: &[TriplePattern], threads: usize) -> Vec<bool> {
        self.matcher().ask_batch_parallel(patterns, threads)
    }

    /// Every stored triple matching `pattern`.
    pub fn matches(&self, pattern: &TriplePattern) -> Vec<Triple> {
        self.matcher().matches(pattern)
    }

    /// Subjects `s` with `(s, predicate, object)`; `object` may be the wildcard.
    pub fn subject_vector(&self, predicate: TermId, object: TermId) -> BitVector {
        self.index.get_subject_vector(predicate, object)
    }

    /// Objects `o` with `(subject, predicate, o)`; `subject` may be the wildcard.
    pub fn object_vector(&self, predicate: TermId, subject: TermId) -> BitVector {
        self.index.get_object_vector(predicate, subject)
    }

    /// Whether `target` is reachable from `start` over at most `max_depth`
    /// `predicate` edges.
    pub fn is_transitively_related(
        &self,
        start: TermId,
        predicate: TermId,
        target: TermId,
        max_depth: usize,
    ) -> bool {
        self.reasoner()
            .is_transitively_related(start, predicate, target, max_depth)
    }

    /// [`is_transitively_related`](Self::is_transitively_related) with the configured depth.
    pub fn is_related(&self, start: TermId, predicate: TermId, target: TermId) -> bool {
        self.is_transitively_related(start, predicate, target, self.config.max_depth)
    }

    /// Everything reachable from `start` within `max_depth` edges.
    pub fn closure(&self, start: TermId, predicate: TermId, max_depth: usize) -> Vec<TermId> {
        self.reasoner().closure(start, predicate, max_depth)
    }

    /// [`ask`](Self::ask), extended through the reasoner for predicates
    /// declared transitive.
    pub fn ask_entailed(&self, subject: TermId, predicate: TermId, object: TermId) -> bool {
        if self.ask(subject, predicate, object) {
            return true;
        }
        !subject.is_wildcard()
            && !object.is_wildcard()
            && self.is_transitive(predicate)
            && self.is_related(subject, predicate, object)
    }

    // ---- Inspection ----

    /// Number of stored triples.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn triples(&self) -> Triples<'_> {
        self.index.iter_triples()
    }

    pub fn index(&self) -> &TripleIndex {
        &self.index
    }

    pub fn stats(&self) -> EngineStats {
        let index = self.index.stats();
        let interner_bytes = self.terms.heap_bytes();
        EngineStats {
            terms: self.terms.len(),
            triples: index.triples,
            transitive_predicates: self.transitive.len(),
            heap_bytes: index.heap_bytes + interner_bytes,
            index,
            interner_bytes,
        }
    }

    // ---- Snapshots ----

    /// Compressed, independent copy of the current contents.
    pub fn snapshot(&self) -> EngineResult<Snapshot> {
        Ok(Snapshot::build(&self.index, Some(&self.terms), &self.config.snapshot)?)
    }

    /// Build a snapshot and write it to `path`.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> EngineResult<Snapshot> {
        let snapshot = self.snapshot()?;
        snapshot.save(path, self.config.snapshot.zstd_level)?;
        Ok(snapshot)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("terms", &self.terms.len())
            .field("triples", &self.index.len())
            .field("capacity", &self.index.capacity())
            .finish()
    }
}
