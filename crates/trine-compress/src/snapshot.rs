//! Read-only compressed snapshot of a whole index.

use serde::{Deserialize, Serialize};
use tracing::debug;

use trine_index::TripleIndex;
use trine_intern::Interner;
use trine_types::{Capacity, TermId, Triple, TriplePattern};

use crate::csr::{CsrMatrix, DEFAULT_SHORT_ROW};
use crate::dictionary::DictionaryColumn;
use crate::error::{CompressError, CompressResult};
use crate::rle::RleBitVector;
use crate::strings::EncodedStringTable;

/// Knobs for [`Snapshot::build`] and [`Snapshot::to_bytes`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Use a dictionary column when `distinct objects / triples` is at or below this.
    pub dictionary_threshold: f64,
    /// CSR rows up to this length are scanned linearly.
    pub short_row: usize,
    /// zstd level for the byte encoding.
    pub zstd_level: i32,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dictionary_threshold: 0.5,
            short_row: DEFAULT_SHORT_ROW,
            zstd_level: 3,
        }
    }
}

/// How one predicate's objects are stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectLayout {
    Csr(CsrMatrix),
    Dictionary(DictionaryColumn),
}

impl ObjectLayout {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectLayout::Csr(_) => "csr",
            ObjectLayout::Dictionary(_) => "dictionary",
        }
    }

    #[inline]
    fn contains(&self, subject: TermId, object: TermId) -> bool {
        match self {
            ObjectLayout::Csr(m) => m.contains(subject, object),
            ObjectLayout::Dictionary(d) => d.contains(subject, object),
        }
    }

    fn pairs(&self) -> Box<dyn Iterator<Item = (TermId, TermId)> + '_> {
        match self {
            ObjectLayout::Csr(m) => Box::new(m.iter()),
            ObjectLayout::Dictionary(d) => Box::new(d.iter()),
        }
    }

    /// Number of stored `(s, o)` pairs.
    fn entries(&self) -> usize {
        match self {
            ObjectLayout::Csr(m) => m.nnz(),
            ObjectLayout::Dictionary(d) => d.triple_count(),
        }
    }

    fn heap_bytes(&self) -> usize {
        match self {
            ObjectLayout::Csr(m) => m.heap_bytes(),
            ObjectLayout::Dictionary(d) => d.heap_bytes(),
        }
    }
}

/// Everything stored under one predicate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedPredicate {
    pub predicate: TermId,
    pub subjects: RleBitVector,
    pub objects: RleBitVector,
    pub layout: ObjectLayout,
    pub triples: usize,
}

impl CompressedPredicate {
    fn build(index: &TripleIndex, predicate: TermId, config: &SnapshotConfig) -> CompressResult<Option<Self>> {
        let Some(row) = index.row(predicate) else {
            return Ok(None);
        };
        let triples = row.triple_count();
        let distinct = row.objects().popcount();
        let layout = if DictionaryColumn::is_favorable(distinct, triples, config.dictionary_threshold) {
            ObjectLayout::Dictionary(DictionaryColumn::build(index, predicate)?)
        } else {
            ObjectLayout::Csr(CsrMatrix::build(index, predicate, config.short_row)?)
        };
        debug!(%predicate, triples, distinct, layout = layout.name(), "compressed predicate");
        Ok(Some(Self {
            predicate,
            subjects: RleBitVector::build(row.subjects()),
            objects: RleBitVector::build(row.objects()),
            layout,
            triples,
        }))
    }

    #[inline]
    pub fn has_subject(&self, subject: TermId) -> bool {
        self.subjects.contains(subject.index())
    }

    #[inline]
    pub fn has_object(&self, object: TermId) -> bool {
        self.objects.contains(object.index())
    }

    #[inline]
    pub fn contains(&self, subject: TermId, object: TermId) -> bool {
        self.layout.contains(subject, object)
    }

    pub fn heap_bytes(&self) -> usize {
        self.subjects.heap_bytes() + self.objects.heap_bytes() + self.layout.heap_bytes()
    }

    fn validate(&self) -> CompressResult<()> {
        self.subjects.validate()?;
        self.objects.validate()?;
        match &self.layout {
            ObjectLayout::Csr(m) => m.validate()?,
            ObjectLayout::Dictionary(d) => d.validate()?,
        }
        if self.layout.entries() != self.triples {
            return Err(CompressError::Corrupt(format!(
                "predicate {} stores {} pairs but declares {} triples",
                self.predicate,
                self.layout.entries(),
                self.triples
            )));
        }
        Ok(())
    }
}

/// Summary numbers for a [`Snapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStats {
    pub predicates: usize,
    pub triples: usize,
    pub terms: usize,
    pub term_prefixes: usize,
    pub csr_predicates: usize,
    pub dictionary_predicates: usize,
    pub rle_runs: usize,
    pub heap_bytes: usize,
}

/// A frozen, compressed copy of a [`TripleIndex`] and optionally its term table.
///
/// Queries answer exactly as the live matcher did at build time, including
/// `false` for ids outside the capacity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    capacity: Capacity,
    /// Sorted by predicate id.
    predicates: Vec<CompressedPredicate>,
    terms: Option<EncodedStringTable>,
    triples: usize,
}

impl Snapshot {
    /// Compress `index` (and `terms`, if given).
    pub fn build(index: &TripleIndex, terms: Option<&Interner>, config: &SnapshotConfig) -> CompressResult<Self> {
        let mut ids: Vec<TermId> = index.predicates().collect();
        ids.sort_unstable();

        let mut predicates = Vec::new();
        predicates.try_reserve_exact(ids.len())?;
        for p in ids {
            if let Some(cp) = CompressedPredicate::build(index, p, config)? {
                predicates.push(cp);
            }
        }
        let terms = terms.map(EncodedStringTable::build).transpose()?;

        let snapshot = Self {
            capacity: index.capacity(),
            predicates,
            terms,
            triples: index.len(),
        };
        debug!(
            predicates = snapshot.predicates.len(),
            triples = snapshot.triples,
            heap_bytes = snapshot.heap_bytes(),
            "built snapshot"
        );
        Ok(snapshot)
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Number of triples.
    pub fn len(&self) -> usize {
        self.triples
    }

    pub fn is_empty(&self) -> bool {
        self.triples == 0
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    pub fn predicates(&self) -> &[CompressedPredicate] {
        &self.predicates
    }

    pub fn predicate(&self, predicate: TermId) -> Option<&CompressedPredicate> {
        self.predicates
            .binary_search_by_key(&predicate, |cp| cp.predicate)
            .ok()
            .map(|i| &self.predicates[i])
    }

    pub fn terms(&self) -> Option<&EncodedStringTable> {
        self.terms.as_ref()
    }

    /// Text of term `id`, if the snapshot carries a term table.
    pub fn resolve(&self, id: TermId) -> CompressResult<String> {
        match &self.terms {
            Some(table) => table.resolve(id),
            None => Err(CompressError::UnknownTerm(id)),
        }
    }

    /// Returns `true` if at least one triple matches `(s, p, o)`.
    #[inline]
    pub fn ask(&self, subject: TermId, predicate: TermId, object: TermId) -> bool {
        if predicate.is_wildcard() {
            return self.predicates.iter().any(|cp| ask_in(cp, subject, object));
        }
        self.predicate(predicate)
            .is_some_and(|cp| ask_in(cp, subject, object))
    }

    #[inline]
    pub fn ask_pattern(&self, pattern: &TriplePattern) -> bool {
        self.ask(pattern.subject, pattern.predicate, pattern.object)
    }

    pub fn ask_batch(&self, patterns: &[TriplePattern]) -> Vec<bool> {
        patterns.iter().map(|p| self.ask_pattern(p)).collect()
    }

    /// All triples, predicate-major then subject-major.
    pub fn iter_triples(&self) -> impl Iterator<Item = Triple> + '_ {
        self.predicates.iter().flat_map(|cp| {
            cp.layout
                .pairs()
                .map(move |(s, o)| Triple::new(s, cp.predicate, o))
        })
    }

    pub fn stats(&self) -> SnapshotStats {
        let dictionary_predicates = self
            .predicates
            .iter()
            .filter(|cp| matches!(cp.layout, ObjectLayout::Dictionary(_)))
            .count();
        SnapshotStats {
            predicates: self.predicates.len(),
            triples: self.triples,
            terms: self.terms.as_ref().map_or(0, EncodedStringTable::len),
            term_prefixes: self.terms.as_ref().map_or(0, EncodedStringTable::prefix_count),
            csr_predicates: self.predicates.len() - dictionary_predicates,
            dictionary_predicates,
            rle_runs: self
                .predicates
                .iter()
                .map(|cp| cp.subjects.run_count() + cp.objects.run_count())
                .sum(),
            heap_bytes: self.heap_bytes(),
        }
    }

    pub fn heap_bytes(&self) -> usize {
        self.predicates.iter().map(CompressedPredicate::heap_bytes).sum::<usize>()
            + self.terms.as_ref().map_or(0, EncodedStringTable::heap_bytes)
    }

    /// Structural checks for a snapshot read back from bytes.
    pub(crate) fn validate(&self) -> CompressResult<()> {
        if !self.predicates.windows(2).all(|w| w[0].predicate < w[1].predicate) {
            return Err(CompressError::Corrupt("predicates out of order".into()));
        }
        for cp in &self.predicates {
            cp.validate()?;
        }
        if let Some(table) = &self.terms {
            table.validate()?;
        }
        let total: usize = self.predicates.iter().map(|cp| cp.triples).sum();
        if total != self.triples {
            return Err(CompressError::Corrupt(format!(
                "triple count {} does not match predicates ({total})",
                self.triples
            )));
        }
        Ok(())
    }
}

#[inline]
fn ask_in(cp: &CompressedPredicate, subject: TermId, object: TermId) -> bool {
    match (subject.is_wildcard(), object.is_wildcard()) {
        (false, false) => cp.contains(subject, object),
        (false, true) => cp.has_subject(subject),
        (true, false) => cp.has_object(object),
        (true, true) => cp.triples > 0,
    }
}
