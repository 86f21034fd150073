//! Triple-pattern evaluation.
//!
//! | subject | object | answered by |
//! |---------|--------|-------------|
//! | bound   | bound  | scan of the `(p, s)` object list |
//! | bound   | `*`    | subject-presence bit of `p` |
//! | `*`     | bound  | object-presence bit of `p` |
//! | `*`     | `*`    | `p` has any triple |
//!
//! A wildcard predicate tries every active predicate in turn.

use trine_index::TripleIndex;
use trine_types::{TermId, Triple, TriplePattern};

/// Evaluates patterns against a borrowed index.
#[derive(Clone, Copy, Debug)]
pub struct PatternMatcher<'a> {
    index: &'a TripleIndex,
}

impl<'a> PatternMatcher<'a> {
    pub fn new(index: &'a TripleIndex) -> Self {
        Self { index }
    }

    /// Returns `true` if at least one stored triple matches `(s, p, o)`.
    #[inline]
    pub fn ask(&self, subject: TermId, predicate: TermId, object: TermId) -> bool {
        if predicate.is_wildcard() {
            return self
                .index
                .predicates()
                .any(|p| self.ask_in(subject, p, object));
        }
        self.ask_in(subject, predicate, object)
    }

    /// [`ask`](Self::ask) for a [`TriplePattern`].
    #[inline]
    pub fn ask_pattern(&self, pattern: &TriplePattern) -> bool {
        self.ask(pattern.subject, pattern.predicate, pattern.object)
    }

    #[inline]
    fn ask_in(&self, subject: TermId, predicate: TermId, object: TermId) -> bool {
        match (subject.is_wildcard(), object.is_wildcard()) {
            (false, false) => self.index.contains(subject, predicate, object),
            (false, true) => self.index.has_subject(predicate, subject),
            (true, false) => self.index.has_object(predicate, object),
            (true, true) => self.index.row(predicate).is_some_and(|row| !row.is_empty()),
        }
    }

    /// One answer per pattern, in input order.
    pub fn ask_batch(&self, patterns: &[TriplePattern]) -> Vec<bool> {
        patterns.iter().map(|p| self.ask_pattern(p)).collect()
    }

    /// Write answers into `results`, pairing positionally with `patterns`.
    ///
    /// Evaluates `min(patterns.len(), results.len())` entries and returns that count.
    pub fn ask_batch_into(&self, patterns: &[TriplePattern], results: &mut [bool]) -> usize {
        let mut evaluated = 0;
        for (pattern, slot) in patterns.iter().zip(results.iter_mut()) {
            *slot = self.ask_pattern(pattern);
            evaluated += 1;
        }
        evaluated
    }

    /// [`ask_batch`](Self::ask_batch) split across up to `threads` scoped threads.
    pub fn ask_batch_parallel(&self, patterns: &[TriplePattern], threads: usize) -> Vec<bool> {
        let threads = threads.clamp(1, patterns.len().max(1));
        if threads == 1 {
            return self.ask_batch(patterns);
        }
        let mut results = vec![false; patterns.len()];
        let chunk = patterns.len().div_ceil(threads);
        std::thread::scope(|scope| {
            for (input, output) in patterns.chunks(chunk).zip(results.chunks_mut(chunk)) {
                scope.spawn(move || self.ask_batch_into(input, output));
            }
        });
        results
    }

    /// Every stored triple matching `pattern`.
    pub fn matches(&self, pattern: &TriplePattern) -> Vec<Triple> {
        let mut out = Vec::new();
        if pattern.predicate.is_wildcard() {
            for predicate in self.index.predicates() {
                self.collect_in(&pattern.with_predicate(predicate), &mut out);
            }
        } else {
            self.collect_in(pattern, &mut out);
        }
        out
    }

    /// Number of stored triples matching `pattern`.
    pub fn count(&self, pattern: &TriplePattern) -> usize {
        self.matches(pattern).len()
    }

    fn collect_in(&self, pattern: &TriplePattern, out: &mut Vec<Triple>) {
        let TriplePattern {
            subject,
            predicate,
            object,
        } = *pattern;
        match (subject.is_wildcard(), object.is_wildcard()) {
            (false, false) => {
                if self.index.contains(subject, predicate, object) {
                    out.push(Triple::new(subject, predicate, object));
                }
            }
            (false, true) => out.extend(
                self.index
                    .objects(predicate, subject)
                    .map(|o| Triple::new(subject, predicate, o)),
            ),
            (true, false) => out.extend(
                self.index
                    .subjects(predicate, object)
                    .map(|s| Triple::new(s, predicate, object)),
            ),
            (true, true) => {
                let Some(row) = self.index.row(predicate) else {
                    return;
                };
                for s in row.subjects().iter_ones() {
                    let s = TermId::new(s as u32);
                    out.extend(
                        self.index
                            .objects(predicate, s)
                            .map(|o| Triple::new(s, predicate, o)),
                    );
                }
            }
        }
    }
}
