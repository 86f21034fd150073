//! Compressed sparse row encoding of one predicate's subject → objects relation.

use serde::{Deserialize, Serialize};

use trine_index::TripleIndex;
use trine_types::TermId;

use crate::error::{CompressError, CompressResult};

/// Rows at or below this length are searched linearly.
pub const DEFAULT_SHORT_ROW: usize = 8;

/// Row offsets plus sorted column identifiers.
///
/// Row `s` holds the objects of subject `s` in
/// `columns[offsets[s]..offsets[s + 1]]`, sorted ascending and free of
/// duplicates. `offsets` covers rows `0..=max_subject`; any subject past the
/// last row has no objects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrMatrix {
    offsets: Vec<u32>,
    columns: Vec<TermId>,
    short_row: usize,
}

impl CsrMatrix {
    /// Encode every `(subject, object)` pair stored under `predicate`.
    pub fn build(index: &TripleIndex, predicate: TermId, short_row: usize) -> CompressResult<Self> {
        let mut pairs = Vec::new();
        if let Some(row) = index.row(predicate) {
            pairs.try_reserve_exact(row.triple_count())?;
            for s in row.subjects().iter_ones() {
                let subject = TermId::new(s as u32);
                pairs.extend(index.objects(predicate, subject).map(|o| (subject, o)));
            }
        }
        Self::from_pairs(&pairs, short_row)
    }

    /// Count per row, prefix-sum, fill, then sort and deduplicate each row.
    pub fn from_pairs(pairs: &[(TermId, TermId)], short_row: usize) -> CompressResult<Self> {
        let rows = pairs.iter().map(|(s, _)| s.index() + 1).max().unwrap_or(0);

        let mut offsets: Vec<u32> = Vec::new();
        offsets.try_reserve_exact(rows + 1)?;
        offsets.resize(rows + 1, 0);
        for (s, _) in pairs {
            offsets[s.index() + 1] += 1;
        }
        for i in 1..offsets.len() {
            offsets[i] += offsets[i - 1];
        }

        let mut columns = Vec::new();
        columns.try_reserve_exact(pairs.len())?;
        columns.resize(pairs.len(), TermId::WILDCARD);
        let mut cursor: Vec<u32> = offsets[..rows].to_vec();
        for &(s, o) in pairs {
            let slot = &mut cursor[s.index()];
            columns[*slot as usize] = o;
            *slot += 1;
        }

        // Compact in place: sort each row, drop repeats, shift left.
        let mut write = 0usize;
        let mut start = 0usize;
        for r in 0..rows {
            let end = offsets[r + 1] as usize;
            columns[start..end].sort_unstable();
            let row_start = write;
            for i in start..end {
                if write == row_start || columns[write - 1] != columns[i] {
                    columns[write] = columns[i];
                    write += 1;
                }
            }
            offsets[r + 1] = write as u32;
            start = end;
        }
        columns.truncate(write);
        columns.shrink_to_fit();

        Ok(Self {
            offsets,
            columns,
            short_row,
        })
    }

    /// Number of rows covered by the offset table.
    pub fn row_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Total number of stored (row, column) entries.
    pub fn nnz(&self) -> usize {
        self.columns.len()
    }

    /// The sorted objects of `subject`; empty for unknown subjects.
    pub fn row(&self, subject: TermId) -> &[TermId] {
        let r = subject.index();
        if r >= self.row_count() {
            return &[];
        }
        &self.columns[self.offsets[r] as usize..self.offsets[r + 1] as usize]
    }

    /// Membership test: linear scan for short rows, binary search otherwise.
    #[inline]
    pub fn contains(&self, subject: TermId, object: TermId) -> bool {
        let row = self.row(subject);
        if row.len() <= self.short_row {
            row.contains(&object)
        } else {
            row.binary_search(&object).is_ok()
        }
    }

    /// Iterate all `(subject, object)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, TermId)> + '_ {
        (0..self.row_count()).flat_map(move |r| {
            let subject = TermId::new(r as u32);
            self.row(subject).iter().map(move |&o| (subject, o))
        })
    }

    /// Structural checks for a matrix read back from bytes.
    pub(crate) fn validate(&self) -> CompressResult<()> {
        let monotonic = self.offsets.windows(2).all(|w| w[0] <= w[1]);
        let closed = self.offsets.first().map_or(true, |&f| f == 0)
            && self.offsets.last().map_or(self.columns.is_empty(), |&e| e as usize == self.columns.len());
        if !monotonic || !closed {
            return Err(CompressError::Corrupt("csr offsets".into()));
        }
        Ok(())
    }

    pub fn heap_bytes(&self) -> usize {
        self.offsets.capacity() * std::mem::size_of::<u32>()
            + self.columns.capacity() * std::mem::size_of::<TermId>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trine_types::Capacity;

    fn t(n: u32) -> TermId {
        TermId::new(n)
    }

    fn index(triples: &[(u32, u32, u32)]) -> TripleIndex {
        let mut idx = TripleIndex::new(Capacity::uniform(128)).unwrap();
        for &(s, p, o) in triples {
            idx.insert(t(s), t(p), t(o)).unwrap();
        }
        idx
    }

    // ----------------------------------------------------------------
    // Construction
    // ----------------------------------------------------------------

    #[test]
    fn build_sorts_rows() {
        let idx = index(&[(1, 5, 30), (1, 5, 10), (1, 5, 20), (3, 5, 7)]);
        let csr = CsrMatrix::build(&idx, t(5), DEFAULT_SHORT_ROW).unwrap();
        assert_eq!(csr.row(t(1)), &[t(10), t(20), t(30)]);
        assert_eq!(csr.row(t(3)), &[t(7)]);
        assert!(csr.row(t(2)).is_empty());
        assert_eq!(csr.nnz(), 4);
        assert_eq!(csr.row_count(), 4);
    }

    #[test]
    fn build_ignores_other_predicates() {
        let idx = index(&[(1, 5, 10), (1, 6, 11)]);
        let csr = CsrMatrix::build(&idx, t(5), DEFAULT_SHORT_ROW).unwrap();
        assert!(csr.contains(t(1), t(10)));
        assert!(!csr.contains(t(1), t(11)));
    }

    #[test]
    fn unknown_predicate_is_empty() {
        let idx = index(&[(1, 5, 10)]);
        let csr = CsrMatrix::build(&idx, t(9), DEFAULT_SHORT_ROW).unwrap();
        assert_eq!(csr.row_count(), 0);
        assert!(csr.row(t(1)).is_empty());
    }

    #[test]
    fn from_pairs_deduplicates() {
        let pairs = [(t(2), t(4)), (t(2), t(4)), (t(2), t(1)), (t(0), t(9))];
        let csr = CsrMatrix::from_pairs(&pairs, DEFAULT_SHORT_ROW).unwrap();
        assert_eq!(csr.row(t(2)), &[t(1), t(4)]);
        assert_eq!(csr.row(t(0)), &[t(9)]);
        assert_eq!(csr.nnz(), 3);
    }

    #[test]
    fn iter_is_row_major() {
        let pairs = [(t(3), t(1)), (t(1), t(2)), (t(1), t(1))];
        let csr = CsrMatrix::from_pairs(&pairs, DEFAULT_SHORT_ROW).unwrap();
        let all: Vec<_> = csr.iter().collect();
        assert_eq!(all, vec![(t(1), t(1)), (t(1), t(2)), (t(3), t(1))]);
    }

    // ----------------------------------------------------------------
    // Queries
    // ----------------------------------------------------------------

    #[test]
    fn long_rows_use_binary_search() {
        let pairs: Vec<_> = (1..=40).rev().map(|o| (t(1), t(o * 2))).collect();
        let csr = CsrMatrix::from_pairs(&pairs, 4).unwrap();
        for o in 1..=40 {
            assert!(csr.contains(t(1), t(o * 2)));
            assert!(!csr.contains(t(1), t(o * 2 + 1)));
        }
    }

    #[test]
    fn subject_past_last_row() {
        let csr = CsrMatrix::from_pairs(&[(t(1), t(1))], DEFAULT_SHORT_ROW).unwrap();
        assert!(!csr.contains(t(1000), t(1)));
        assert!(!csr.contains(TermId::new(u32::MAX), t(1)));
    }
}
