//! Dictionary encoding for low-cardinality object columns.
//!
//! A predicate such as `rdf:type` has millions of triples but only a handful
//! of distinct objects. Storing a small code per triple plus one dictionary of
//! distinct objects beats storing a full 32-bit id per triple.

use serde::{Deserialize, Serialize};

use trine_index::TripleIndex;
use trine_types::TermId;

use crate::error::{CompressError, CompressResult};

/// Storage width of a code array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeWidth {
    U8,
    U16,
    U32,
}

impl CodeWidth {
    /// The narrowest width able to address `cardinality` distinct values.
    pub fn for_cardinality(cardinality: usize) -> Self {
        if cardinality <= 1 << 8 {
            CodeWidth::U8
        } else if cardinality <= 1 << 16 {
            CodeWidth::U16
        } else {
            CodeWidth::U32
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            CodeWidth::U8 => 1,
            CodeWidth::U16 => 2,
            CodeWidth::U32 => 4,
        }
    }
}

impl std::fmt::Display for CodeWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeWidth::U8 => write!(f, "u8"),
            CodeWidth::U16 => write!(f, "u16"),
            CodeWidth::U32 => write!(f, "u32"),
        }
    }
}

/// A code array stored at a fixed [`CodeWidth`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Codes {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Codes {
    /// Pack `values` at `width`. Every value must fit the width.
    pub fn encode(width: CodeWidth, values: &[u32]) -> CompressResult<Self> {
        Ok(match width {
            CodeWidth::U8 => {
                let mut out = Vec::new();
                out.try_reserve_exact(values.len())?;
                out.extend(values.iter().map(|&v| v as u8));
                Codes::U8(out)
            }
            CodeWidth::U16 => {
                let mut out = Vec::new();
                out.try_reserve_exact(values.len())?;
                out.extend(values.iter().map(|&v| v as u16));
                Codes::U16(out)
            }
            CodeWidth::U32 => {
                let mut out = Vec::new();
                out.try_reserve_exact(values.len())?;
                out.extend_from_slice(values);
                Codes::U32(out)
            }
        })
    }

    pub fn width(&self) -> CodeWidth {
        match self {
            Codes::U8(_) => CodeWidth::U8,
            Codes::U16(_) => CodeWidth::U16,
            Codes::U32(_) => CodeWidth::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Codes::U8(v) => v.len(),
            Codes::U16(v) => v.len(),
            Codes::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            Codes::U8(v) => v.get(i).map(|&c| u32::from(c)),
            Codes::U16(v) => v.get(i).map(|&c| u32::from(c)),
            Codes::U32(v) => v.get(i).copied(),
        }
    }

    pub fn heap_bytes(&self) -> usize {
        let cap = match self {
            Codes::U8(v) => v.capacity(),
            Codes::U16(v) => v.capacity(),
            Codes::U32(v) => v.capacity(),
        };
        cap * self.width().bytes()
    }
}

/// One predicate's subject → objects relation with objects replaced by codes.
///
/// `dictionary` holds the distinct objects in ascending order, so code order
/// equals object order. `subjects` lists subjects ascending; the codes of
/// `subjects[i]` are `codes[offsets[i]..offsets[i + 1]]`, sorted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryColumn {
    dictionary: Vec<TermId>,
    subjects: Vec<TermId>,
    offsets: Vec<u32>,
    codes: Codes,
}

impl DictionaryColumn {
    /// Whether dictionary encoding pays off for a column.
    pub fn is_favorable(distinct_objects: usize, triples: usize, threshold: f64) -> bool {
        triples > 0 && (distinct_objects as f64 / triples as f64) <= threshold
    }

    /// Encode every `(subject, object)` pair stored under `predicate`.
    pub fn build(index: &TripleIndex, predicate: TermId) -> CompressResult<Self> {
        let mut pairs = Vec::new();
        if let Some(row) = index.row(predicate) {
            pairs.try_reserve_exact(row.triple_count())?;
            for s in row.subjects().iter_ones() {
                let subject = TermId::new(s as u32);
                pairs.extend(index.objects(predicate, subject).map(|o| (subject, o)));
            }
        }
        Self::from_pairs(pairs)
    }

    pub fn from_pairs(mut pairs: Vec<(TermId, TermId)>) -> CompressResult<Self> {
        pairs.sort_unstable();
        pairs.dedup();

        let mut dictionary: Vec<TermId> = pairs.iter().map(|&(_, o)| o).collect();
        dictionary.sort_unstable();
        dictionary.dedup();

        let mut subjects = Vec::new();
        let mut offsets = Vec::new();
        let mut raw = Vec::new();
        raw.try_reserve_exact(pairs.len())?;
        for &(s, o) in &pairs {
            if subjects.last() != Some(&s) {
                subjects.push(s);
                offsets.push(raw.len() as u32);
            }
            // Present by construction.
            let code = dictionary.binary_search(&o).unwrap_or_default();
            raw.push(code as u32);
        }
        offsets.push(raw.len() as u32);

        let codes = Codes::encode(CodeWidth::for_cardinality(dictionary.len()), &raw)?;
        Ok(Self {
            dictionary,
            subjects,
            offsets,
            codes,
        })
    }

    /// Number of distinct objects.
    pub fn cardinality(&self) -> usize {
        self.dictionary.len()
    }

    pub fn triple_count(&self) -> usize {
        self.codes.len()
    }

    pub fn dictionary(&self) -> &[TermId] {
        &self.dictionary
    }

    fn span(&self, subject: TermId) -> Option<std::ops::Range<usize>> {
        let i = self.subjects.binary_search(&subject).ok()?;
        Some(self.offsets[i] as usize..self.offsets[i + 1] as usize)
    }

    pub fn has_subject(&self, subject: TermId) -> bool {
        self.subjects.binary_search(&subject).is_ok()
    }

    #[inline]
    pub fn contains(&self, subject: TermId, object: TermId) -> bool {
        let Ok(code) = self.dictionary.binary_search(&object) else {
            return false;
        };
        let code = code as u32;
        self.span(subject)
            .is_some_and(|span| span.into_iter().any(|i| self.codes.get(i) == Some(code)))
    }

    /// The objects of `subject`, decoded, in ascending order.
    pub fn objects(&self, subject: TermId) -> impl Iterator<Item = TermId> + '_ {
        self.span(subject)
            .unwrap_or(0..0)
            .filter_map(move |i| self.codes.get(i))
            .filter_map(move |c| self.dictionary.get(c as usize).copied())
    }

    /// All `(subject, object)` pairs, subject-major.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, TermId)> + '_ {
        self.subjects
            .iter()
            .flat_map(move |&s| self.objects(s).map(move |o| (s, o)))
    }

    /// Structural checks for a column read back from bytes.
    pub(crate) fn validate(&self) -> CompressResult<()> {
        let corrupt = |what: &str| Err(CompressError::Corrupt(format!("dictionary column: {what}")));
        if self.offsets.len() != self.subjects.len() + 1 {
            return corrupt("offset table length");
        }
        if self.offsets.windows(2).any(|w| w[0] > w[1])
            || self.offsets.last().map(|&e| e as usize) != Some(self.codes.len())
        {
            return corrupt("offsets");
        }
        if !self.subjects.windows(2).all(|w| w[0] < w[1])
            || !self.dictionary.windows(2).all(|w| w[0] < w[1])
        {
            return corrupt("ordering");
        }
        if (0..self.codes.len()).any(|i| self.codes.get(i).map_or(true, |c| c as usize >= self.dictionary.len())) {
            return corrupt("code out of dictionary");
        }
        Ok(())
    }

    pub fn heap_bytes(&self) -> usize {
        (self.dictionary.capacity() + self.subjects.capacity()) * std::mem::size_of::<TermId>()
            + self.offsets.capacity() * std::mem::size_of::<u32>()
            + self.codes.heap_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trine_types::Capacity;

    fn t(n: u32) -> TermId {
        TermId::new(n)
    }

    // ----------------------------------------------------------------
    // Code widths
    // ----------------------------------------------------------------

    #[test]
    fn width_boundaries() {
        assert_eq!(CodeWidth::for_cardinality(0), CodeWidth::U8);
        assert_eq!(CodeWidth::for_cardinality(256), CodeWidth::U8);
        assert_eq!(CodeWidth::for_cardinality(257), CodeWidth::U16);
        assert_eq!(CodeWidth::for_cardinality(65_536), CodeWidth::U16);
        assert_eq!(CodeWidth::for_cardinality(65_537), CodeWidth::U32);
    }

    #[test]
    fn codes_roundtrip_each_width() {
        for (width, max) in [(CodeWidth::U8, 255), (CodeWidth::U16, 65_535), (CodeWidth::U32, u32::MAX)] {
            let codes = Codes::encode(width, &[0, 1, max]).unwrap();
            assert_eq!(codes.width(), width);
            assert_eq!(codes.get(2), Some(max));
            assert_eq!(codes.get(3), None);
        }
    }

    #[test]
    fn favorability() {
        assert!(DictionaryColumn::is_favorable(2, 100, 0.5));
        assert!(DictionaryColumn::is_favorable(50, 100, 0.5));
        assert!(!DictionaryColumn::is_favorable(51, 100, 0.5));
        assert!(!DictionaryColumn::is_favorable(0, 0, 0.5));
    }

    // ----------------------------------------------------------------
    // Column
    // ----------------------------------------------------------------

    #[test]
    fn type_like_column() {
        let mut idx = TripleIndex::new(Capacity::uniform(1024)).unwrap();
        let (ty, person, robot) = (t(2), t(900), t(901));
        for s in 10..110 {
            let class = if s % 3 == 0 { robot } else { person };
            idx.insert(t(s), ty, class).unwrap();
        }
        idx.insert(t(10), ty, robot).unwrap();

        let col = DictionaryColumn::build(&idx, ty).unwrap();
        assert_eq!(col.cardinality(), 2);
        assert_eq!(col.codes.width(), CodeWidth::U8);
        assert_eq!(col.triple_count(), 101);
        assert_eq!(col.subjects.len(), 100);

        assert!(col.contains(t(10), person));
        assert!(col.contains(t(10), robot));
        assert!(col.contains(t(12), robot));
        assert!(!col.contains(t(11), robot));
        assert!(!col.contains(t(5), person));
        assert!(!col.contains(t(11), t(77)));
        assert_eq!(col.objects(t(10)).collect::<Vec<_>>(), vec![person, robot]);
    }

    #[test]
    fn duplicate_pairs_collapse() {
        let col = DictionaryColumn::from_pairs(vec![(t(1), t(5)), (t(1), t(5)), (t(2), t(5))]).unwrap();
        assert_eq!(col.triple_count(), 2);
        assert!(col.has_subject(t(2)));
        assert!(!col.has_subject(t(3)));
        assert_eq!(col.objects(t(3)).count(), 0);
    }

    #[test]
    fn wide_dictionary_uses_u16() {
        let pairs: Vec<_> = (1..=300).map(|o| (t(1), t(o))).collect();
        let col = DictionaryColumn::from_pairs(pairs).unwrap();
        assert_eq!(col.codes.width(), CodeWidth::U16);
        assert!(col.contains(t(1), t(300)));
    }
}
