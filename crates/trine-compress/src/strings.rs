//! Namespace-prefix dictionary encoding of the term table.
//!
//! IRIs share long namespace prefixes (`http://xmlns.com/foaf/0.1/`). Each
//! term is split after its last `/` or `#`; the prefix is stored once in a
//! prefix dictionary and the term keeps a small code plus its local part.

use serde::{Deserialize, Serialize};

use trine_intern::Interner;
use trine_types::TermId;

use crate::dictionary::{CodeWidth, Codes};
use crate::error::{CompressError, CompressResult};

/// Split `text` after its last `/` or `#`. Texts without either have an empty prefix.
pub fn split_namespace(text: &str) -> (&str, &str) {
    match text.rfind(['/', '#']) {
        Some(i) => text.split_at(i + 1),
        None => ("", text),
    }
}

/// A read-only, compact copy of an [`Interner`].
///
/// Term `id` is entry `id - 1`; ids are preserved exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedStringTable {
    /// Distinct prefixes, ascending.
    prefixes: Vec<String>,
    /// Prefix code per term.
    codes: Codes,
    /// Local parts, concatenated.
    locals: String,
    /// End offset of each term's local part in `locals`.
    ends: Vec<u32>,
}

impl EncodedStringTable {
    pub fn build(interner: &Interner) -> CompressResult<Self> {
        let mut prefixes: Vec<String> = interner
            .iter()
            .map(|(_, text)| split_namespace(text).0.to_owned())
            .collect();
        prefixes.sort_unstable();
        prefixes.dedup();

        let mut raw = Vec::new();
        raw.try_reserve_exact(interner.len())?;
        let mut ends = Vec::new();
        ends.try_reserve_exact(interner.len())?;
        let mut locals = String::new();
        for (_, text) in interner.iter() {
            let (prefix, local) = split_namespace(text);
            let code = prefixes
                .binary_search_by(|p| p.as_str().cmp(prefix))
                .map_err(|_| CompressError::Corrupt(format!("prefix {prefix:?} missing")))?;
            raw.push(code as u32);
            locals.push_str(local);
            let end = u32::try_from(locals.len())
                .map_err(|_| CompressError::AllocationFailure("string table exceeds 4 GiB".into()))?;
            ends.push(end);
        }
        let codes = Codes::encode(CodeWidth::for_cardinality(prefixes.len()), &raw)?;
        Ok(Self {
            prefixes,
            codes,
            locals,
            ends,
        })
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    pub fn prefix_count(&self) -> usize {
        self.prefixes.len()
    }

    /// The `(prefix, local)` halves of term `id`.
    pub fn parts(&self, id: TermId) -> Option<(&str, &str)> {
        if id.is_wildcard() {
            return None;
        }
        let i = id.index() - 1;
        let end = *self.ends.get(i)? as usize;
        let start = if i == 0 { 0 } else { self.ends[i - 1] as usize };
        let prefix = self.prefixes.get(self.codes.get(i)? as usize)?;
        Some((prefix.as_str(), self.locals.get(start..end)?))
    }

    /// Reassemble the exact text of term `id`.
    pub fn resolve(&self, id: TermId) -> CompressResult<String> {
        self.parts(id)
            .map(|(prefix, local)| [prefix, local].concat())
            .ok_or(CompressError::UnknownTerm(id))
    }

    /// Rebuild a live interner with identical ids.
    pub fn to_interner(&self) -> CompressResult<Interner> {
        let mut interner = Interner::with_capacity(self.len());
        for i in 0..self.len() {
            let id = TermId::new(i as u32 + 1);
            let text = self.resolve(id)?;
            let issued = interner
                .intern(&text)
                .map_err(|e| CompressError::Corrupt(e.to_string()))?;
            if issued != id {
                return Err(CompressError::Corrupt(format!(
                    "term {id} duplicates term {issued}"
                )));
            }
        }
        Ok(interner)
    }

    /// Structural checks for a table read back from bytes.
    pub(crate) fn validate(&self) -> CompressResult<()> {
        let corrupt = |what: &str| Err(CompressError::Corrupt(format!("string table: {what}")));
        if self.codes.len() != self.ends.len() {
            return corrupt("code count");
        }
        let mut start = 0usize;
        for (i, &end) in self.ends.iter().enumerate() {
            let end = end as usize;
            if end < start || self.locals.get(start..end).is_none() {
                return corrupt("local offsets");
            }
            if self.codes.get(i).map_or(true, |c| c as usize >= self.prefixes.len()) {
                return corrupt("prefix code");
            }
            start = end;
        }
        if start != self.locals.len() {
            return corrupt("trailing local data");
        }
        Ok(())
    }

    pub fn heap_bytes(&self) -> usize {
        self.prefixes.iter().map(|p| p.capacity()).sum::<usize>()
            + self.prefixes.capacity() * std::mem::size_of::<String>()
            + self.codes.heap_bytes()
            + self.locals.capacity()
            + self.ends.capacity() * std::mem::size_of::<u32>()
    }
}
