//! The hash-backed [`Interner`].
//!
//! Strings live in a `Vec<Arc<str>>` indexed by `id - 1`; a `HashMap` keyed
//! by the same `Arc<str>` answers the reverse direction. Resolving is a bounds
//! check plus a vector index, interning is one hash probe.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use trine_types::TermId;

use crate::error::{InternError, InternResult};

/// Bidirectional text ⇄ [`TermId`] table.
///
/// Not internally synchronized: interning needs `&mut self`, resolving only
/// `&self`, so the borrow checker enforces single-writer access.
#[derive(Clone, Default)]
pub struct Interner {
    /// Issued strings; the string for id `n` sits at index `n - 1`.
    strings: Vec<Arc<str>>,
    /// Reverse map from text to id.
    ids: HashMap<Arc<str>, TermId>,
    /// Bytes of string payload held (each string counted once).
    payload_bytes: usize,
}

impl Interner {
    /// Create an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty interner with room for `capacity` strings.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            strings: Vec::with_capacity(capacity),
            ids: HashMap::with_capacity(capacity),
            payload_bytes: 0,
        }
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns `true` if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// The id the next new string will receive.
    pub fn next_id(&self) -> InternResult<TermId> {
        u32::try_from(self.strings.len() + 1)
            .map(TermId::new)
            .map_err(|_| InternError::Exhausted {
                issued: self.strings.len(),
            })
    }

    /// Intern `text`, returning its id. Idempotent.
    pub fn intern(&mut self, text: &str) -> InternResult<TermId> {
        if let Some(&id) = self.ids.get(text) {
            return Ok(id);
        }
        let id = self.next_id()?;
        let shared: Arc<str> = Arc::from(text);
        self.payload_bytes += shared.len();
        self.strings.push(Arc::clone(&shared));
        self.ids.insert(shared, id);
        trace!(%id, len = text.len(), "interned term");
        Ok(id)
    }

    /// Forget every string issued after the first `len`.
    ///
    /// Ids above `len` become unissued again and will be handed out anew.
    /// Callers must ensure none of them is still referenced.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.strings.len() {
            return;
        }
        for text in self.strings.drain(len..) {
            self.payload_bytes -= text.len();
            self.ids.remove(&*text);
        }
        trace!(len, "truncated interner");
    }

    /// Look up `text` without interning it.
    #[inline]
    pub fn lookup(&self, text: &str) -> Option<TermId> {
        self.ids.get(text).copied()
    }

    /// Resolve an id back to its text.
    pub fn resolve(&self, id: TermId) -> InternResult<&str> {
        self.get(id).ok_or(InternError::NotFound(id))
    }

    /// Resolve an id, returning `None` for ids this interner never issued.
    #[inline]
    pub fn get(&self, id: TermId) -> Option<&str> {
        if id.is_wildcard() {
            return None;
        }
        self.strings.get(id.index() - 1).map(|s| s.as_ref())
    }

    /// All `(id, text)` pairs in issue order.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, &str)> + '_ {
        self.strings
            .iter()
            .enumerate()
            .map(|(i, s)| (TermId::new(i as u32 + 1), s.as_ref()))
    }

    /// Approximate heap footprint in bytes.
    pub fn heap_bytes(&self) -> usize {
        let arc = std::mem::size_of::<Arc<str>>();
        let entry = arc + std::mem::size_of::<TermId>();
        self.payload_bytes + self.strings.capacity() * arc + self.ids.capacity() * entry
    }
}

impl std::fmt::Debug for Interner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interner")
            .field("terms", &self.strings.len())
            .field("payload_bytes", &self.payload_bytes)
            .finish()
    }
}
