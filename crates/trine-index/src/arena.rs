//! Chunked append-only id lists.
//!
//! Every adjacency list in the index lives in one shared [`ObjectArena`]. A
//! list is a singly linked chain of fixed-size chunks addressed by `u32`
//! indices, so appending never moves existing entries and a key costs no
//! allocation of its own. [`Adjacency`] maps a packed `(predicate, term)` key
//! to the [`Span`] describing its chain.

use std::collections::HashMap;

use trine_types::TermId;

use crate::error::IndexResult;

/// Ids per chunk. Most `(p, s)` pairs have one to three objects.
pub const CHUNK_LEN: usize = 4;

const NIL: u32 = u32::MAX;

#[derive(Clone, Copy, Debug)]
struct Chunk {
    items: [TermId; CHUNK_LEN],
    len: u8,
    next: u32,
}

impl Chunk {
    fn starting_with(value: TermId) -> Self {
        let mut items = [TermId::WILDCARD; CHUNK_LEN];
        items[0] = value;
        Self {
            items,
            len: 1,
            next: NIL,
        }
    }

    fn is_full(&self) -> bool {
        self.len as usize == CHUNK_LEN
    }

    fn as_slice(&self) -> &[TermId] {
        &self.items[..self.len as usize]
    }
}

/// Location of one list inside an [`ObjectArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    head: u32,
    tail: u32,
    len: u32,
}

impl Span {
    /// Number of ids in the list.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Always `false`: spans are created with their first id.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Backing storage shared by every list of an [`Adjacency`].
#[derive(Clone, Debug, Default)]
pub struct ObjectArena {
    chunks: Vec<Chunk>,
}

impl ObjectArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Reserve room for `additional` chunks without aborting on failure.
    pub fn try_reserve(&mut self, additional: usize) -> IndexResult<()> {
        self.chunks.try_reserve(additional)?;
        Ok(())
    }

    /// Returns `true` if appending to `span` needs a fresh chunk.
    pub fn needs_chunk(&self, span: Option<&Span>) -> bool {
        match span {
            None => true,
            Some(span) => self.chunks[span.tail as usize].is_full(),
        }
    }

    /// Start a new list holding `value`.
    pub fn start(&mut self, value: TermId) -> Span {
        let index = self.alloc(value);
        Span {
            head: index,
            tail: index,
            len: 1,
        }
    }

    /// Append `value` to the list at `span`.
    pub fn push(&mut self, span: &mut Span, value: TermId) {
        let tail = &mut self.chunks[span.tail as usize];
        if tail.is_full() {
            let index = self.alloc(value);
            self.chunks[span.tail as usize].next = index;
            span.tail = index;
        } else {
            tail.items[tail.len as usize] = value;
            tail.len += 1;
        }
        span.len += 1;
    }

    /// Iterate the list at `span` in insertion order.
    pub fn values(&self, span: Span) -> Values<'_> {
        Values {
            arena: self,
            chunk: span.head,
            offset: 0,
            remaining: span.len as usize,
        }
    }

    /// Returns `true` if the list at `span` holds `value`.
    pub fn contains(&self, span: Span, value: TermId) -> bool {
        let mut cursor = span.head;
        while cursor != NIL {
            let chunk = &self.chunks[cursor as usize];
            if chunk.as_slice().contains(&value) {
                return true;
            }
            cursor = chunk.next;
        }
        false
    }

    /// Heap footprint in bytes.
    pub fn heap_bytes(&self) -> usize {
        self.chunks.capacity() * std::mem::size_of::<Chunk>()
    }

    fn alloc(&mut self, value: TermId) -> u32 {
        let index = self.chunks.len() as u32;
        self.chunks.push(Chunk::starting_with(value));
        index
    }
}

/// Iterator over one list of an [`ObjectArena`].
#[derive(Clone)]
pub struct Values<'a> {
    arena: &'a ObjectArena,
    chunk: u32,
    offset: usize,
    remaining: usize,
}

impl<'a> Values<'a> {
    /// An iterator that yields nothing.
    pub fn empty(arena: &'a ObjectArena) -> Self {
        Self {
            arena,
            chunk: NIL,
            offset: 0,
            remaining: 0,
        }
    }
}

impl Iterator for Values<'_> {
    type Item = TermId;

    fn next(&mut self) -> Option<TermId> {
        if self.remaining == 0 {
            return None;
        }
        let mut chunk = &self.arena.chunks[self.chunk as usize];
        if self.offset == chunk.len as usize {
            self.chunk = chunk.next;
            self.offset = 0;
            chunk = &self.arena.chunks[self.chunk as usize];
        }
        let value = chunk.items[self.offset];
        self.offset += 1;
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Values<'_> {}

#[inline]
fn pack(predicate: TermId, term: TermId) -> u64 {
    (u64::from(predicate.get()) << 32) | u64::from(term.get())
}

/// `(predicate, term)` → list of ids, backed by one [`ObjectArena`].
#[derive(Clone, Debug, Default)]
pub struct Adjacency {
    spans: HashMap<u64, Span>,
    arena: ObjectArena,
}

impl Adjacency {
    /// Create an empty adjacency.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with at least one entry.
    pub fn key_count(&self) -> usize {
        self.spans.len()
    }

    /// The backing arena.
    pub fn arena(&self) -> &ObjectArena {
        &self.arena
    }

    /// Number of ids listed under `(predicate, term)`.
    pub fn len(&self, predicate: TermId, term: TermId) -> usize {
        self.spans
            .get(&pack(predicate, term))
            .map_or(0, |span| span.len())
    }

    /// Returns `true` if `(predicate, term)` lists `value`.
    #[inline]
    pub fn contains(&self, predicate: TermId, term: TermId, value: TermId) -> bool {
        match self.spans.get(&pack(predicate, term)) {
            Some(&span) => self.arena.contains(span, value),
            None => false,
        }
    }

    /// Returns `true` if `(predicate, term)` has any entry.
    pub fn contains_key(&self, predicate: TermId, term: TermId) -> bool {
        self.spans.contains_key(&pack(predicate, term))
    }

    /// The ids under `(predicate, term)` in insertion order.
    pub fn values(&self, predicate: TermId, term: TermId) -> Values<'_> {
        match self.spans.get(&pack(predicate, term)) {
            Some(&span) => self.arena.values(span),
            None => Values::empty(&self.arena),
        }
    }

    /// Reserve everything a following [`append`](Self::append) to this key needs.
    pub fn reserve_for(&mut self, predicate: TermId, term: TermId) -> IndexResult<()> {
        let span = self.spans.get(&pack(predicate, term)).copied();
        if span.is_none() {
            self.spans.try_reserve(1)?;
        }
        if self.arena.needs_chunk(span.as_ref()) {
            self.arena.try_reserve(1)?;
        }
        Ok(())
    }

    /// Append `value` under `(predicate, term)`. Does not check for duplicates.
    pub fn append(&mut self, predicate: TermId, term: TermId, value: TermId) {
        match self.spans.get_mut(&pack(predicate, term)) {
            Some(span) => self.arena.push(span, value),
            None => {
                let span = self.arena.start(value);
                self.spans.insert(pack(predicate, term), span);
            }
        }
    }

    /// Heap footprint in bytes.
    pub fn heap_bytes(&self) -> usize {
        let entry = std::mem::size_of::<u64>() + std::mem::size_of::<Span>();
        self.spans.capacity() * entry + self.arena.heap_bytes()
    }
}
