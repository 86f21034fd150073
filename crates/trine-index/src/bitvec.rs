//! Fixed-capacity bitset.
//!
//! Bits are packed into `u64` words. Popcount and the set-bit iterator work a
//! word at a time, so an empty 64-bit stretch costs one comparison.

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};

const WORD_BITS: usize = u64::BITS as usize;

#[inline]
fn words_for(capacity: usize) -> usize {
    capacity.div_ceil(WORD_BITS)
}

/// A set of bit positions in `0..capacity`.
///
/// The capacity never changes after creation. Bits past the capacity in the
/// last word are always zero.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitVector {
    words: Vec<u64>,
    capacity: usize,
}

impl BitVector {
    /// Create an all-zero vector of `capacity` bits.
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; words_for(capacity)],
            capacity,
        }
    }

    /// Create an all-zero vector, reporting allocation failure instead of aborting.
    pub fn try_new(capacity: usize) -> IndexResult<Self> {
        let len = words_for(capacity);
        let mut words = Vec::new();
        words.try_reserve_exact(len)?;
        words.resize(len, 0);
        Ok(Self { words, capacity })
    }

    /// Number of addressable bits.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Set bit `index`.
    pub fn set(&mut self, index: usize) -> IndexResult<()> {
        self.check(index)?;
        self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
        Ok(())
    }

    /// Set bit `index`, returning `true` if it was previously unset.
    ///
    /// Positions beyond the capacity are ignored and return `false`.
    #[inline]
    pub fn insert(&mut self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        let word = &mut self.words[index / WORD_BITS];
        let mask = 1u64 << (index % WORD_BITS);
        let fresh = *word & mask == 0;
        *word |= mask;
        fresh
    }

    /// Read bit `index`, failing if it is beyond the capacity.
    pub fn test(&self, index: usize) -> IndexResult<bool> {
        self.check(index)?;
        Ok(self.contains(index))
    }

    /// Read bit `index`; positions beyond the capacity read as unset.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        match self.words.get(index / WORD_BITS) {
            Some(word) if index < self.capacity => word & (1u64 << (index % WORD_BITS)) != 0,
            _ => false,
        }
    }

    /// Number of set bits.
    pub fn popcount(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns `true` if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Iterate set positions in ascending order.
    pub fn iter_ones(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            word_index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    /// The packed words, least significant bit first.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Heap footprint in bytes.
    pub fn heap_bytes(&self) -> usize {
        self.words.capacity() * std::mem::size_of::<u64>()
    }

    #[inline]
    fn check(&self, index: usize) -> IndexResult<()> {
        if index >= self.capacity {
            return Err(IndexError::BitOutOfRange {
                index,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for BitVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitVector")
            .field("capacity", &self.capacity)
            .field("ones", &self.popcount())
            .finish()
    }
}

/// Iterator over the set positions of a [`BitVector`].
pub struct Ones<'a> {
    words: &'a [u64],
    word_index: usize,
    current: u64,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.current == 0 {
            self.word_index += 1;
            self.current = *self.words.get(self.word_index)?;
        }
        let bit = self.current.trailing_zeros() as usize;
        self.current &= self.current - 1;
        Some(self.word_index * WORD_BITS + bit)
    }
}
