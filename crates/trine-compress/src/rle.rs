//! Run-length encoded bit vectors.

use serde::{Deserialize, Serialize};

use trine_index::BitVector;

use crate::error::{CompressError, CompressResult};

/// A maximal stretch of identical bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// First bit position covered by the run.
    pub start: u32,
    pub len: u32,
    pub value: bool,
}

impl Run {
    fn end(&self) -> usize {
        self.start as usize + self.len as usize
    }
}

/// A [`BitVector`] stored as alternating runs.
///
/// Runs cover `0..capacity` exactly, in order, with adjacent runs always
/// differing in value. Positions at or past `capacity` read as unset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RleBitVector {
    capacity: usize,
    runs: Vec<Run>,
    ones: usize,
}

impl RleBitVector {
    /// Encode `bits` in one pass over its set positions.
    pub fn build(bits: &BitVector) -> Self {
        let capacity = bits.capacity();
        let mut runs = Vec::new();
        let mut pos = 0usize;
        let mut ones = bits.iter_ones().peekable();
        while let Some(start) = ones.next() {
            let mut end = start + 1;
            while ones.peek() == Some(&end) {
                ones.next();
                end += 1;
            }
            if start > pos {
                runs.push(run(pos, start, false));
            }
            runs.push(run(start, end, true));
            pos = end;
        }
        if pos < capacity {
            runs.push(run(pos, capacity, false));
        }
        let ones = runs.iter().filter(|r| r.value).map(|r| r.len as usize).sum();
        Self {
            capacity,
            runs,
            ones,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Read bit `index`, failing if it lies outside the vector.
    pub fn test(&self, index: usize) -> CompressResult<bool> {
        if index >= self.capacity {
            return Err(CompressError::OutOfRange {
                index,
                capacity: self.capacity,
            });
        }
        Ok(self.contains(index))
    }

    /// Read bit `index`; out-of-range positions are unset.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        // Binary search over run starts for the run covering `index`.
        let k = self.runs.partition_point(|r| r.start as usize <= index);
        k > 0 && self.runs[k - 1].value
    }

    pub fn popcount(&self) -> usize {
        self.ones
    }

    pub fn is_empty(&self) -> bool {
        self.ones == 0
    }

    /// Set positions in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.runs
            .iter()
            .filter(|r| r.value)
            .flat_map(|r| r.start as usize..r.end())
    }

    /// Structural checks for a vector read back from bytes.
    pub(crate) fn validate(&self) -> CompressResult<()> {
        let mut pos = 0usize;
        let mut ones = 0usize;
        let mut prev: Option<bool> = None;
        for r in &self.runs {
            if r.start as usize != pos || r.len == 0 || prev == Some(r.value) {
                return Err(CompressError::Corrupt(format!("rle run at {pos}")));
            }
            if r.value {
                ones += r.len as usize;
            }
            pos = r.end();
            prev = Some(r.value);
        }
        if pos != self.capacity || ones != self.ones {
            return Err(CompressError::Corrupt("rle runs do not cover capacity".into()));
        }
        Ok(())
    }

    pub fn heap_bytes(&self) -> usize {
        self.runs.capacity() * std::mem::size_of::<Run>()
    }
}

fn run(start: usize, end: usize, value: bool) -> Run {
    Run {
        start: start as u32,
        len: (end - start) as u32,
        value,
    }
}
