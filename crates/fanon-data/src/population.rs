//! Fixed-capacity bit vector recording row membership.
//!
//! Bit `i` lives at `words[i / 64] & (1 << (i % 64))`. The population count
//! is maintained incrementally and only changes when a bit actually flips,
//! so repeated `add` of a member is harmless.

use fanon_error::{AnonError, Result};
use serde::{Deserialize, Serialize};

const WORD_BITS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationSet {
    words: Vec<u64>,
    capacity: usize,
    size: usize,
}

impl PopulationSet {
    /// Empty set over the universe `0..capacity`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(WORD_BITS)],
            capacity,
            size: 0,
        }
    }

    /// Set containing every row of `0..capacity`.
    #[must_use]
    pub fn full(capacity: usize) -> Self {
        let mut set = Self::new(capacity);
        for row in 0..capacity {
            set.insert(row);
        }
        set
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of member rows.
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    const fn locate(row: usize) -> (usize, u64) {
        (row / WORD_BITS, 1u64 << (row % WORD_BITS))
    }

    fn check(&self, row: usize) -> Result<()> {
        if row >= self.capacity {
            return Err(AnonError::row_out_of_bounds(row, self.capacity));
        }
        Ok(())
    }

    fn insert(&mut self, row: usize) {
        let (word, mask) = Self::locate(row);
        if self.words[word] & mask == 0 {
            self.words[word] |= mask;
            self.size += 1;
        }
    }

    fn erase(&mut self, row: usize) {
        let (word, mask) = Self::locate(row);
        if self.words[word] & mask != 0 {
            self.words[word] &= !mask;
            self.size -= 1;
        }
    }

    /// Add `row`. Fails with `RowOutOfBounds` outside the universe.
    #[inline]
    pub fn add(&mut self, row: usize) -> Result<()> {
        self.check(row)?;
        self.insert(row);
        Ok(())
    }

    /// Remove `row`. Fails with `RowOutOfBounds` outside the universe.
    #[inline]
    pub fn remove(&mut self, row: usize) -> Result<()> {
        self.check(row)?;
        self.erase(row);
        Ok(())
    }

    /// Membership test; rows outside the universe are never members.
    #[inline]
    pub fn contains(&self, row: usize) -> bool {
        if row >= self.capacity {
            return false;
        }
        let (word, mask) = Self::locate(row);
        self.words[word] & mask != 0
    }

    /// Exchange the membership of two rows, following a row renumbering.
    ///
    /// Fails with `RowOutOfBounds`, leaving the set unchanged, if either
    /// row is outside the universe.
    pub fn swap(&mut self, row1: usize, row2: usize) -> Result<()> {
        self.check(row1)?;
        self.check(row2)?;
        let member1 = self.contains(row1);
        let member2 = self.contains(row2);
        if member1 == member2 {
            return Ok(());
        }
        if member2 {
            self.insert(row1);
            self.erase(row2);
        } else {
            self.erase(row1);
            self.insert(row2);
        }
        Ok(())
    }

    /// Member rows in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let tz = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(w * WORD_BITS + tz)
            })
        })
    }

    /// Member rows as a sorted vector.
    pub fn to_sorted_indices(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.size);
        out.extend(self.iter());
        out
    }
}
