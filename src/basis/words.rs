//! Dense indexing of tensor-algebra words
//!
//! Words of length `k` over the alphabet `0..channels` are numbered in base
//! `channels`, so the word `w_1 w_2 ... w_k` at level `k` has level-local index
//! `w_1 * D^(k-1) + ... + w_k`. Levels are laid out one after another, which
//! makes word concatenation an index computation: a level-`i` word `p`
//! followed by a level-`j` word `q` is the level-`(i+j)` word `p * D^j + q`.
//!
//! Two layouts are used throughout the crate:
//! - the *tensor* layout stores the level-0 scalar first, then levels `1..=N`
//! - the *signature* layout drops the scalar, so it is the tensor layout
//!   shifted by one

use super::check_dims;
use crate::error::{Error, Result};
use std::ops::Range;

/// Bijection between words of length `1..=depth` and dense indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordIndexer {
    channels: usize,
    depth: usize,
    /// `level_sizes[k] == channels^k` for `k` in `0..=depth`
    level_sizes: Vec<usize>,
    /// Start of each level in the tensor layout, plus one past the end
    offsets: Vec<usize>,
}

impl WordIndexer {
    /// Build the indexer for `(channels, depth)` under the default size ceiling
    pub fn new(channels: usize, depth: usize) -> Result<Self> {
        check_dims(channels, depth, super::DEFAULT_MAX_LEVEL_SIZE)?;
        Ok(Self::build(channels, depth))
    }

    /// Build without re-checking dims; callers have validated them already
    pub(crate) fn build(channels: usize, depth: usize) -> Self {
        let mut level_sizes = Vec::with_capacity(depth + 1);
        let mut size = 1;
        for _ in 0..=depth {
            level_sizes.push(size);
            size *= channels;
        }
        let mut offsets = Vec::with_capacity(depth + 2);
        let mut offset = 0;
        for &size in &level_sizes {
            offsets.push(offset);
            offset += size;
        }
        offsets.push(offset);
        Self {
            channels,
            depth,
            level_sizes,
            offsets,
        }
    }

    /// Alphabet size D
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Truncation depth N
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// `(channels, depth)` pair this indexer was built for
    #[inline]
    pub fn key(&self) -> (usize, usize) {
        (self.channels, self.depth)
    }

    /// Number of words of length `level`, i.e. `channels^level`
    ///
    /// # Panics
    ///
    /// Panics if `level > depth`.
    #[inline]
    pub fn level_size(&self, level: usize) -> usize {
        self.level_sizes[level]
    }

    /// Length of a full tensor-algebra element, level 0 included
    #[inline]
    pub fn tensor_len(&self) -> usize {
        self.offsets[self.depth + 1]
    }

    /// Length of a signature, i.e. levels `1..=depth`
    #[inline]
    pub fn signature_channels(&self) -> usize {
        self.tensor_len() - 1
    }

    /// Range of `level` in the tensor layout
    ///
    /// # Panics
    ///
    /// Panics if `level > depth`.
    #[inline]
    pub fn level_range(&self, level: usize) -> Range<usize> {
        self.offsets[level]..self.offsets[level + 1]
    }

    /// Range of `level` (`>= 1`) in the signature layout
    ///
    /// # Panics
    ///
    /// Panics if `level` is 0 or greater than `depth`.
    #[inline]
    pub fn signature_level_range(&self, level: usize) -> Range<usize> {
        assert!(level >= 1, "the signature layout has no level 0");
        self.offsets[level] - 1..self.offsets[level + 1] - 1
    }

    /// Level-local index of a word of the given length
    pub(crate) fn local_index(&self, word: &[usize]) -> usize {
        word.iter().fold(0, |acc, &letter| acc * self.channels + letter)
    }

    /// Index of `word` in the signature layout
    pub fn word_index(&self, word: &[usize]) -> Result<usize> {
        if word.is_empty() || word.len() > self.depth {
            return Err(Error::invalid_argument(
                "word",
                format!("length {} outside 1..={}", word.len(), self.depth),
            ));
        }
        if let Some(&letter) = word.iter().find(|&&letter| letter >= self.channels) {
            return Err(Error::invalid_argument(
                "word",
                format!("letter {letter} outside alphabet 0..{}", self.channels),
            ));
        }
        Ok(self.signature_level_range(word.len()).start + self.local_index(word))
    }

    /// Word stored at `index` in the signature layout
    pub fn word_at(&self, index: usize) -> Result<Vec<usize>> {
        if index >= self.signature_channels() {
            return Err(Error::invalid_argument(
                "index",
                format!("{index} out of range for {} words", self.signature_channels()),
            ));
        }
        let level = (1..=self.depth)
            .find(|&level| self.signature_level_range(level).contains(&index))
            .unwrap_or(self.depth);
        let mut local = index - self.signature_level_range(level).start;
        let mut word = vec![0; level];
        for slot in word.iter_mut().rev() {
            *slot = local % self.channels;
            local /= self.channels;
        }
        Ok(word)
    }

    /// Every word in signature-layout order: by level, then lexicographically
    pub fn words(&self) -> Vec<Vec<usize>> {
        let mut out = Vec::with_capacity(self.signature_channels());
        let mut current: Vec<Vec<usize>> = vec![Vec::new()];
        for _ in 1..=self.depth {
            let mut next = Vec::with_capacity(current.len() * self.channels);
            for prefix in &current {
                for letter in 0..self.channels {
                    let mut word = prefix.clone();
                    word.push(letter);
                    next.push(word);
                }
            }
            out.extend(next.iter().cloned());
            current = next;
        }
        out
    }

    /// Fail with `SizeMismatch` unless `other` was built for the same pair
    pub fn check_same(&self, other: &WordIndexer, operand: &'static str) -> Result<()> {
        self.check_key(other.key(), operand)
    }

    /// Fail with `SizeMismatch` unless `key` equals `(channels, depth)`
    pub fn check_key(&self, key: (usize, usize), operand: &'static str) -> Result<()> {
        if self.key() != key {
            return Err(Error::size_mismatch(operand, self.key(), key));
        }
        Ok(())
    }
}
