//! Lyndon words and their bracketings
//!
//! A Lyndon word is strictly smaller than each of its proper rotations. The
//! Lyndon words of length `1..=N` index a basis of the free Lie algebra
//! truncated at depth `N`, so they are the coordinates of a log-signature.
//!
//! Each Lyndon word `w` of length > 1 has a standard factorization `w = uv`
//! where `v` is the longest proper suffix of `w` that is itself Lyndon (then
//! `u` is Lyndon too). Bracketing recursively along that factorization gives
//! the Lyndon bracket `P(w) = [P(u), P(v)]`, whose expansion in the tensor
//! algebra is `w` plus a combination of strictly larger words of the same
//! length. That triangularity is what makes the bracket (Hall) coordinates
//! computable by forward substitution.

use super::{WordIndexer, check_dims, logsignature_channels_unchecked};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// One Lyndon basis element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyndonWord {
    letters: Vec<usize>,
    /// Index of the word in the signature layout
    tensor_index: usize,
    /// Positions (in the basis) of the standard factors, for length > 1
    factors: Option<(usize, usize)>,
}

impl LyndonWord {
    /// Letters of the word (0-based)
    #[inline]
    pub fn letters(&self) -> &[usize] {
        &self.letters
    }

    /// Length of the word, which is its level in the tensor algebra
    #[inline]
    pub fn level(&self) -> usize {
        self.letters.len()
    }

    /// Index of this word in the signature layout
    #[inline]
    pub fn tensor_index(&self) -> usize {
        self.tensor_index
    }

    /// Basis positions of the standard factorization `(u, v)`, if any
    #[inline]
    pub fn factors(&self) -> Option<(usize, usize)> {
        self.factors
    }
}

/// A bracketed Lie polynomial built from letters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bracket {
    /// A single letter
    Letter(usize),
    /// The commutator `[left, right]`
    Pair(Box<Bracket>, Box<Bracket>),
}

impl fmt::Display for Bracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Letter(letter) => write!(f, "{letter}"),
            Self::Pair(left, right) => write!(f, "[{left},{right}]"),
        }
    }
}

/// One record of the flat basis table
///
/// `left`/`right` are positions of the standard factors within the same table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasisRecord {
    /// Letters of the Lyndon word
    pub word: Vec<usize>,
    /// Level (word length)
    pub level: usize,
    /// Position of the left standard factor
    pub left: Option<usize>,
    /// Position of the right standard factor
    pub right: Option<usize>,
}

/// Serializable form of a [`LyndonBasis`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasisTable {
    /// Alphabet size the table was built for
    pub channels: usize,
    /// Depth the table was built for
    pub depth: usize,
    /// Lyndon words in basis order
    pub records: Vec<BasisRecord>,
}

/// Tensor expansions of the Lyndon brackets and the change of basis they induce
///
/// Only bracket coordinates need these. Their total size grows much faster
/// than the number of Lyndon words, so a [`LyndonBasis`] builds them on first
/// use and under a term budget.
#[derive(Debug, Clone)]
pub struct BracketTables {
    /// Tensor-algebra expansion of each Lyndon bracket, as
    /// `(level-local word index, coefficient)` sorted by index
    expansions: Vec<Vec<(usize, i64)>>,
    /// For each word `u`: `(position of Lyndon word w != u, coefficient of w in P(u))`
    triangle: Vec<Vec<(usize, i64)>>,
}

impl BracketTables {
    /// Expand every bracket of `basis`, or `None` once more than `limit` terms are needed
    fn build(basis: &LyndonBasis, limit: usize) -> Option<Self> {
        let words = &basis.words;
        let channels = basis.channels;
        let level_size = |level: usize| channels.pow(level as u32);
        let local_index =
            |letters: &[usize]| letters.iter().fold(0, |acc, &letter| acc * channels + letter);

        let mut terms = 0usize;
        let mut expansions: Vec<Vec<(usize, i64)>> = Vec::with_capacity(words.len());
        for word in words {
            let expansion = match word.factors {
                None => vec![(word.letters[0], 1)],
                Some((u, v)) => {
                    let (a, b) = (&expansions[u], &expansions[v]);
                    // unmerged products, before cancellation
                    let products = a.len().checked_mul(b.len())?.checked_mul(2)?;
                    if terms.checked_add(products)? > limit {
                        return None;
                    }
                    commutator(a, b, level_size(words[u].level()), level_size(words[v].level()))
                }
            };
            terms += expansion.len();
            expansions.push(expansion);
        }

        let mut triangle = Vec::with_capacity(words.len());
        for level in 1..=basis.depth {
            let range = basis.level_starts[level]..basis.level_starts[level + 1];
            let lookup: HashMap<usize, usize> = range
                .clone()
                .map(|pos| (local_index(&words[pos].letters), pos))
                .collect();
            for pos in range {
                let own = local_index(&words[pos].letters);
                let column: Vec<(usize, i64)> = expansions[pos]
                    .iter()
                    .filter(|&&(local, _)| local != own)
                    .filter_map(|&(local, coeff)| lookup.get(&local).map(|&w| (w, coeff)))
                    .collect();
                debug_assert!(column.iter().all(|&(w, _)| w > pos));
                triangle.push(column);
            }
        }

        Some(Self {
            expansions,
            triangle,
        })
    }

    /// Tensor-algebra expansion of the bracket of word `position`
    ///
    /// # Panics
    ///
    /// Panics if `position` is not below the basis length.
    #[inline]
    pub fn expansion(&self, position: usize) -> &[(usize, i64)] {
        &self.expansions[position]
    }

    /// Off-diagonal entries of the bracket change-of-basis, column `position`
    #[inline]
    pub(crate) fn triangle(&self, position: usize) -> &[(usize, i64)] {
        &self.triangle[position]
    }

    /// Total number of stored expansion terms
    pub fn terms(&self) -> usize {
        self.expansions.iter().map(Vec::len).sum()
    }
}

/// The Lyndon basis of the free Lie algebra truncated at `depth`
///
/// Words are ordered by level, then lexicographically. Within a level that is
/// also increasing order of [`LyndonWord::tensor_index`]. Building the basis
/// costs `O(#words)`; the bracket expansions are deferred to
/// [`LyndonBasis::brackets`].
#[derive(Debug, Clone)]
pub struct LyndonBasis {
    channels: usize,
    depth: usize,
    words: Vec<LyndonWord>,
    /// Words of level `k` occupy `level_starts[k]..level_starts[k + 1]`
    level_starts: Vec<usize>,
    /// Most expansion terms [`Self::brackets`] may store
    term_limit: usize,
    brackets: OnceLock<Option<BracketTables>>,
}

impl LyndonBasis {
    /// Generate the basis for `(channels, depth)` under the default size ceiling
    pub fn new(channels: usize, depth: usize) -> Result<Self> {
        check_dims(channels, depth, super::DEFAULT_MAX_LEVEL_SIZE)?;
        Ok(Self::generate(channels, depth, super::DEFAULT_MAX_LEVEL_SIZE))
    }

    /// Generate without re-checking dims
    pub(crate) fn generate(channels: usize, depth: usize, term_limit: usize) -> Self {
        let mut raw = duval(channels, depth);
        // stable, so each level stays in lexicographic order
        raw.sort_by_key(|word| word.len());

        let mut position: HashMap<Vec<usize>, usize> = HashMap::with_capacity(raw.len());
        let mut entries = Vec::with_capacity(raw.len());
        for (i, word) in raw.into_iter().enumerate() {
            let factors = standard_factorization(&word, &position);
            position.insert(word.clone(), i);
            entries.push((word, factors));
        }
        Self::from_parts(channels, depth, entries, term_limit)
    }

    /// Assemble the basis from words and their factor positions
    fn from_parts(
        channels: usize,
        depth: usize,
        entries: Vec<(Vec<usize>, Option<(usize, usize)>)>,
        term_limit: usize,
    ) -> Self {
        let indexer = WordIndexer::build(channels, depth);

        let mut level_starts = vec![0; depth + 2];
        for (word, _) in &entries {
            level_starts[word.len() + 1] += 1;
        }
        for level in 1..level_starts.len() {
            level_starts[level] += level_starts[level - 1];
        }

        let words: Vec<LyndonWord> = entries
            .into_iter()
            .map(|(letters, factors)| LyndonWord {
                tensor_index: indexer.signature_level_range(letters.len()).start
                    + indexer.local_index(&letters),
                letters,
                factors,
            })
            .collect();

        Self {
            channels,
            depth,
            words,
            level_starts,
            term_limit,
            brackets: OnceLock::new(),
        }
    }

    /// Same basis with a different budget for [`Self::brackets`]
    ///
    /// Tables that were already built are kept.
    pub fn with_term_limit(mut self, term_limit: usize) -> Self {
        self.term_limit = term_limit;
        self
    }

    /// Most expansion terms the bracket tables may hold
    #[inline]
    pub fn term_limit(&self) -> usize {
        self.term_limit
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

    /// `(channels, depth)` pair this basis was built for
    #[inline]
    pub fn key(&self) -> (usize, usize) {
        (self.channels, self.depth)
    }

    /// Number of basis elements, i.e. the log-signature size
    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the basis is empty (never true for a valid pair)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// All Lyndon words in basis order
    #[inline]
    pub fn words(&self) -> &[LyndonWord] {
        &self.words
    }

    /// Lyndon words of length `level`
    ///
    /// # Panics
    ///
    /// Panics if `level > depth`.
    pub fn level(&self, level: usize) -> &[LyndonWord] {
        &self.words[self.level_starts[level]..self.level_starts[level + 1]]
    }

    /// Bracket expansions and change of basis, built on first call
    ///
    /// Fails with `Capacity` when the expansions need more than
    /// [`Self::term_limit`] terms. The outcome is cached either way.
    pub fn brackets(&self) -> Result<&BracketTables> {
        let tables = self.brackets.get_or_init(|| {
            let built = BracketTables::build(self, self.term_limit);
            match &built {
                Some(tables) => tracing::debug!(
                    channels = self.channels,
                    depth = self.depth,
                    terms = tables.terms(),
                    "built Lyndon bracket tables"
                ),
                None => tracing::warn!(
                    channels = self.channels,
                    depth = self.depth,
                    limit = self.term_limit,
                    "Lyndon bracket expansions exceed the term limit"
                ),
            }
            built
        });
        tables.as_ref().ok_or(Error::Capacity {
            channels: self.channels,
            depth: self.depth,
            resource: "Lyndon bracket expansion terms",
            limit: self.term_limit,
        })
    }

    /// Whether [`Self::brackets`] has already succeeded
    pub fn has_brackets(&self) -> bool {
        matches!(self.brackets.get(), Some(Some(_)))
    }

    /// Tensor-algebra expansion of the bracket of word `position`
    ///
    /// Builds the bracket tables if needed, see [`Self::brackets`].
    ///
    /// # Panics
    ///
    /// Panics if `position >= self.len()`.
    pub fn expansion(&self, position: usize) -> Result<&[(usize, i64)]> {
        Ok(self.brackets()?.expansion(position))
    }

    /// Lyndon bracket of word `position`, following the standard factorization
    pub fn bracket(&self, position: usize) -> Bracket {
        let word = &self.words[position];
        match word.factors {
            None => Bracket::Letter(word.letters[0]),
            Some((u, v)) => Bracket::Pair(Box::new(self.bracket(u)), Box::new(self.bracket(v))),
        }
    }

    /// Fail with `Configuration` unless this basis was built for `(channels, depth)`
    pub fn check_matches(&self, channels: usize, depth: usize) -> Result<()> {
        if self.key() != (channels, depth) {
            return Err(Error::configuration(
                channels,
                depth,
                format!(
                    "basis was built for (channels={}, depth={})",
                    self.channels, self.depth
                ),
            ));
        }
        Ok(())
    }

    /// Flatten into a serializable table
    pub fn to_table(&self) -> BasisTable {
        BasisTable {
            channels: self.channels,
            depth: self.depth,
            records: self
                .words
                .iter()
                .map(|w| BasisRecord {
                    word: w.letters.clone(),
                    level: w.level(),
                    left: w.factors.map(|(u, _)| u),
                    right: w.factors.map(|(_, v)| v),
                })
                .collect(),
        }
    }

    /// Rebuild a basis from a persisted table
    ///
    /// The table must describe exactly the Lyndon basis of `(channels, depth)`:
    /// every word Lyndon and in basis order, every factor pair concatenating to
    /// its word, and the word count matching the necklace formula.
    pub fn from_table(table: &BasisTable) -> Result<Self> {
        let (channels, depth) = (table.channels, table.depth);
        check_dims(channels, depth, super::DEFAULT_MAX_LEVEL_SIZE)?;
        let bad = |reason: String| Error::configuration(channels, depth, reason);

        let expected = logsignature_channels_unchecked(channels, depth);
        if table.records.len() != expected {
            return Err(bad(format!(
                "table has {} records, expected {expected}",
                table.records.len()
            )));
        }

        let mut entries = Vec::with_capacity(table.records.len());
        for (i, record) in table.records.iter().enumerate() {
            let word = &record.word;
            if word.is_empty() || word.len() > depth || record.level != word.len() {
                return Err(bad(format!("record {i} has an invalid level")));
            }
            if word.iter().any(|&letter| letter >= channels) {
                return Err(bad(format!("record {i} uses a letter outside 0..{channels}")));
            }
            if !is_lyndon(word) {
                return Err(bad(format!("record {i} ({word:?}) is not a Lyndon word")));
            }
            if let Some(prev) = i.checked_sub(1).map(|p| &table.records[p].word) {
                if (prev.len(), prev) >= (word.len(), word) {
                    return Err(bad(format!("record {i} is out of order")));
                }
            }
            let factors = match (record.left, record.right) {
                (None, None) if word.len() == 1 => None,
                (Some(u), Some(v)) if u < i && v < i => {
                    let (left, right) = (&table.records[u].word, &table.records[v].word);
                    if left.len() + right.len() != word.len()
                        || word[..left.len()] != left[..]
                        || word[left.len()..] != right[..]
                    {
                        return Err(bad(format!("record {i} factors do not concatenate to it")));
                    }
                    Some((u, v))
                }
                _ => return Err(bad(format!("record {i} has invalid factors"))),
            };
            entries.push((word.clone(), factors));
        }
        Ok(Self::from_parts(
            channels,
            depth,
            entries,
            super::DEFAULT_MAX_LEVEL_SIZE,
        ))
    }

    /// Serialize the flat table to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_table())?)
    }

    /// Deserialize and validate a table produced by [`Self::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        let table: BasisTable = serde_json::from_str(json)?;
        Self::from_table(&table)
    }
}

/// Lyndon words of length `1..=depth` in lexicographic order (Duval's algorithm)
fn duval(channels: usize, depth: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut word = vec![0];
    loop {
        out.push(word.clone());
        let period = word.len();
        while word.len() < depth {
            word.push(word[word.len() - period]);
        }
        while word.last() == Some(&(channels - 1)) {
            word.pop();
        }
        match word.last_mut() {
            Some(last) => *last += 1,
            None => break,
        }
    }
    out
}

/// Split at the longest proper suffix that is a known Lyndon word
fn standard_factorization(
    word: &[usize],
    position: &HashMap<Vec<usize>, usize>,
) -> Option<(usize, usize)> {
    (1..word.len()).find_map(|split| {
        let right = position.get(&word[split..])?;
        let left = position.get(&word[..split])?;
        Some((*left, *right))
    })
}

/// Strictly smaller than every proper rotation
pub(crate) fn is_lyndon(word: &[usize]) -> bool {
    let n = word.len();
    n > 0
        && (1..n).all(|shift| {
            let rotated = word[shift..].iter().chain(&word[..shift]);
            word.iter().lt(rotated)
        })
}

/// Expansion of `[a, b] = ab - ba` for expansions at levels with the given sizes
fn commutator(a: &[(usize, i64)], b: &[(usize, i64)], a_size: usize, b_size: usize) -> Vec<(usize, i64)> {
    let mut products = Vec::with_capacity(2 * a.len() * b.len());
    for &(p, x) in a {
        for &(q, y) in b {
            products.push((p * b_size + q, x * y));
            products.push((q * a_size + p, -x * y));
        }
    }
    products.sort_unstable_by_key(|&(index, _)| index);

    let mut merged: Vec<(usize, i64)> = Vec::with_capacity(products.len());
    for (index, coeff) in products {
        match merged.last_mut() {
            Some(last) if last.0 == index => last.1 += coeff,
            _ => {
                if merged.last().is_some_and(|&(_, c)| c == 0) {
                    merged.pop();
                }
                merged.push((index, coeff));
            }
        }
    }
    if merged.last().is_some_and(|&(_, c)| c == 0) {
        merged.pop();
    }
    merged
}
