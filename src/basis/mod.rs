//! Combinatorial bookkeeping for the truncated tensor algebra
//!
//! - [`WordIndexer`]: dense indices for every word of length `1..=N`
//! - [`LyndonBasis`]: Lyndon words of length `1..=N`, their standard
//!   factorizations and bracket expansions
//! - [`BasisRegistry`]: memoizing cache of both, keyed by `(channels, depth)`
//!
//! Everything here is a pure function of `(channels, depth)` and holds no
//! numeric data. Letters are 0-based: the alphabet is `0..channels`.

mod lyndon;
mod registry;
mod words;

pub use lyndon::{BasisRecord, BasisTable, Bracket, BracketTables, LyndonBasis, LyndonWord};
pub use registry::{BasisRegistry, DEFAULT_MAX_LEVEL_SIZE, RegistryConfig};
pub use words::WordIndexer;

use crate::error::{Error, Result};

/// Validate `(channels, depth)` and the `channels^depth` ceiling
pub(crate) fn check_dims(channels: usize, depth: usize, limit: usize) -> Result<()> {
    if channels == 0 {
        return Err(Error::configuration(channels, depth, "channels must be at least 1"));
    }
    if depth == 0 {
        return Err(Error::configuration(channels, depth, "depth must be at least 1"));
    }
    // the sum over all levels must stay addressable as well
    let ceiling = limit.min(usize::MAX / 4);
    match u32::try_from(depth).ok().and_then(|d| channels.checked_pow(d)) {
        Some(size) if size <= ceiling => {
            if size > ceiling / 4 {
                tracing::warn!(
                    channels,
                    depth,
                    level_size = size,
                    limit,
                    "tensor level size is close to the configured ceiling"
                );
            }
            Ok(())
        }
        _ => Err(Error::Capacity {
            channels,
            depth,
            resource: "scalars per tensor level",
            limit,
        }),
    }
}

/// Size of a signature: `D + D^2 + ... + D^N`
pub fn signature_channels(channels: usize, depth: usize) -> Result<usize> {
    check_dims(channels, depth, DEFAULT_MAX_LEVEL_SIZE)?;
    Ok(WordIndexer::build(channels, depth).signature_channels())
}

/// Depth whose signature over `channels` letters has exactly `sig_len` values
pub(crate) fn infer_depth(channels: usize, sig_len: usize) -> Option<usize> {
    if channels == 0 {
        return None;
    }
    let (mut total, mut level) = (0usize, 1usize);
    for depth in 1.. {
        level = level.checked_mul(channels)?;
        total = total.checked_add(level)?;
        if total >= sig_len {
            return (total == sig_len).then_some(depth);
        }
    }
    None
}

/// Size of a log-signature: the number of Lyndon words of length `1..=N`
///
/// Computed with Witt's necklace formula
/// `sum_{k=1}^{N} (1/k) sum_{d | k} mu(d) D^(k/d)`.
pub fn logsignature_channels(channels: usize, depth: usize) -> Result<usize> {
    check_dims(channels, depth, DEFAULT_MAX_LEVEL_SIZE)?;
    Ok(logsignature_channels_unchecked(channels, depth))
}

pub(crate) fn logsignature_channels_unchecked(channels: usize, depth: usize) -> usize {
    (1..=depth)
        .map(|k| {
            let sum: i128 = (1..=k)
                .filter(|d| k % d == 0)
                .map(|d| mobius(d) as i128 * (channels as i128).pow((k / d) as u32))
                .sum();
            (sum / k as i128) as usize
        })
        .sum()
}

fn mobius(mut n: usize) -> i64 {
    let mut result = 1;
    let mut p = 2;
    while p * p <= n {
        if n % p == 0 {
            n /= p;
            if n % p == 0 {
                return 0;
            }
            result = -result;
        }
        p += 1;
    }
    if n > 1 {
        result = -result;
    }
    result
}

/// Every word of length `1..=depth`, in signature order
pub fn all_words(channels: usize, depth: usize) -> Result<Vec<Vec<usize>>> {
    Ok(WordIndexer::new(channels, depth)?.words())
}

/// Every Lyndon word of length `1..=depth`, in log-signature order
pub fn lyndon_words(channels: usize, depth: usize) -> Result<Vec<Vec<usize>>> {
    let basis = LyndonBasis::new(channels, depth)?;
    Ok(basis.words().iter().map(|w| w.letters().to_vec()).collect())
}

/// Lyndon brackets of every Lyndon word, in log-signature order
pub fn lyndon_brackets(channels: usize, depth: usize) -> Result<Vec<Bracket>> {
    let basis = LyndonBasis::new(channels, depth)?;
    Ok((0..basis.len()).map(|i| basis.bracket(i)).collect())
}
