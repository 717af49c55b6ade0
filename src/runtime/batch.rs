//! Row-parallel drivers

use crate::error::Result;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Run `f(row_index, row)` over consecutive `row_len`-sized rows of `out`
pub(crate) fn for_each_row<T, F>(out: &mut [T], row_len: usize, f: F) -> Result<()>
where
    T: Send,
    F: Fn(usize, &mut [T]) -> Result<()> + Sync + Send,
{
    debug_assert!(row_len > 0 && out.len() % row_len == 0);
    let rows = out.len() / row_len;
    tracing::trace!(rows, row_len, "dispatching batched kernel");

    #[cfg(feature = "rayon")]
    {
        if rows > 1 {
            return out
                .par_chunks_mut(row_len)
                .enumerate()
                .try_for_each(|(i, row)| f(i, row));
        }
    }

    out.chunks_mut(row_len)
        .enumerate()
        .try_for_each(|(i, row)| f(i, row))
}

/// Like [`for_each_row`], over two outputs that share a row count
pub(crate) fn for_each_row_pair<T, F>(
    a: &mut [T],
    a_len: usize,
    b: &mut [T],
    b_len: usize,
    f: F,
) -> Result<()>
where
    T: Send,
    F: Fn(usize, &mut [T], &mut [T]) -> Result<()> + Sync + Send,
{
    debug_assert!(a_len > 0 && b_len > 0);
    debug_assert_eq!(a.len() / a_len, b.len() / b_len);
    let rows = a.len() / a_len;
    tracing::trace!(rows, a_len, b_len, "dispatching batched kernel");

    #[cfg(feature = "rayon")]
    {
        if rows > 1 {
            return a
                .par_chunks_mut(a_len)
                .zip(b.par_chunks_mut(b_len))
                .enumerate()
                .try_for_each(|(i, (ra, rb))| f(i, ra, rb));
        }
    }

    a.chunks_mut(a_len)
        .zip(b.chunks_mut(b_len))
        .enumerate()
        .try_for_each(|(i, (ra, rb))| f(i, ra, rb))
}
