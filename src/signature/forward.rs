//! Chen's-identity forward fold

use super::options::{PathDims, PathView, SignatureOptions, check_path};
use crate::algebra::{exp_into, mult_left_inplace, mult_right_inplace};
use crate::basis::WordIndexer;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::runtime::for_each_row;
use crate::tensor::Tensor;

/// Scratch buffers reused across the segments of one path
pub(crate) struct Workspace<T> {
    pub acc: Vec<T>,
    pub seg: Vec<T>,
    pub z: Vec<T>,
}

impl<T: Element> Workspace<T> {
    pub fn new(words: &WordIndexer) -> Self {
        let mut acc = vec![T::zero(); words.tensor_len()];
        acc[0] = T::one();
        Self {
            acc,
            seg: vec![T::zero(); words.tensor_len()],
            z: vec![T::zero(); words.channels()],
        }
    }
}

/// Fold the segment exponentials of one path into `ws.acc`
///
/// `emit(k, acc)` is called after segment `k` has been absorbed.
pub(crate) fn fold_path<T, F>(
    view: &PathView<'_, T>,
    segments: usize,
    inverse: bool,
    words: &WordIndexer,
    ws: &mut Workspace<T>,
    mut emit: F,
) where
    T: Element,
    F: FnMut(usize, &[T]),
{
    for k in 0..segments {
        view.displacement(k, inverse, &mut ws.z);
        exp_into(&mut ws.seg, &ws.z, words);
        if inverse {
            mult_left_inplace(&ws.seg, &mut ws.acc, words);
        } else {
            mult_right_inplace(&mut ws.acc, &ws.seg, words);
        }
        emit(k, &ws.acc);
    }
}

pub(crate) fn check_channels(
    words: &WordIndexer,
    dims: &PathDims,
    operand: &'static str,
) -> Result<()> {
    if dims.channels != words.channels() {
        return Err(Error::size_mismatch(
            operand,
            words.key(),
            (dims.channels, words.depth()),
        ));
    }
    Ok(())
}

/// Output shape for a signature of the given path dims
pub(crate) fn output_shape(words: &WordIndexer, dims: &PathDims, stream: bool) -> Vec<usize> {
    if stream {
        vec![dims.batch, dims.segments(), words.signature_channels()]
    } else {
        vec![dims.batch, words.signature_channels()]
    }
}

/// Signature of a batched path against a prepared indexer
pub(crate) fn signature_with<T: Element>(
    words: &WordIndexer,
    path: &Tensor<T>,
    options: &SignatureOptions<T>,
) -> Result<Tensor<T>> {
    let dims = check_path(path, words.depth(), options)?;
    check_channels(words, &dims, "path")?;
    let sig_len = words.signature_channels();
    let segments = dims.segments();
    let row_len = if options.stream { segments * sig_len } else { sig_len };
    let shape = output_shape(words, &dims, options.stream);
    let mut out = vec![T::zero(); dims.batch * row_len];
    if dims.batch == 0 {
        return Tensor::from_vec(out, &shape);
    }

    let zero = vec![T::zero(); dims.channels];
    for_each_row(&mut out, row_len, |b, row| {
        let view = PathView::new(path, &dims, &options.basepoint, &zero, b);
        let mut ws = Workspace::new(words);
        if options.stream {
            fold_path(&view, segments, options.inverse, words, &mut ws, |k, acc| {
                row[k * sig_len..(k + 1) * sig_len].copy_from_slice(&acc[1..]);
            });
        } else {
            fold_path(&view, segments, options.inverse, words, &mut ws, |_, _| {});
            row.copy_from_slice(&ws.acc[1..]);
        }
        Ok(())
    })?;
    Tensor::from_vec(out, &shape)
}
