//! Coordinate extraction from the tensor logarithm
//!
//! The logarithm of a group-like element is a Lie polynomial. Its coordinates
//! in the Lyndon word basis are read straight from the tensor slots of the
//! Lyndon words. The coordinates against the Lyndon brackets `P(w)` follow by
//! solving `L_w = c_w + sum_{u < w} a_{u,w} c_u`, which is unitriangular in
//! basis order because `P(u)` leads with `u` and only has larger words after.

use crate::algebra::{log_backward, log_into};
use crate::basis::{BasisRegistry, LyndonBasis, WordIndexer};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::runtime::for_each_row;
use crate::tensor::Tensor;
use std::sync::Arc;

/// Basis in which log-signatures are expressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LogSignatureMode {
    /// Full tensor-algebra logarithm, `sig_channels` values
    Expand,
    /// Coefficients of the Lyndon words in the expanded logarithm
    #[default]
    Words,
    /// Coordinates against the Lyndon brackets (Hall basis)
    Brackets,
}

#[derive(Debug, Clone)]
enum Extraction {
    Expand,
    Words(Arc<LyndonBasis>),
    Brackets(Arc<LyndonBasis>),
}

/// Maps signatures to log-signatures of one `(channels, depth)` pair
#[derive(Debug, Clone)]
pub struct LogSignatureReducer {
    words: Arc<WordIndexer>,
    extraction: Extraction,
}

impl LogSignatureReducer {
    /// Reducer backed by the bases cached in `registry`
    pub fn new(
        registry: &BasisRegistry,
        channels: usize,
        depth: usize,
        mode: LogSignatureMode,
    ) -> Result<Self> {
        let words = registry.words(channels, depth)?;
        let extraction = match mode {
            LogSignatureMode::Expand => Extraction::Expand,
            LogSignatureMode::Words => Extraction::Words(registry.lyndon(channels, depth)?),
            LogSignatureMode::Brackets => {
                let basis = registry.lyndon(channels, depth)?;
                basis.brackets()?;
                Extraction::Brackets(basis)
            }
        };
        Ok(Self { words, extraction })
    }

    /// Reducer over an explicitly supplied basis
    ///
    /// Fails with `Configuration` if `basis` was built for another pair.
    pub fn from_basis(
        words: Arc<WordIndexer>,
        basis: Arc<LyndonBasis>,
        mode: LogSignatureMode,
    ) -> Result<Self> {
        basis.check_matches(words.channels(), words.depth())?;
        let extraction = match mode {
            LogSignatureMode::Expand => Extraction::Expand,
            LogSignatureMode::Words => Extraction::Words(basis),
            LogSignatureMode::Brackets => {
                basis.brackets()?;
                Extraction::Brackets(basis)
            }
        };
        Ok(Self { words, extraction })
    }

    /// Which basis this reducer produces
    pub fn mode(&self) -> LogSignatureMode {
        match self.extraction {
            Extraction::Expand => LogSignatureMode::Expand,
            Extraction::Words(_) => LogSignatureMode::Words,
            Extraction::Brackets(_) => LogSignatureMode::Brackets,
        }
    }

    /// Alphabet size D
    #[inline]
    pub fn channels(&self) -> usize {
        self.words.channels()
    }

    /// Truncation depth N
    #[inline]
    pub fn depth(&self) -> usize {
        self.words.depth()
    }

    /// Indexer of the underlying tensor algebra
    #[inline]
    pub fn indexer(&self) -> &Arc<WordIndexer> {
        &self.words
    }

    /// Size of one log-signature
    pub fn output_channels(&self) -> usize {
        match &self.extraction {
            Extraction::Expand => self.words.signature_channels(),
            Extraction::Words(basis) | Extraction::Brackets(basis) => basis.len(),
        }
    }

    /// Log-signature of one signature-layout row
    pub fn reduce_row<T: Element>(&self, signature: &[T], out: &mut [T]) -> Result<()> {
        self.check_row(signature.len(), out.len())?;
        let mut x = vec![T::zero(); self.words.tensor_len()];
        x[0] = T::one();
        x[1..].copy_from_slice(signature);
        let mut log = vec![T::zero(); x.len()];
        log_into(&mut log, &x, &self.words)?;

        match &self.extraction {
            Extraction::Expand => out.copy_from_slice(&log[1..]),
            Extraction::Words(basis) => {
                for (o, word) in out.iter_mut().zip(basis.words()) {
                    *o = log[word.tensor_index() + 1];
                }
            }
            Extraction::Brackets(basis) => {
                let tables = basis.brackets()?;
                for (o, word) in out.iter_mut().zip(basis.words()) {
                    *o = log[word.tensor_index() + 1];
                }
                for u in 0..basis.len() {
                    let cu = out[u];
                    for &(w, a) in tables.triangle(u) {
                        out[w] -= T::from_f64(a as f64) * cu;
                    }
                }
            }
        }
        Ok(())
    }

    /// Accumulate `dL/d signature` for one row given `dL/d logsignature`
    pub fn reduce_row_backward<T: Element>(
        &self,
        grad_output: &[T],
        signature: &[T],
        grad_signature: &mut [T],
    ) -> Result<()> {
        self.check_row(signature.len(), grad_output.len())?;
        if grad_signature.len() != signature.len() {
            return Err(Error::shape_mismatch(&[signature.len()], &[grad_signature.len()]));
        }
        let n = self.words.tensor_len();
        let mut grad_log = vec![T::zero(); n];
        match &self.extraction {
            Extraction::Expand => grad_log[1..].copy_from_slice(grad_output),
            Extraction::Words(basis) => {
                for (&g, word) in grad_output.iter().zip(basis.words()) {
                    grad_log[word.tensor_index() + 1] = g;
                }
            }
            Extraction::Brackets(basis) => {
                let tables = basis.brackets()?;
                let mut g = grad_output.to_vec();
                for u in (0..basis.len()).rev() {
                    let mut acc = g[u];
                    for &(w, a) in tables.triangle(u) {
                        acc -= T::from_f64(a as f64) * g[w];
                    }
                    g[u] = acc;
                }
                for (&gu, word) in g.iter().zip(basis.words()) {
                    grad_log[word.tensor_index() + 1] = gu;
                }
            }
        }

        let mut x = vec![T::zero(); n];
        x[0] = T::one();
        x[1..].copy_from_slice(signature);
        let mut grad_x = vec![T::zero(); n];
        log_backward(&grad_log, &x, &mut grad_x, &self.words)?;
        for (gs, &gx) in grad_signature.iter_mut().zip(&grad_x[1..]) {
            *gs += gx;
        }
        Ok(())
    }

    fn check_row(&self, signature: usize, output: usize) -> Result<()> {
        let expected = (self.words.signature_channels(), self.output_channels());
        if (signature, output) != expected {
            return Err(Error::shape_mismatch(&[expected.0, expected.1], &[signature, output]));
        }
        Ok(())
    }

    fn check_signature<T: Element>(&self, signature: &Tensor<T>) -> Result<()> {
        let sig_len = self.words.signature_channels();
        let last = signature.shape().last().copied();
        if !(2..=3).contains(&signature.ndim()) || last != Some(sig_len) {
            let got = last.unwrap_or(0);
            // a trailing size that matches another pair points at a config mix-up
            return Err(match crate::basis::infer_depth(self.channels(), got) {
                Some(depth) if depth != self.depth() => Error::configuration(
                    self.channels(),
                    self.depth(),
                    format!("signature has {got} channels, which is depth {depth}"),
                ),
                _ => {
                    let mut expected = signature.shape().to_vec();
                    if let Some(l) = expected.last_mut() {
                        *l = sig_len;
                    }
                    Error::shape_mismatch(&expected, signature.shape())
                }
            });
        }
        Ok(())
    }

    /// Log-signatures of `[batch, sig_channels]` or `[batch, stream, sig_channels]`
    pub fn reduce<T: Element>(&self, signature: &Tensor<T>) -> Result<Tensor<T>> {
        self.check_signature(signature)?;
        let sig_len = self.words.signature_channels();
        let out_len = self.output_channels();
        let rows = signature.numel() / sig_len;
        let mut shape = signature.shape().to_vec();
        if let Some(l) = shape.last_mut() {
            *l = out_len;
        }
        let mut out = vec![T::zero(); rows * out_len];
        if rows > 0 {
            for_each_row(&mut out, out_len, |r, row| {
                self.reduce_row(&signature.as_slice()[r * sig_len..(r + 1) * sig_len], row)
            })?;
        }
        Tensor::from_vec(out, &shape)
    }

    /// Gradient of [`reduce`](Self::reduce) with respect to the signature
    pub fn reduce_backward<T: Element>(
        &self,
        grad_output: &Tensor<T>,
        signature: &Tensor<T>,
    ) -> Result<Tensor<T>> {
        self.check_signature(signature)?;
        let sig_len = self.words.signature_channels();
        let out_len = self.output_channels();
        let mut expected = signature.shape().to_vec();
        if let Some(l) = expected.last_mut() {
            *l = out_len;
        }
        grad_output.expect_shape(&expected)?;

        let rows = signature.numel() / sig_len;
        let mut grad = vec![T::zero(); signature.numel()];
        if rows > 0 {
            for_each_row(&mut grad, sig_len, |r, row| {
                self.reduce_row_backward(
                    &grad_output.as_slice()[r * out_len..(r + 1) * out_len],
                    &signature.as_slice()[r * sig_len..(r + 1) * sig_len],
                    row,
                )
            })?;
        }
        Tensor::from_vec(grad, signature.shape())
    }
}
