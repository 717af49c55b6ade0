//! Interval queries over a batch of paths
//!
//! [`Path`] keeps the signature of every prefix together with its inverse.
//! By Chen's identity the signature over points `[start, end)` is then
//! `S_start^{-1} ⊗ S_{end-1}`, a single multiplication per query.

use super::forward::signature_with;
use super::options::{Basepoint, SignatureOptions};
use crate::algebra::mult_into;
use crate::basis::{BasisRegistry, WordIndexer};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::logsignature::{LogSignatureMode, LogSignatureReducer};
use crate::tensor::Tensor;
use std::sync::Arc;

/// Precomputed prefix signatures of a batch of paths
#[derive(Debug, Clone)]
pub struct Path<T: Element> {
    words: Arc<WordIndexer>,
    batch: usize,
    /// Points per path, basepoint included
    len: usize,
    /// Per batch entry: `[len - 1, sig_channels]` prefix signatures
    prefixes: Vec<Vec<T>>,
    /// Per batch entry: inverses of `prefixes`
    inverse_prefixes: Vec<Vec<T>>,
    /// Per batch entry: most recent point, used to continue on `update`
    last_point: Vec<T>,
}

impl<T: Element> Path<T> {
    /// Build from a `[batch, stream, channels]` path
    pub fn new(
        registry: &BasisRegistry,
        path: &Tensor<T>,
        depth: usize,
        basepoint: Basepoint<T>,
    ) -> Result<Self> {
        let words = registry.words(super::path_channels(path)?, depth)?;
        let options = SignatureOptions::new()
            .with_basepoint(basepoint)
            .with_stream(true);
        let forward = signature_with(&words, path, &options)?;
        let inverse = signature_with(&words, path, &options.clone().with_inverse(true))?;

        let (batch, segments) = (forward.shape()[0], forward.shape()[1]);
        let channels = words.channels();
        let stream = path.shape()[1];
        // the forward pass rejects an empty stream, basepoint or not
        let last_point = (0..batch)
            .flat_map(|b| {
                let start = (b * stream + stream - 1) * channels;
                path.as_slice()[start..start + channels].iter().copied()
            })
            .collect();

        tracing::debug!(batch, points = segments + 1, depth, "built path");
        Ok(Self {
            batch,
            len: segments + 1,
            prefixes: split_rows(&forward, batch),
            inverse_prefixes: split_rows(&inverse, batch),
            last_point,
            words,
        })
    }

    /// Number of points per path (including a basepoint if one was used)
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: a path holds at least two points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Batch size
    #[inline]
    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Path dimension D
    #[inline]
    pub fn channels(&self) -> usize {
        self.words.channels()
    }

    /// Truncation depth N
    #[inline]
    pub fn depth(&self) -> usize {
        self.words.depth()
    }

    /// Size of one signature
    #[inline]
    pub fn signature_channels(&self) -> usize {
        self.words.signature_channels()
    }

    fn check_interval(&self, start: usize, end: usize) -> Result<()> {
        if end > self.len || start >= end || end - start < 2 {
            return Err(Error::invalid_argument(
                "interval",
                format!(
                    "[{start}, {end}) must cover at least 2 of the {} points",
                    self.len
                ),
            ));
        }
        Ok(())
    }

    /// Signature of points `[start, end)`, shape `[batch, sig_channels]`
    pub fn signature(&self, start: usize, end: usize) -> Result<Tensor<T>> {
        self.check_interval(start, end)?;
        let sig_len = self.signature_channels();
        let n = self.words.tensor_len();
        let entry = |k: usize| k * sig_len..(k + 1) * sig_len;

        let mut out = Vec::with_capacity(self.batch * sig_len);
        let (mut lhs, mut rhs) = (vec![T::zero(); n], vec![T::zero(); n]);
        let mut prod = vec![T::zero(); n];
        lhs[0] = T::one();
        rhs[0] = T::one();
        for b in 0..self.batch {
            let tail = &self.prefixes[b][entry(end - 2)];
            if start == 0 {
                out.extend_from_slice(tail);
                continue;
            }
            lhs[1..].copy_from_slice(&self.inverse_prefixes[b][entry(start - 1)]);
            rhs[1..].copy_from_slice(tail);
            mult_into(&mut prod, &lhs, &rhs, &self.words);
            out.extend_from_slice(&prod[1..]);
        }
        Tensor::from_vec(out, &[self.batch, sig_len])
    }

    /// Log-signature of points `[start, end)` in the requested basis
    pub fn logsignature(
        &self,
        registry: &BasisRegistry,
        start: usize,
        end: usize,
        mode: LogSignatureMode,
    ) -> Result<Tensor<T>> {
        let sig = self.signature(start, end)?;
        let reducer = LogSignatureReducer::new(registry, self.channels(), self.depth(), mode)?;
        reducer.reduce(&sig)
    }

    /// Append `[batch, extra, channels]` points to every path
    pub fn update(&mut self, points: &Tensor<T>) -> Result<()> {
        let channels = self.channels();
        if points.ndim() != 3 || points.shape()[0] != self.batch || points.shape()[2] != channels {
            return Err(Error::shape_mismatch(
                &[self.batch, points.shape().get(1).copied().unwrap_or(0), channels],
                points.shape(),
            ));
        }
        let extra = points.shape()[1];
        if extra == 0 {
            return Ok(());
        }

        // continue from the last point so the first new segment is included
        let mut joined = Vec::with_capacity(self.batch * (extra + 1) * channels);
        for b in 0..self.batch {
            joined.extend_from_slice(&self.last_point[b * channels..(b + 1) * channels]);
            let rows = b * extra * channels..(b + 1) * extra * channels;
            joined.extend_from_slice(&points.as_slice()[rows]);
        }
        let joined = Tensor::from_vec(joined, &[self.batch, extra + 1, channels])?;
        let options = SignatureOptions::new().with_stream(true);
        let forward = signature_with(&self.words, &joined, &options)?;
        let inverse = signature_with(&self.words, &joined, &options.with_inverse(true))?;

        let sig_len = self.signature_channels();
        let n = self.words.tensor_len();
        let last = self.len - 2;
        let (mut old, mut new) = (vec![T::zero(); n], vec![T::zero(); n]);
        let mut prod = vec![T::zero(); n];
        old[0] = T::one();
        new[0] = T::one();
        for b in 0..self.batch {
            let rows = b * extra * sig_len..(b + 1) * extra * sig_len;
            let old_fwd = self.prefixes[b][last * sig_len..(last + 1) * sig_len].to_vec();
            let old_inv = self.inverse_prefixes[b][last * sig_len..(last + 1) * sig_len].to_vec();
            for (fwd, inv) in forward.as_slice()[rows.clone()]
                .chunks_exact(sig_len)
                .zip(inverse.as_slice()[rows].chunks_exact(sig_len))
            {
                old[1..].copy_from_slice(&old_fwd);
                new[1..].copy_from_slice(fwd);
                mult_into(&mut prod, &old, &new, &self.words);
                self.prefixes[b].extend_from_slice(&prod[1..]);

                new[1..].copy_from_slice(inv);
                old[1..].copy_from_slice(&old_inv);
                mult_into(&mut prod, &new, &old, &self.words);
                self.inverse_prefixes[b].extend_from_slice(&prod[1..]);
            }
            let tail = (b * extra + extra - 1) * channels;
            self.last_point[b * channels..(b + 1) * channels]
                .copy_from_slice(&points.as_slice()[tail..tail + channels]);
        }
        self.len += extra;
        tracing::trace!(extra, points = self.len, "extended path");
        Ok(())
    }
}

fn split_rows<T: Element>(t: &Tensor<T>, batch: usize) -> Vec<Vec<T>> {
    if batch == 0 {
        return Vec::new();
    }
    t.as_slice()
        .chunks_exact(t.numel() / batch)
        .map(<[T]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<f64> {
        vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.5, 2.0, -0.5, 1.5]
    }

    fn direct(registry: &BasisRegistry, data: &[f64], n: usize) -> Tensor<f64> {
        let path = Tensor::from_slice(data, &[1, n, 2]);
        crate::signature::signature(registry, &path, 3, &SignatureOptions::new()).unwrap()
    }

    #[test]
    fn test_interval_matches_direct() {
        let registry = BasisRegistry::new();
        let data = points();
        let full = Tensor::from_slice(&data, &[1, 5, 2]);
        let path = Path::new(&registry, &full, 3, Basepoint::Off).unwrap();
        assert_eq!(path.len(), 5);
        for (start, end) in [(0, 5), (1, 4), (2, 5), (3, 5)] {
            let got = path.signature(start, end).unwrap();
            let want = direct(&registry, &data[start * 2..end * 2], end - start);
            for (a, b) in got.as_slice().iter().zip(want.as_slice()) {
                assert!((a - b).abs() < 1e-12, "[{start}, {end})");
            }
        }
        assert!(path.signature(2, 3).is_err());
        assert!(path.signature(0, 6).is_err());
    }

    #[test]
    fn test_update_extends() {
        let registry = BasisRegistry::new();
        let data = points();
        let head = Tensor::from_slice(&data[..6], &[1, 3, 2]);
        let mut path = Path::new(&registry, &head, 3, Basepoint::Off).unwrap();
        path.update(&Tensor::from_slice(&data[6..], &[1, 2, 2])).unwrap();
        assert_eq!(path.len(), 5);
        let got = path.signature(1, 5).unwrap();
        let want = direct(&registry, &data[2..], 4);
        for (a, b) in got.as_slice().iter().zip(want.as_slice()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!(path.update(&Tensor::zeros(&[2, 1, 2])).is_err());
    }

    #[test]
    fn test_single_point_after_basepoint() {
        let registry = BasisRegistry::new();
        let data = points();
        let origin = Tensor::from_slice(&data[..2], &[1, 2]);
        let first = Tensor::from_slice(&data[2..4], &[1, 1, 2]);
        let mut path = Path::new(&registry, &first, 3, Basepoint::Custom(origin.clone())).unwrap();
        assert_eq!(path.len(), 2);
        path.update(&Tensor::from_slice(&data[4..], &[1, 3, 2])).unwrap();
        assert_eq!(path.len(), 5);
        let got = path.signature(0, 5).unwrap();
        let want = direct(&registry, &data, 5);
        for (a, b) in got.as_slice().iter().zip(want.as_slice()) {
            assert!((a - b).abs() < 1e-12);
        }

        let empty = Tensor::<f64>::zeros(&[1, 0, 2]);
        assert!(matches!(
            Path::new(&registry, &empty, 3, Basepoint::Custom(origin)),
            Err(Error::Configuration { .. })
        ));
    }
}
