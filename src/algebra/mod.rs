//! Truncated free tensor algebra
//!
//! Elements are dense vectors in the tensor layout of a [`WordIndexer`]: the
//! level-0 scalar first, then levels `1..=N`. The slice kernels in the
//! submodules are what the signature engine runs in its inner loops;
//! [`FreeTensor`] wraps them in a checked, owned API.
//!
//! # Example
//!
//! ```
//! use sigr::algebra::FreeTensor;
//! use sigr::basis::BasisRegistry;
//!
//! let registry = BasisRegistry::new();
//! let words = registry.words(2, 3)?;
//! let e = FreeTensor::<f64>::exponential(words, &[1.0, -0.5])?;
//! let back = e.logarithm()?;
//! assert!((back.level(1)[1] + 0.5).abs() < 1e-12);
//! # Ok::<(), sigr::error::Error>(())
//! ```

mod exp;
mod log;
mod multiply;

pub(crate) use exp::{exp_backward, exp_into};
pub(crate) use log::{log_backward, log_into};
pub(crate) use multiply::{mult_backward, mult_into, mult_left_inplace, mult_right_inplace};

use crate::basis::WordIndexer;
use crate::dtype::Element;
use crate::error::{Error, Result};
use std::sync::Arc;

/// An element of the tensor algebra truncated at depth `N`
#[derive(Debug, Clone)]
pub struct FreeTensor<T: Element> {
    words: Arc<WordIndexer>,
    data: Vec<T>,
}

impl<T: Element> FreeTensor<T> {
    /// The zero element
    pub fn zeros(words: Arc<WordIndexer>) -> Self {
        let data = vec![T::zero(); words.tensor_len()];
        Self { words, data }
    }

    /// The multiplicative unit: scalar 1, every other level 0
    pub fn unit(words: Arc<WordIndexer>) -> Self {
        let mut out = Self::zeros(words);
        out.data[0] = T::one();
        out
    }

    /// Wrap raw tensor-layout data
    pub fn from_vec(words: Arc<WordIndexer>, data: Vec<T>) -> Result<Self> {
        if data.len() != words.tensor_len() {
            return Err(Error::shape_mismatch(&[words.tensor_len()], &[data.len()]));
        }
        Ok(Self { words, data })
    }

    /// Rebuild a group-like element from signature-layout data (levels `1..=N`)
    pub fn from_signature(words: Arc<WordIndexer>, signature: &[T]) -> Result<Self> {
        if signature.len() != words.signature_channels() {
            return Err(Error::shape_mismatch(
                &[words.signature_channels()],
                &[signature.len()],
            ));
        }
        let mut data = Vec::with_capacity(words.tensor_len());
        data.push(T::one());
        data.extend_from_slice(signature);
        Ok(Self { words, data })
    }

    /// An element whose only non-zero level is level 1
    pub fn level_one(words: Arc<WordIndexer>, v: &[T]) -> Result<Self> {
        if v.len() != words.channels() {
            return Err(Error::size_mismatch(
                "level_one",
                words.key(),
                (v.len(), words.depth()),
            ));
        }
        let mut out = Self::zeros(words);
        let range = out.words.level_range(1);
        out.data[range].copy_from_slice(v);
        Ok(out)
    }

    /// `exp(v)` of a displacement vector `v`
    pub fn exponential(words: Arc<WordIndexer>, v: &[T]) -> Result<Self> {
        if v.len() != words.channels() {
            return Err(Error::size_mismatch(
                "exponential",
                words.key(),
                (v.len(), words.depth()),
            ));
        }
        let mut out = Self::zeros(words);
        exp_into(&mut out.data, v, &out.words);
        Ok(out)
    }

    /// Exponential of a level-1-only element
    pub fn exp(&self) -> Result<Self> {
        let level_one = self.words.level_range(1);
        let stray = self
            .data
            .iter()
            .enumerate()
            .any(|(i, &v)| !level_one.contains(&i) && v != T::zero());
        if stray {
            return Err(Error::Domain {
                op: "exponential",
                reason: "input has components outside level 1".into(),
            });
        }
        Self::exponential(Arc::clone(&self.words), &self.data[level_one])
    }

    /// `log(self)`; fails with `Domain` unless the scalar part is exactly 1
    pub fn logarithm(&self) -> Result<Self> {
        let mut out = Self::zeros(Arc::clone(&self.words));
        log_into(&mut out.data, &self.data, &self.words)?;
        Ok(out)
    }

    /// Truncated product `self ⊗ rhs`
    pub fn multiply(&self, rhs: &Self) -> Result<Self> {
        self.words.check_same(&rhs.words, "rhs")?;
        let mut out = Self::zeros(Arc::clone(&self.words));
        mult_into(&mut out.data, &self.data, &rhs.data, &self.words);
        Ok(out)
    }

    /// Gradients of `a ⊗ b` with respect to `a` and `b`
    pub fn multiply_backward(grad: &Self, a: &Self, b: &Self) -> Result<(Self, Self)> {
        grad.words.check_same(&a.words, "a")?;
        grad.words.check_same(&b.words, "b")?;
        let mut grad_a = Self::zeros(Arc::clone(&grad.words));
        let mut grad_b = Self::zeros(Arc::clone(&grad.words));
        mult_backward(
            &grad.data,
            &a.data,
            &b.data,
            &mut grad_a.data,
            &mut grad_b.data,
            &grad.words,
        );
        Ok((grad_a, grad_b))
    }

    /// Gradient of `exp(v)` with respect to the displacement `v`
    pub fn exponential_backward(grad: &Self, v: &[T]) -> Result<Vec<T>> {
        let e = Self::exponential(Arc::clone(&grad.words), v)?;
        let mut scratch = grad.data.clone();
        let mut grad_v = vec![T::zero(); v.len()];
        exp_backward(&mut scratch, v, &e.data, &mut grad_v, &grad.words);
        Ok(grad_v)
    }

    /// Gradient of `log(x)` with respect to `x`
    pub fn logarithm_backward(grad: &Self, x: &Self) -> Result<Self> {
        grad.words.check_same(&x.words, "x")?;
        let mut grad_x = Self::zeros(Arc::clone(&grad.words));
        log_backward(&grad.data, &x.data, &mut grad_x.data, &grad.words)?;
        Ok(grad_x)
    }

    /// Indexer this element was built for
    #[inline]
    pub fn indexer(&self) -> &Arc<WordIndexer> {
        &self.words
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

    /// Full tensor-layout data
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Components of one level
    ///
    /// # Panics
    ///
    /// Panics if `level` exceeds the truncation depth.
    #[inline]
    pub fn level(&self, level: usize) -> &[T] {
        &self.data[self.words.level_range(level)]
    }

    /// Levels `1..=N`, i.e. the signature layout
    #[inline]
    pub fn signature(&self) -> &[T] {
        &self.data[1..]
    }

    /// Consume into raw tensor-layout data
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}
