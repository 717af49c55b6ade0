//! Core Tensor type

use super::{Shape, TensorId};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// N-dimensional array of `f32`/`f64` in contiguous row-major order
///
/// `Tensor` consists of:
/// - **Storage**: reference-counted element buffer, shared between clones
/// - **Shape**: dimensions of the array
/// - **ID**: process-unique identifier used by the autograd graph
///
/// Tensors are immutable once built. Kernels read them through
/// [`Tensor::as_slice`] and produce new tensors with [`Tensor::from_vec`].
///
/// # Example
///
/// ```
/// use sigr::tensor::Tensor;
///
/// // One path with three two-dimensional points: [batch, stream, channels]
/// let path = Tensor::<f64>::from_slice(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0], &[1, 3, 2]);
/// assert_eq!(path.shape(), &[1, 3, 2]);
/// ```
pub struct Tensor<T: Element> {
    /// Unique ID for autograd tracking
    id: TensorId,
    /// Element buffer
    data: Arc<[T]>,
    /// Dimensions
    shape: Shape,
}

impl<T: Element> Tensor<T> {
    /// Create a tensor from a slice of data
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of the `shape` dimensions.
    /// For a fallible alternative, use [`Self::try_from_slice`].
    pub fn from_slice(data: &[T], shape: &[usize]) -> Self {
        Self::try_from_slice(data, shape).expect("Tensor::from_slice failed")
    }

    /// Create a tensor from a slice of data (fallible version)
    ///
    /// Returns `ShapeMismatch` if `data.len()` does not equal the product of the
    /// `shape` dimensions.
    pub fn try_from_slice(data: &[T], shape: &[usize]) -> Result<Self> {
        Self::from_vec(data.to_vec(), shape)
    }

    /// Create a tensor that takes ownership of `data`
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let shape = Shape::from(shape);
        if data.len() != shape.numel() {
            return Err(Error::shape_mismatch(&shape, &[data.len()]));
        }
        Ok(Self {
            id: TensorId::new(),
            data: data.into(),
            shape,
        })
    }

    /// Create a tensor filled with zeros
    pub fn zeros(shape: &[usize]) -> Self {
        let shape = Shape::from(shape);
        Self {
            id: TensorId::new(),
            data: vec![T::zero(); shape.numel()].into(),
            shape,
        }
    }

    /// Get the tensor ID
    #[inline]
    pub fn id(&self) -> TensorId {
        self.id
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Size of dimension `index`
    pub fn dim(&self, index: usize) -> Result<usize> {
        self.shape
            .get(index)
            .copied()
            .ok_or_else(|| Error::invalid_argument("dim", format!(
                "dimension {index} out of range for tensor with {} dimensions",
                self.ndim()
            )))
    }

    /// Element type of the tensor
    #[inline]
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Borrow the underlying elements in row-major order
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Copy the elements out into a `Vec`
    pub fn to_vec(&self) -> Vec<T> {
        self.data.to_vec()
    }

    /// Reinterpret the same storage under a different shape
    ///
    /// The result shares storage with `self` but gets a fresh ID.
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        let new_shape = Shape::from(shape);
        if new_shape.numel() != self.numel() {
            return Err(Error::shape_mismatch(&new_shape, &self.shape));
        }
        Ok(Self {
            id: TensorId::new(),
            data: Arc::clone(&self.data),
            shape: new_shape,
        })
    }

    /// Elementwise sum of two tensors of the same shape
    pub fn add(&self, other: &Self) -> Result<Self> {
        if self.shape != other.shape {
            return Err(Error::shape_mismatch(&self.shape, &other.shape));
        }
        let data: Vec<T> = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| a + b)
            .collect();
        Self::from_vec(data, &self.shape)
    }

    /// Check that the tensor has exactly `expected` as its shape
    pub(crate) fn expect_shape(&self, expected: &[usize]) -> Result<()> {
        if self.shape() != expected {
            return Err(Error::shape_mismatch(expected, self.shape()));
        }
        Ok(())
    }
}

impl<T: Element> Clone for Tensor<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            data: Arc::clone(&self.data),
            shape: self.shape.clone(),
        }
    }
}

impl<T: Element> fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("id", &self.id)
            .field("shape", &self.shape)
            .field("dtype", &T::DTYPE)
            .finish()
    }
}
