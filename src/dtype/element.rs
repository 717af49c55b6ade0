//! Element trait for mapping Rust types to DType

use super::DType;
use num_traits::Float;
use std::fmt::Debug;
use std::iter::Sum;
use std::ops::{AddAssign, MulAssign, SubAssign};

/// Trait for types that can be elements of a tensor
///
/// Connects Rust's type system to sigr's runtime dtype tag. Implemented for
/// `f32` and `f64`.
///
/// # Bounds
/// - `Float` - the arithmetic the tensor-algebra kernels need
/// - `AddAssign + SubAssign + MulAssign` - in-place accumulation in the kernels
/// - `Send + Sync + 'static` - batches are processed on worker threads
pub trait Element:
    Float + AddAssign + SubAssign + MulAssign + Sum + Debug + Default + Send + Sync + 'static
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert from f64 to this type
    fn from_f64(v: f64) -> Self;

    /// Convert a count (factorial divisors, series coefficients) to this type
    #[inline]
    fn from_usize(v: usize) -> Self {
        Self::from_f64(v as f64)
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}
