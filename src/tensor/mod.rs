//! Tensor types
//!
//! A deliberately small buffer abstraction: contiguous, row-major, reference
//! counted storage of `f32`/`f64` plus a shape. It is the only thing the
//! signature kernels need from a host array library.

mod core;
mod id;
mod shape;

pub use core::Tensor;
pub use id::TensorId;
pub use shape::Shape;
