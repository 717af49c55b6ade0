//! CPU execution of batched kernels
//!
//! Paths in a batch never interact, so every batched operation splits its
//! output buffers into per-entry rows and runs one kernel call per row. With
//! the `rayon` feature rows are processed on the global thread pool; the order
//! of work *within* a row (the non-commutative fold) is never changed.

mod batch;

pub(crate) use batch::{for_each_row, for_each_row_pair};
