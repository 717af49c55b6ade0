//! Basepoint / inversion / stream policy and input normalization
//!
//! Every option is resolved into a single pre-processing stage with a fixed
//! order:
//! 1. the basepoint (if any) is prepended to each path
//! 2. inversion is applied to the resulting path
//! 3. stream mode decides whether every prefix or only the whole path is kept
//!
//! With inversion and stream mode together, entry `k` is the inverse of the
//! signature of the first `k + 1` segments.

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tensor::Tensor;

/// Point logically prepended to every path before displacements are taken
#[derive(Debug, Clone, Default)]
pub enum Basepoint<T: Element> {
    /// Use the path as given
    #[default]
    Off,
    /// Prepend the origin
    Zero,
    /// Prepend a caller-supplied point per batch entry, shape `[batch, channels]`
    Custom(Tensor<T>),
}

impl<T: Element> Basepoint<T> {
    /// Whether a point is prepended
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// Options shared by the signature and log-signature entry points
#[derive(Debug, Clone, Default)]
pub struct SignatureOptions<T: Element> {
    /// Basepoint handling
    pub basepoint: Basepoint<T>,
    /// Compute the signature of the reversed path (the group inverse)
    pub inverse: bool,
    /// Return one signature per prefix instead of one per path
    pub stream: bool,
}

impl<T: Element> SignatureOptions<T> {
    /// All options off
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the basepoint
    pub fn with_basepoint(mut self, basepoint: Basepoint<T>) -> Self {
        self.basepoint = basepoint;
        self
    }

    /// Enable or disable inversion
    pub fn with_inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    /// Enable or disable stream mode
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// Validated sizes of a batched path after basepoint normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PathDims {
    pub batch: usize,
    /// Points per path as supplied
    pub stream: usize,
    pub channels: usize,
    /// Points per path after the basepoint is prepended
    pub points: usize,
}

impl PathDims {
    /// Number of segments (displacements) per path
    #[inline]
    pub fn segments(&self) -> usize {
        self.points - 1
    }
}

/// Check the path layout and options against each other
pub(crate) fn check_path<T: Element>(
    path: &Tensor<T>,
    depth: usize,
    options: &SignatureOptions<T>,
) -> Result<PathDims> {
    if path.ndim() != 3 {
        return Err(Error::invalid_argument(
            "path",
            format!("expected [batch, stream, channels], got shape {:?}", path.shape()),
        ));
    }
    let (batch, stream, channels) = (path.shape()[0], path.shape()[1], path.shape()[2]);
    if let Basepoint::Custom(point) = &options.basepoint {
        point.expect_shape(&[batch, channels])?;
    }
    let points = stream + usize::from(options.basepoint.is_enabled());
    if points < 2 {
        return Err(Error::configuration(
            channels,
            depth,
            format!("a path needs at least 2 points after basepoint handling, got {points}"),
        ));
    }
    Ok(PathDims {
        batch,
        stream,
        channels,
        points,
    })
}

/// One batch entry of a path, with the basepoint folded in
pub(crate) struct PathView<'a, T> {
    basepoint: Option<&'a [T]>,
    points: &'a [T],
    channels: usize,
}

impl<'a, T: Element> PathView<'a, T> {
    /// View of entry `b`; `zero` must hold `channels` zeros
    pub fn new(
        path: &'a Tensor<T>,
        dims: &PathDims,
        basepoint: &'a Basepoint<T>,
        zero: &'a [T],
        b: usize,
    ) -> Self {
        let row = dims.stream * dims.channels;
        let points = &path.as_slice()[b * row..(b + 1) * row];
        let basepoint = match basepoint {
            Basepoint::Off => None,
            Basepoint::Zero => Some(zero),
            Basepoint::Custom(point) => {
                Some(&point.as_slice()[b * dims.channels..(b + 1) * dims.channels])
            }
        };
        Self {
            basepoint,
            points,
            channels: dims.channels,
        }
    }

    /// Whether point 0 is the basepoint
    #[inline]
    pub fn has_basepoint(&self) -> bool {
        self.basepoint.is_some()
    }

    /// Point `i` of the normalized path
    #[inline]
    pub fn point(&self, i: usize) -> &[T] {
        match (self.basepoint, i) {
            (Some(origin), 0) => origin,
            (Some(_), i) => &self.points[(i - 1) * self.channels..i * self.channels],
            (None, i) => &self.points[i * self.channels..(i + 1) * self.channels],
        }
    }

    /// Displacement of segment `k` (point `k+1` minus point `k`), negated if asked
    #[inline]
    pub fn displacement(&self, k: usize, negate: bool, out: &mut [T]) {
        let (from, to) = (self.point(k), self.point(k + 1));
        for ((o, &a), &b) in out.iter_mut().zip(from).zip(to) {
            *o = if negate { a - b } else { b - a };
        }
    }
}
