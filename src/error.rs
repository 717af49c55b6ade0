//! Error types for sigr

use thiserror::Error;

/// Result type alias using sigr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sigr operations
///
/// Every variant carries the `(channels, depth)` pair or operand name needed to
/// diagnose the failure without inspecting internals. Nothing is retried: the
/// kernels are deterministic, so a failure is always a caller-side problem.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid channels/depth or an incompatible combination of options
    #[error("Invalid configuration for (channels={channels}, depth={depth}): {reason}")]
    Configuration {
        /// Path dimension D
        channels: usize,
        /// Truncation depth N
        depth: usize,
        /// What was wrong
        reason: String,
    },

    /// Operands were built for different `(channels, depth)` pairs
    #[error(
        "Size mismatch for '{operand}': expected (channels={}, depth={}), got (channels={}, depth={})",
        .expected.0, .expected.1, .got.0, .got.1
    )]
    SizeMismatch {
        /// Which operand disagreed
        operand: &'static str,
        /// `(channels, depth)` the operation was built for
        expected: (usize, usize),
        /// `(channels, depth)` of the offending operand
        got: (usize, usize),
    },

    /// A value lies outside the domain of an operation
    #[error("Domain error in '{op}': {reason}")]
    Domain {
        /// The operation name
        op: &'static str,
        /// Reason the input is outside the domain
        reason: String,
    },

    /// A table for `(channels, depth)` would exceed the configured size ceiling
    #[error(
        "Capacity exceeded for (channels={channels}, depth={depth}): {resource} exceeds the limit of {limit}"
    )]
    Capacity {
        /// Path dimension D
        channels: usize,
        /// Truncation depth N
        depth: usize,
        /// What outgrew the ceiling
        resource: &'static str,
        /// Configured ceiling
        limit: usize,
    },

    /// Buffer shape does not match what the operation expects
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Basis table could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create a configuration error
    pub fn configuration(channels: usize, depth: usize, reason: impl Into<String>) -> Self {
        Self::Configuration {
            channels,
            depth,
            reason: reason.into(),
        }
    }

    /// Create a size mismatch error
    pub fn size_mismatch(
        operand: &'static str,
        expected: (usize, usize),
        got: (usize, usize),
    ) -> Self {
        Self::SizeMismatch {
            operand,
            expected,
            got,
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = Error::size_mismatch("rhs", (2, 3), (3, 3));
        let msg = format!("{err}");
        assert!(msg.contains("rhs"));
        assert!(msg.contains("channels=2, depth=3"));
        assert!(msg.contains("channels=3, depth=3"));

        let err = Error::configuration(2, 0, "depth must be at least 1");
        assert!(format!("{err}").contains("depth must be at least 1"));

        let err = Error::Capacity {
            channels: 10,
            depth: 12,
            resource: "10^12 scalars per level",
            limit: 1024,
        };
        let msg = format!("{err}");
        assert!(msg.contains("channels=10, depth=12"));
        assert!(msg.contains("10^12 scalars per level"));
    }
}
