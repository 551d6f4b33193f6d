//! Error types for colarray-core.

use crate::scalar::ScalarType;
use thiserror::Error;

/// Result type alias for colarray operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for array storage operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Source and destination arrays carry different scalar type tags.
    #[error("scalar types do not match: destination {dest}, source {src}")]
    ScalarTypeMismatch {
        dest: ScalarType,
        src: ScalarType,
    },

    /// Source and destination arrays have different component counts.
    #[error("component counts do not match: destination {dest}, source {src}")]
    ComponentCountMismatch { dest: usize, src: usize },

    /// A tuple slice does not have the array's component count.
    #[error("tuple has {actual} values, expected {expected}")]
    TupleSizeMismatch { expected: usize, actual: usize },

    /// Component index outside `[0, components)`.
    #[error("component {component} out of range for {components} components")]
    ComponentOutOfRange { component: usize, components: usize },

    /// Growth requested on an array that was marked non-resizeable.
    #[error("array is not resizeable: requested {requested} tuples, holding {current}")]
    NotResizeable { requested: usize, current: usize },

    /// The allocator refused the request; the buffer is left unchanged.
    #[error("failed to allocate {requested} elements")]
    AllocationFailed { requested: usize },

    /// The operation is not available on this array (read-only views).
    #[error("operation `{operation}` is not supported on a read-only array")]
    Unsupported { operation: &'static str },
}

impl Error {
    /// Returns true for errors raised by read-only containers.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
