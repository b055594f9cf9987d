//! Error types for numat

use crate::dtype::{DType, StorageKind};
use thiserror::Error;

/// Result type alias using numat's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in numat operations
#[derive(Error, Debug)]
pub enum Error {
    /// Shape mismatch in an operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Storage kinds of two operands do not match
    #[error("Storage mismatch: {lhs:?} vs {rhs:?}")]
    StorageMismatch {
        /// Left-hand side storage kind
        lhs: StorageKind,
        /// Right-hand side storage kind
        rhs: StorageKind,
    },

    /// Operation requires a storage kind the receiver does not have
    #[error("Storage kind {kind:?} unsupported for operation '{op}'")]
    StorageUnsupported {
        /// The receiver's storage kind
        kind: StorageKind,
        /// The operation name
        op: &'static str,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// Invalid dimension index
    #[error("Invalid axis {axis} for matrix with {rank} dimensions")]
    InvalidAxis {
        /// The invalid axis
        axis: usize,
        /// Number of dimensions
        rank: usize,
    },

    /// Index out of bounds
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Size of the dimension
        size: usize,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Matrix is singular to working precision
    #[error("Singular matrix in operation '{op}'")]
    SingularMatrix {
        /// The operation name
        op: &'static str,
    },

    /// Matrix is not positive definite
    #[error("Matrix not positive definite in operation '{op}'")]
    NotPositiveDefinite {
        /// The operation name
        op: &'static str,
    },

    /// Integer or rational division by zero
    #[error("Division by zero in operation '{op}'")]
    DivisionByZero {
        /// The operation name
        op: &'static str,
    },

    /// Malformed sparse construction input
    #[error("Invalid sparse data: {reason}")]
    InvalidSparse {
        /// Reason for invalidity
        reason: String,
    },
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create a storage mismatch error
    pub fn storage_mismatch(lhs: StorageKind, rhs: StorageKind) -> Self {
        Self::StorageMismatch { lhs, rhs }
    }

    /// Create a storage unsupported error
    pub fn storage_unsupported(kind: StorageKind, op: &'static str) -> Self {
        Self::StorageUnsupported { kind, op }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Create an invalid sparse data error
    pub fn invalid_sparse(reason: impl Into<String>) -> Self {
        Self::InvalidSparse {
            reason: reason.into(),
        }
    }
}
