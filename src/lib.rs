//! # numat
//!
//! **Dtype-dispatched matrices with dense and sparse storage, elementwise
//! math, axis reductions, and a LAPACK-flavored factorization suite.**
//!
//! numat stores a matrix as a shape, a runtime dtype tag, and one of three
//! storage layouts (dense row-major, sorted coordinate list, Yale/CSR).
//! Every operation resolves its working dtype through a single promotion
//! lattice and reaches a typed kernel through one dispatch point, so mixed
//! dtype and mixed storage arguments behave consistently across the whole
//! surface.
//!
//! ## Features
//!
//! - **Dtypes**: integers, floats, `Complex64`/`Complex128`, `Rational64`,
//!   and Bool under one promotion lattice
//! - **Storage**: dense, coordinate list, and Yale layouts with lossless
//!   conversion; unstored sparse positions read as zero
//! - **Elementwise ops**: arithmetic, comparisons, transcendentals,
//!   rounding, and two-argument real math
//! - **Reductions**: sum, mean, min, max, variance, std along any axis
//! - **Linear algebra**: LU, Cholesky, inversion, determinant, solve,
//!   matrix power, Kronecker product, Hessenberg reduction, Jacobi SVD
//! - **Statistics**: column covariance and Pearson correlation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use numat::prelude::*;
//!
//! let a = Matrix::from_slice(&[3.0, 1.0, 1.0, 2.0], &[2, 2]);
//! let b = Matrix::from_slice(&[9.0, 8.0], &[2, 1]);
//!
//! let x = a.solve(&b)?;
//! let det = a.det()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded kernels for large dense operands

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod dtype;
pub mod error;
pub mod linalg;
pub mod matrix;
pub mod ops;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Scalar, StorageKind};
    pub use crate::error::{Error, Result};
    pub use crate::linalg::{Convention, Denominator, Triangle};
    pub use crate::matrix::Matrix;
    pub use crate::ops::{ArgOrder, CompareOp};
}
