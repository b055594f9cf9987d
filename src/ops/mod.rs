//! Matrix operations
//!
//! The operation layer hangs off [`crate::matrix::Matrix`] as inherent
//! methods, grouped by family:
//!
//! - [`elementwise`]: binary arithmetic (matrix and scalar forms, in-place
//!   variants)
//! - [`compare`]: elementwise comparisons producing Bool matrices
//! - [`unary`]: transcendentals, rounding, negation, absolute value
//! - [`math2`]: two-argument real math functions against a scalar
//! - [`reduce`]: axis reductions over a shared fold
//!
//! Every family resolves its result dtype through
//! [`crate::dtype::upcast`] and reaches its typed kernel through the
//! [`dispatch_dtype!`](crate::dispatch_dtype) macro.

pub mod compare;
pub mod dispatch;
pub mod elementwise;
pub mod math2;
pub mod reduce;
pub mod unary;

pub use compare::CompareOp;
pub use elementwise::ArithOp;
pub use math2::{ArgOrder, Math2Op};
pub use unary::UnaryOp;
