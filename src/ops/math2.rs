//! Two-argument real math functions against a scalar operand
//!
//! These take a matrix and a scalar and evaluate an f64 function at every
//! element; `ArgOrder` picks which side of the function the matrix feeds.
//! Real dtypes only, and the result is always F64. Sparse receivers
//! evaluate stored entries only.

use crate::dispatch_dtype;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::matrix::Matrix;

use super::elementwise::map_stored;

/// Two-argument math function tag
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Math2Op {
    /// Four-quadrant arctangent `atan2(y, x)`
    Atan2,
    /// `x * 2^exp`
    Ldexp,
    /// `sqrt(x^2 + y^2)` without intermediate overflow
    Hypot,
}

impl Math2Op {
    /// Operation name for error reporting
    pub const fn name(self) -> &'static str {
        match self {
            Self::Atan2 => "atan2",
            Self::Ldexp => "ldexp",
            Self::Hypot => "hypot",
        }
    }

    #[inline]
    fn apply(self, first: f64, second: f64) -> f64 {
        match self {
            Self::Atan2 => first.atan2(second),
            Self::Ldexp => first * second.exp2(),
            Self::Hypot => first.hypot(second),
        }
    }
}

/// Which argument position the matrix elements occupy
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArgOrder {
    /// Elements are the first argument, the scalar the second
    MatrixFirst,
    /// The scalar is the first argument, elements the second
    MatrixSecond,
}

impl Matrix {
    /// Evaluate a two-argument math function against a scalar
    pub fn math2(&self, op: Math2Op, value: f64, order: ArgOrder) -> Result<Matrix> {
        let dtype = self.dtype();
        if dtype.is_complex() || dtype.is_rational() {
            return Err(Error::unsupported_dtype(dtype, op.name()));
        }
        dispatch_dtype!(dtype, T => {
            map_stored::<T, f64>(self, DType::F64, |v| {
                let x = v.to_f64();
                match order {
                    ArgOrder::MatrixFirst => op.apply(x, value),
                    ArgOrder::MatrixSecond => op.apply(value, x),
                }
            })
        }, op.name())
    }

    /// Four-quadrant arctangent of every element over `x`
    pub fn atan2(&self, x: f64) -> Result<Matrix> {
        self.math2(Math2Op::Atan2, x, ArgOrder::MatrixFirst)
    }

    /// Scale every element by `2^exp`
    pub fn ldexp(&self, exp: f64) -> Result<Matrix> {
        self.math2(Math2Op::Ldexp, exp, ArgOrder::MatrixFirst)
    }

    /// Hypotenuse of every element and `y`
    pub fn hypot(&self, y: f64) -> Result<Matrix> {
        self.math2(Math2Op::Hypot, y, ArgOrder::MatrixFirst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::Complex128;

    #[test]
    fn test_atan2_both_orders() {
        let a = Matrix::from_slice(&[1.0f64], &[1, 1]);
        let first = a.math2(Math2Op::Atan2, 1.0, ArgOrder::MatrixFirst).unwrap();
        assert!((first.to_vec::<f64>().unwrap()[0] - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        let second = a
            .math2(Math2Op::Atan2, 0.0, ArgOrder::MatrixSecond)
            .unwrap();
        // atan2(0, 1) = 0
        assert_eq!(second.to_vec::<f64>().unwrap(), [0.0]);
    }

    #[test]
    fn test_ldexp_scales_by_power_of_two() {
        let a = Matrix::from_slice(&[3i32, -1], &[1, 2]);
        let r = a.ldexp(4.0).unwrap();
        assert_eq!(r.dtype(), DType::F64);
        assert_eq!(r.to_vec::<f64>().unwrap(), [48.0, -16.0]);
    }

    #[test]
    fn test_hypot() {
        let a = Matrix::from_slice(&[3.0f32], &[1, 1]);
        let r = a.hypot(4.0).unwrap();
        assert_eq!(r.dtype(), DType::F64);
        assert_eq!(r.to_vec::<f64>().unwrap(), [5.0]);
    }

    #[test]
    fn test_rejects_complex() {
        let c = Matrix::from_slice(&[Complex128::ONE], &[1, 1]);
        assert!(matches!(c.atan2(1.0), Err(Error::UnsupportedDType { .. })));
    }
}
