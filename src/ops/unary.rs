//! Elementwise unary maps: transcendentals, rounding, negation, absolute
//! value
//!
//! Result dtype rules follow the upcast system: the transcendental family
//! lands in `upcast(dtype, F64)` (F64 for every real input) and accepts
//! real dtypes only; floor/ceil send floats and rationals to I64 and leave
//! integer and complex dtypes alone (complex applies componentwise); round
//! and negate keep the dtype; abs lands in `abs_dtype`. Sparse receivers
//! map stored entries only.

use crate::dispatch_dtype;
use crate::dtype::{upcast, Complex128, Complex64, DType, Element, Rational64};
use crate::error::{Error, Result};
use crate::matrix::{Matrix, Store};

use super::elementwise::map_stored;

/// Unary operation tag
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum UnaryOp {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Exp,
    Log,
    Log2,
    Log10,
    Sqrt,
    Cbrt,
    Floor,
    Ceil,
    Round,
    Negate,
    Abs,
}

impl UnaryOp {
    /// Operation name for error reporting
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Asinh => "asinh",
            Self::Acosh => "acosh",
            Self::Atanh => "atanh",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Log2 => "log2",
            Self::Log10 => "log10",
            Self::Sqrt => "sqrt",
            Self::Cbrt => "cbrt",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
            Self::Negate => "negate",
            Self::Abs => "abs",
        }
    }

    /// The f64 function behind the transcendental family
    fn real_fn(self) -> Option<fn(f64) -> f64> {
        Some(match self {
            Self::Sin => f64::sin,
            Self::Cos => f64::cos,
            Self::Tan => f64::tan,
            Self::Asin => f64::asin,
            Self::Acos => f64::acos,
            Self::Atan => f64::atan,
            Self::Sinh => f64::sinh,
            Self::Cosh => f64::cosh,
            Self::Tanh => f64::tanh,
            Self::Asinh => f64::asinh,
            Self::Acosh => f64::acosh,
            Self::Atanh => f64::atanh,
            Self::Exp => f64::exp,
            Self::Log => f64::ln,
            Self::Log2 => f64::log2,
            Self::Log10 => f64::log10,
            Self::Sqrt => f64::sqrt,
            Self::Cbrt => f64::cbrt,
            _ => return None,
        })
    }
}

impl Matrix {
    /// Apply a unary operation, dispatching on the op's result-dtype family
    pub fn unary(&self, op: UnaryOp) -> Result<Matrix> {
        if let Some(f) = op.real_fn() {
            return self.map_real_f64(op.name(), f);
        }
        match op {
            UnaryOp::Floor => self.floor(),
            UnaryOp::Ceil => self.ceil(),
            UnaryOp::Round => self.round_to(None),
            UnaryOp::Negate => self.negate(),
            UnaryOp::Abs => self.abs(),
            _ => unreachable!("transcendentals handled above"),
        }
    }

    /// Elementwise sine
    pub fn sin(&self) -> Result<Matrix> {
        self.unary(UnaryOp::Sin)
    }

    /// Elementwise cosine
    pub fn cos(&self) -> Result<Matrix> {
        self.unary(UnaryOp::Cos)
    }

    /// Elementwise tangent
    pub fn tan(&self) -> Result<Matrix> {
        self.unary(UnaryOp::Tan)
    }

    /// Elementwise natural exponential
    pub fn exp(&self) -> Result<Matrix> {
        self.unary(UnaryOp::Exp)
    }

    /// Elementwise natural logarithm
    pub fn ln(&self) -> Result<Matrix> {
        self.unary(UnaryOp::Log)
    }

    /// Elementwise logarithm with an explicit base
    pub fn log_base(&self, base: f64) -> Result<Matrix> {
        self.map_real_f64("log", move |v| v.log(base))
    }

    /// Elementwise square root
    pub fn sqrt(&self) -> Result<Matrix> {
        self.unary(UnaryOp::Sqrt)
    }

    /// Elementwise cube root
    pub fn cbrt(&self) -> Result<Matrix> {
        self.unary(UnaryOp::Cbrt)
    }

    /// Elementwise floor
    ///
    /// Floats and rationals land in I64; integer dtypes are returned as a
    /// clone; complex dtypes floor componentwise and keep their dtype.
    pub fn floor(&self) -> Result<Matrix> {
        self.round_family(
            "floor",
            |v| v.floor() as i64,
            Rational64::floor,
            f64::floor,
            f32::floor,
        )
    }

    /// Elementwise ceiling, same dtype rules as [`Matrix::floor`]
    pub fn ceil(&self) -> Result<Matrix> {
        self.round_family(
            "ceil",
            |v| v.ceil() as i64,
            Rational64::ceil,
            f64::ceil,
            f32::ceil,
        )
    }

    fn round_family(
        &self,
        op: &'static str,
        float_to_int: impl Fn(f64) -> i64,
        rational_to_int: impl Fn(Rational64) -> i64,
        c128_component: fn(f64) -> f64,
        c64_component: fn(f32) -> f32,
    ) -> Result<Matrix> {
        match self.dtype() {
            DType::F64 => map_stored::<f64, i64>(self, DType::I64, |v| float_to_int(v)),
            DType::F32 => map_stored::<f32, i64>(self, DType::I64, |v| float_to_int(v as f64)),
            DType::Rational64 => {
                map_stored::<Rational64, i64>(self, DType::I64, rational_to_int)
            }
            DType::Complex128 => map_stored::<Complex128, Complex128>(self, DType::Complex128, |z| {
                Complex128::new(c128_component(z.re), c128_component(z.im))
            }),
            DType::Complex64 => map_stored::<Complex64, Complex64>(self, DType::Complex64, |z| {
                Complex64::new(c64_component(z.re), c64_component(z.im))
            }),
            dtype if dtype.is_int() || dtype == DType::Bool => Ok(self.clone()),
            dtype => Err(Error::unsupported_dtype(dtype, op)),
        }
    }

    /// Elementwise rounding, keeping the dtype
    ///
    /// `precision` rounds to that many decimal digits (negative values
    /// round to tens, hundreds, ...); `None` rounds to the nearest
    /// integer. Complex dtypes round componentwise.
    pub fn round_to(&self, precision: Option<i32>) -> Result<Matrix> {
        let factor = 10f64.powi(precision.unwrap_or(0));
        let round1 = move |v: f64| (v * factor).round() / factor;
        match self.dtype() {
            DType::Complex128 => map_stored::<Complex128, Complex128>(self, DType::Complex128, |z| {
                Complex128::new(round1(z.re), round1(z.im))
            }),
            DType::Complex64 => map_stored::<Complex64, Complex64>(self, DType::Complex64, |z| {
                Complex64::new(round1(z.re as f64) as f32, round1(z.im as f64) as f32)
            }),
            dtype if dtype.is_int() || dtype == DType::Bool => Ok(self.clone()),
            dtype => {
                dispatch_dtype!(dtype, T => {
                    map_stored::<T, T>(self, dtype, |v| T::from_f64(round1(v.to_f64())))
                }, "round")
            }
        }
    }

    /// Elementwise additive inverse, keeping the dtype (wrapping for
    /// unsigned integers)
    pub fn negate(&self) -> Result<Matrix> {
        let dtype = self.dtype();
        if dtype == DType::Bool {
            return Err(Error::unsupported_dtype(dtype, "negate"));
        }
        dispatch_dtype!(dtype, T => {
            map_stored::<T, T>(self, dtype, T::neg_value)
        }, "negate")
    }

    /// Negate by move, writing through the receiver's store
    pub fn negate_in_place(mut self) -> Result<Matrix> {
        let dtype = self.dtype();
        if dtype == DType::Bool {
            return Err(Error::unsupported_dtype(dtype, "negate"));
        }
        dispatch_dtype!(dtype, T => {
            let slice = match self.store_mut() {
                Store::Dense(store) => store.as_mut_slice::<T>(),
                Store::List(store) => store.values_mut().as_mut_slice::<T>(),
                Store::Yale(store) => store.values_mut().as_mut_slice::<T>(),
            };
            for v in slice.iter_mut() {
                *v = v.neg_value();
            }
            Ok(self)
        }, "negate")
    }

    /// Elementwise absolute value
    ///
    /// The result dtype is [`DType::abs_dtype`]: complex magnitudes land in
    /// the real tag of matching precision, everything else keeps its tag.
    pub fn abs(&self) -> Result<Matrix> {
        match self.dtype() {
            DType::Complex128 => {
                map_stored::<Complex128, f64>(self, DType::F64, Complex128::magnitude)
            }
            DType::Complex64 => map_stored::<Complex64, f32>(self, DType::F32, Complex64::magnitude),
            dtype => {
                dispatch_dtype!(dtype, T => {
                    map_stored::<T, T>(self, dtype, |v| {
                        if v < T::zero() { v.neg_value() } else { v }
                    })
                }, "abs")
            }
        }
    }

    /// Map every element through an f64 function into an F64 matrix of the
    /// same structure; real dtypes only
    fn map_real_f64(&self, op: &'static str, f: impl Fn(f64) -> f64) -> Result<Matrix> {
        let dtype = self.dtype();
        if dtype.is_complex() || dtype.is_rational() {
            return Err(Error::unsupported_dtype(dtype, op));
        }
        let out_dtype = upcast(dtype, DType::F64);
        dispatch_dtype!(dtype, T => {
            map_stored::<T, f64>(self, out_dtype, |v| f(v.to_f64()))
        }, op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::StorageKind;

    #[test]
    fn test_transcendental_result_dtype() {
        let a = Matrix::from_slice(&[0.0f32, 1.0], &[1, 2]);
        let s = a.sin().unwrap();
        assert_eq!(s.dtype(), DType::F64);
        assert!((s.to_vec::<f64>().unwrap()[1] - 1f64.sin()).abs() < 1e-7);

        let i = Matrix::from_slice(&[0i32, 1], &[1, 2]);
        assert_eq!(i.exp().unwrap().dtype(), DType::F64);
    }

    #[test]
    fn test_transcendental_rejects_complex_and_rational() {
        let c = Matrix::from_slice(&[Complex128::ONE], &[1, 1]);
        assert!(matches!(c.sin(), Err(Error::UnsupportedDType { .. })));
        let r = Matrix::from_slice(&[Rational64::new(1, 2)], &[1, 1]);
        assert!(matches!(r.ln(), Err(Error::UnsupportedDType { .. })));
    }

    #[test]
    fn test_floor_ceil_dtypes() {
        let f = Matrix::from_slice(&[1.7f64, -1.2], &[1, 2]);
        let fl = f.floor().unwrap();
        assert_eq!(fl.dtype(), DType::I64);
        assert_eq!(fl.to_vec::<i64>().unwrap(), [1, -2]);
        assert_eq!(f.ceil().unwrap().to_vec::<i64>().unwrap(), [2, -1]);

        let r = Matrix::from_slice(&[Rational64::new(7, 2)], &[1, 1]);
        assert_eq!(r.floor().unwrap().to_vec::<i64>().unwrap(), [3]);

        let i = Matrix::from_slice(&[5i32], &[1, 1]);
        assert_eq!(i.floor().unwrap().dtype(), DType::I32);

        let z = Matrix::from_slice(&[Complex128::new(1.5, -0.5)], &[1, 1]);
        let zf = z.floor().unwrap();
        assert_eq!(zf.dtype(), DType::Complex128);
        assert_eq!(
            zf.to_vec::<Complex128>().unwrap()[0],
            Complex128::new(1.0, -1.0)
        );
    }

    #[test]
    fn test_round_precision() {
        let a = Matrix::from_slice(&[1.2345f64, 2.675], &[1, 2]);
        let r = a.round_to(Some(2)).unwrap();
        assert_eq!(r.dtype(), DType::F64);
        let v = r.to_vec::<f64>().unwrap();
        assert!((v[0] - 1.23).abs() < 1e-12);

        let whole = a.round_to(None).unwrap();
        assert_eq!(whole.to_vec::<f64>().unwrap(), [1.0, 3.0]);
    }

    #[test]
    fn test_negate_unsigned_wraps() {
        let a = Matrix::from_slice(&[1u8, 0], &[1, 2]);
        let n = a.negate().unwrap();
        assert_eq!(n.to_vec::<u8>().unwrap(), [255, 0]);
    }

    #[test]
    fn test_abs_dtype_mapping() {
        let z = Matrix::from_slice(&[Complex128::new(3.0, 4.0)], &[1, 1]);
        let a = z.abs().unwrap();
        assert_eq!(a.dtype(), DType::F64);
        assert_eq!(a.to_vec::<f64>().unwrap(), [5.0]);

        let i = Matrix::from_slice(&[-3i64, 2], &[1, 2]);
        assert_eq!(i.abs().unwrap().to_vec::<i64>().unwrap(), [3, 2]);
    }

    #[test]
    fn test_sparse_unary_stored_only() {
        let m = Matrix::yale_from_triplets(&[(0usize, 0usize, -2.0f64)], &[2, 2]).unwrap();
        let a = m.abs().unwrap();
        assert_eq!(a.kind(), StorageKind::Yale);
        assert_eq!(a.stored_len(), 1);
        assert_eq!(a.to_vec::<f64>().unwrap(), [2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_log_base() {
        let a = Matrix::from_slice(&[8.0f64, 64.0], &[1, 2]);
        let l = a.log_base(2.0).unwrap();
        let v = l.to_vec::<f64>().unwrap();
        assert!((v[0] - 3.0).abs() < 1e-12 && (v[1] - 6.0).abs() < 1e-12);
    }
}
