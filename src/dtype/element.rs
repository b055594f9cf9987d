//! Element trait for mapping Rust types to DType, and the Scalar carrier

use super::complex::{Complex64, Complex128};
use super::rational::Rational64;
use super::DType;
use bytemuck::{Pod, Zeroable};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Scalar
// ============================================================================

/// A single untyped matrix element, carried in the widest tag of its family.
///
/// `Scalar` does three jobs: it brings scalar operands into the op layer
/// (where `min_dtype` feeds the upcast rules), it carries scalar results
/// (determinant, trace, norms) out, and it mediates dtype casts so that
/// complex values keep their imaginary part and rational/integer conversions
/// stay exact — an f64 intermediate would destroy both.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Scalar {
    /// Signed integer family
    I64(i64),
    /// Unsigned integer family
    U64(u64),
    /// Float family
    F64(f64),
    /// Complex family
    C128(Complex128),
    /// Rational family
    R64(Rational64),
    /// Boolean
    Bool(bool),
}

impl Scalar {
    /// The narrowest dtype that exactly represents this value.
    ///
    /// Small non-negative integers infer the byte tag, everything else the
    /// narrowest tag of its own family; floats always infer f64 (a float
    /// literal carries no width information).
    pub fn min_dtype(self) -> DType {
        match self {
            Scalar::I64(v) => {
                if (0..=u8::MAX as i64).contains(&v) {
                    DType::U8
                } else if (i8::MIN as i64..=i8::MAX as i64).contains(&v) {
                    DType::I8
                } else if (i16::MIN as i64..=i16::MAX as i64).contains(&v) {
                    DType::I16
                } else if (i32::MIN as i64..=i32::MAX as i64).contains(&v) {
                    DType::I32
                } else {
                    DType::I64
                }
            }
            Scalar::U64(v) => {
                if v <= u8::MAX as u64 {
                    DType::U8
                } else if v <= u16::MAX as u64 {
                    DType::U16
                } else if v <= u32::MAX as u64 {
                    DType::U32
                } else {
                    DType::U64
                }
            }
            Scalar::F64(_) => DType::F64,
            Scalar::C128(_) => DType::Complex128,
            Scalar::R64(_) => DType::Rational64,
            Scalar::Bool(_) => DType::Bool,
        }
    }

    /// Value as f64. Complex values contribute their real part; use the
    /// `C128` variant directly when the imaginary part matters.
    pub fn to_f64(self) -> f64 {
        match self {
            Scalar::I64(v) => v as f64,
            Scalar::U64(v) => v as f64,
            Scalar::F64(v) => v,
            Scalar::C128(z) => z.re,
            Scalar::R64(r) => r.to_f64(),
            Scalar::Bool(b) => b as u8 as f64,
        }
    }

    /// True if the value is exactly zero (both components, for complex)
    pub fn is_zero(self) -> bool {
        match self {
            Scalar::I64(v) => v == 0,
            Scalar::U64(v) => v == 0,
            Scalar::F64(v) => v == 0.0,
            Scalar::C128(z) => z == Complex128::ZERO,
            Scalar::R64(r) => r.numer == 0,
            Scalar::Bool(b) => !b,
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::I64(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::I64(v as i64)
    }
}

impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        Scalar::U64(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::F64(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::F64(v as f64)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<Complex64> for Scalar {
    fn from(z: Complex64) -> Self {
        Scalar::C128(z.into())
    }
}

impl From<Complex128> for Scalar {
    fn from(z: Complex128) -> Self {
        Scalar::C128(z)
    }
}

impl From<Rational64> for Scalar {
    fn from(r: Rational64) -> Self {
        Scalar::R64(r)
    }
}

// ============================================================================
// Element
// ============================================================================

/// Trait for types that can be elements of a matrix
///
/// This trait connects Rust's type system to numat's runtime dtype system.
/// It's implemented for all primitive numeric types plus the crate's
/// complex and rational types.
///
/// # Bounds
/// - `Copy + Clone + Send + Sync + 'static` - Basic trait requirements
/// - `Pod + Zeroable` - Safe memory transmutation (bytemuck)
/// - `Add + Sub + Mul + Div` - Arithmetic operations (Output = Self)
/// - `PartialOrd` - Comparison for min/max operations
///
/// Note: `Neg` is NOT required since unsigned types don't support it.
/// Negation goes through `neg_value`, which wraps for unsigned types.
pub trait Element:
    Copy
    + Clone
    + Send
    + Sync
    + Pod
    + Zeroable
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + PartialOrd
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64 for generic numeric operations
    ///
    /// For complex types this returns the **magnitude** (|z|), not the real
    /// part, consistent with PartialOrd comparing by magnitude. Use
    /// `into_scalar` when the components matter.
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type
    ///
    /// For complex types, this creates a **real number** (imaginary part = 0).
    fn from_f64(v: f64) -> Self;

    /// Widen into the Scalar carrier without losing information
    fn into_scalar(self) -> Scalar;

    /// Narrow from the Scalar carrier, with C-style truncation where the
    /// target cannot represent the value exactly (complex drops its
    /// imaginary part into real targets, rationals truncate toward zero
    /// into integer targets, floats approximate into rational targets)
    fn from_scalar(s: Scalar) -> Self;

    /// Additive inverse; wraps for unsigned integer types
    fn neg_value(self) -> Self;

    /// Raise to a power
    ///
    /// Integer types compute exactly (square-and-multiply, wrapping) for
    /// non-negative exponents and fall back to f64 with cast-back truncation
    /// for negative ones. Floats use `powf`; complex and rational types use
    /// their own power rules.
    fn pow_value(self, rhs: Self) -> Self;

    /// Remainder, truncating toward zero like integer `%`
    ///
    /// Integer divisors must be non-zero; the op layer screens exact dtypes
    /// for zero divisors before any kernel runs.
    fn rem_value(self, rhs: Self) -> Self;

    /// Zero value
    fn zero() -> Self;

    /// One value
    fn one() -> Self;
}

/// Implement Element for the signed integer primitives
macro_rules! impl_element_signed {
    ($($ty:ty => $dtype:expr),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = $dtype;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(v: f64) -> Self {
                    v as $ty
                }

                #[inline]
                fn into_scalar(self) -> Scalar {
                    Scalar::I64(self as i64)
                }

                #[inline]
                fn from_scalar(s: Scalar) -> Self {
                    match s {
                        Scalar::I64(v) => v as $ty,
                        Scalar::U64(v) => v as $ty,
                        Scalar::F64(v) => v as $ty,
                        Scalar::C128(z) => z.re as $ty,
                        Scalar::R64(r) => {
                            if r.denom == 0 { 0 } else { (r.numer / r.denom) as $ty }
                        }
                        Scalar::Bool(b) => b as $ty,
                    }
                }

                #[inline]
                fn neg_value(self) -> Self {
                    self.wrapping_neg()
                }

                #[inline]
                fn pow_value(self, rhs: Self) -> Self {
                    if rhs < 0 {
                        return (self as f64).powf(rhs as f64) as $ty;
                    }
                    let mut base = self;
                    let mut exp = rhs as u64;
                    let mut acc: $ty = 1;
                    while exp > 0 {
                        if exp & 1 == 1 {
                            acc = acc.wrapping_mul(base);
                        }
                        base = base.wrapping_mul(base);
                        exp >>= 1;
                    }
                    acc
                }

                #[inline]
                fn rem_value(self, rhs: Self) -> Self {
                    self.wrapping_rem(rhs)
                }

                #[inline]
                fn zero() -> Self {
                    0
                }

                #[inline]
                fn one() -> Self {
                    1
                }
            }
        )*
    };
}

/// Implement Element for the unsigned integer primitives
macro_rules! impl_element_unsigned {
    ($($ty:ty => $dtype:expr),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = $dtype;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(v: f64) -> Self {
                    v as $ty
                }

                #[inline]
                fn into_scalar(self) -> Scalar {
                    Scalar::U64(self as u64)
                }

                #[inline]
                fn from_scalar(s: Scalar) -> Self {
                    match s {
                        Scalar::I64(v) => v as $ty,
                        Scalar::U64(v) => v as $ty,
                        Scalar::F64(v) => v as $ty,
                        Scalar::C128(z) => z.re as $ty,
                        Scalar::R64(r) => {
                            if r.denom == 0 { 0 } else { (r.numer / r.denom) as $ty }
                        }
                        Scalar::Bool(b) => b as $ty,
                    }
                }

                #[inline]
                fn neg_value(self) -> Self {
                    self.wrapping_neg()
                }

                #[inline]
                fn pow_value(self, rhs: Self) -> Self {
                    let mut base = self;
                    let mut exp = rhs as u64;
                    let mut acc: $ty = 1;
                    while exp > 0 {
                        if exp & 1 == 1 {
                            acc = acc.wrapping_mul(base);
                        }
                        base = base.wrapping_mul(base);
                        exp >>= 1;
                    }
                    acc
                }

                #[inline]
                fn rem_value(self, rhs: Self) -> Self {
                    self.wrapping_rem(rhs)
                }

                #[inline]
                fn zero() -> Self {
                    0
                }

                #[inline]
                fn one() -> Self {
                    1
                }
            }
        )*
    };
}

impl_element_signed!(
    i64 => DType::I64,
    i32 => DType::I32,
    i16 => DType::I16,
    i8 => DType::I8,
);

impl_element_unsigned!(
    u64 => DType::U64,
    u32 => DType::U32,
    u16 => DType::U16,
    u8 => DType::U8,
);

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn into_scalar(self) -> Scalar {
        Scalar::F64(self)
    }

    #[inline]
    fn from_scalar(s: Scalar) -> Self {
        match s {
            Scalar::I64(v) => v as f64,
            Scalar::U64(v) => v as f64,
            Scalar::F64(v) => v,
            Scalar::C128(z) => z.re,
            Scalar::R64(r) => r.to_f64(),
            Scalar::Bool(b) => b as u8 as f64,
        }
    }

    #[inline]
    fn neg_value(self) -> Self {
        -self
    }

    #[inline]
    fn pow_value(self, rhs: Self) -> Self {
        self.powf(rhs)
    }

    #[inline]
    fn rem_value(self, rhs: Self) -> Self {
        self % rhs
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn into_scalar(self) -> Scalar {
        Scalar::F64(self as f64)
    }

    #[inline]
    fn from_scalar(s: Scalar) -> Self {
        f64::from_scalar(s) as f32
    }

    #[inline]
    fn neg_value(self) -> Self {
        -self
    }

    #[inline]
    fn pow_value(self, rhs: Self) -> Self {
        self.powf(rhs)
    }

    #[inline]
    fn rem_value(self, rhs: Self) -> Self {
        self % rhs
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }
}

// ============================================================================
// Complex types
//
// Complex number conversion semantics:
// - to_f64(): Returns magnitude (|z| = sqrt(re² + im²)), consistent with
//   PartialOrd comparing by magnitude. For components, use into_scalar.
// - from_f64(): Creates a real number (im = 0)
// ============================================================================

impl Element for Complex64 {
    const DTYPE: DType = DType::Complex64;

    /// Returns magnitude (|z|) - this is a lossy conversion.
    /// For the components, use `into_scalar` or `.re`/`.im` directly.
    #[inline]
    fn to_f64(self) -> f64 {
        self.magnitude() as f64
    }

    /// Creates a real complex number (im = 0)
    #[inline]
    fn from_f64(v: f64) -> Self {
        Self::new(v as f32, 0.0)
    }

    #[inline]
    fn into_scalar(self) -> Scalar {
        Scalar::C128(self.into())
    }

    #[inline]
    fn from_scalar(s: Scalar) -> Self {
        match s {
            Scalar::C128(z) => z.into(),
            other => Self::new(other.to_f64() as f32, 0.0),
        }
    }

    #[inline]
    fn neg_value(self) -> Self {
        -self
    }

    #[inline]
    fn pow_value(self, rhs: Self) -> Self {
        self.powc(rhs)
    }

    /// Componentwise remainder. The op layer rejects `Rem` for complex
    /// dtypes; this exists only to keep the trait total.
    #[inline]
    fn rem_value(self, rhs: Self) -> Self {
        Self::new(self.re % rhs.re, self.im % rhs.im)
    }

    #[inline]
    fn zero() -> Self {
        Self::ZERO
    }

    #[inline]
    fn one() -> Self {
        Self::ONE
    }
}

impl Element for Complex128 {
    const DTYPE: DType = DType::Complex128;

    /// Returns magnitude (|z|) - this is a lossy conversion.
    /// For the components, use `into_scalar` or `.re`/`.im` directly.
    #[inline]
    fn to_f64(self) -> f64 {
        self.magnitude()
    }

    /// Creates a real complex number (im = 0)
    #[inline]
    fn from_f64(v: f64) -> Self {
        Self::new(v, 0.0)
    }

    #[inline]
    fn into_scalar(self) -> Scalar {
        Scalar::C128(self)
    }

    #[inline]
    fn from_scalar(s: Scalar) -> Self {
        match s {
            Scalar::C128(z) => z,
            other => Self::new(other.to_f64(), 0.0),
        }
    }

    #[inline]
    fn neg_value(self) -> Self {
        -self
    }

    #[inline]
    fn pow_value(self, rhs: Self) -> Self {
        self.powc(rhs)
    }

    /// Componentwise remainder. The op layer rejects `Rem` for complex
    /// dtypes; this exists only to keep the trait total.
    #[inline]
    fn rem_value(self, rhs: Self) -> Self {
        Self::new(self.re % rhs.re, self.im % rhs.im)
    }

    #[inline]
    fn zero() -> Self {
        Self::ZERO
    }

    #[inline]
    fn one() -> Self {
        Self::ONE
    }
}

impl Element for Rational64 {
    const DTYPE: DType = DType::Rational64;

    #[inline]
    fn to_f64(self) -> f64 {
        Rational64::to_f64(self)
    }

    /// Closest bounded-denominator rational to the given float
    #[inline]
    fn from_f64(v: f64) -> Self {
        Self::approx_from_f64(v)
    }

    #[inline]
    fn into_scalar(self) -> Scalar {
        Scalar::R64(self.normalized())
    }

    #[inline]
    fn from_scalar(s: Scalar) -> Self {
        match s {
            Scalar::I64(v) => Self::from_integer(v),
            Scalar::U64(v) => Self::from_integer(v as i64),
            Scalar::F64(v) => Self::approx_from_f64(v),
            Scalar::C128(z) => Self::approx_from_f64(z.re),
            Scalar::R64(r) => r,
            Scalar::Bool(b) => Self::from_integer(b as i64),
        }
    }

    #[inline]
    fn neg_value(self) -> Self {
        -self
    }

    #[inline]
    fn pow_value(self, rhs: Self) -> Self {
        self.pow(rhs)
    }

    /// Remainder truncating toward zero: `self - trunc(self / rhs) * rhs`
    #[inline]
    fn rem_value(self, rhs: Self) -> Self {
        let q = self / rhs;
        let t = if q.denom == 0 { 0 } else { q.numer / q.denom };
        self - Self::from_integer(t) * rhs
    }

    #[inline]
    fn zero() -> Self {
        Self::ZERO
    }

    #[inline]
    fn one() -> Self {
        Self::ONE
    }
}

// Note: bool doesn't implement Pod, so it cannot implement Element directly.
// Boolean matrices use u8 storage, and the dispatch layer maps DType::Bool
// to u8.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_dtype() {
        assert_eq!(f64::DTYPE, DType::F64);
        assert_eq!(f32::DTYPE, DType::F32);
        assert_eq!(i32::DTYPE, DType::I32);
        assert_eq!(u8::DTYPE, DType::U8);
        assert_eq!(Complex64::DTYPE, DType::Complex64);
        assert_eq!(Rational64::DTYPE, DType::Rational64);
    }

    #[test]
    fn test_element_conversions() {
        assert_eq!(f32::from_f64(2.5).to_f64(), 2.5f32 as f64);
        assert_eq!(i32::from_f64(42.0), 42);
    }

    #[test]
    fn test_min_dtype() {
        assert_eq!(Scalar::I64(0).min_dtype(), DType::U8);
        assert_eq!(Scalar::I64(255).min_dtype(), DType::U8);
        assert_eq!(Scalar::I64(-1).min_dtype(), DType::I8);
        assert_eq!(Scalar::I64(300).min_dtype(), DType::I16);
        assert_eq!(Scalar::I64(-40_000).min_dtype(), DType::I32);
        assert_eq!(Scalar::I64(1 << 40).min_dtype(), DType::I64);
        assert_eq!(Scalar::U64(70_000).min_dtype(), DType::U32);
        assert_eq!(Scalar::F64(2.5).min_dtype(), DType::F64);
        assert_eq!(
            Scalar::C128(Complex128::I).min_dtype(),
            DType::Complex128
        );
        assert_eq!(
            Scalar::R64(Rational64::new(1, 2)).min_dtype(),
            DType::Rational64
        );
    }

    #[test]
    fn test_scalar_mediated_casts() {
        // Complex keeps its imaginary part across widths
        let z = Complex64::new(1.5, -2.5);
        let widened = Complex128::from_scalar(z.into_scalar());
        assert_eq!(widened, Complex128::new(1.5, -2.5));

        // Complex into a real target takes the real part
        assert_eq!(f64::from_scalar(z.into_scalar()), 1.5);

        // Rational into integer truncates toward zero
        let r = Rational64::new(-7, 2);
        assert_eq!(i32::from_scalar(r.into_scalar()), -3);

        // Integer into rational is exact
        assert_eq!(
            Rational64::from_scalar(Scalar::I64(9)),
            Rational64::from_integer(9)
        );

        // Large i64 survives an integer-to-integer cast exactly
        let big = (1i64 << 60) + 7;
        assert_eq!(i64::from_scalar(big.into_scalar()), big);
    }

    #[test]
    fn test_neg_value() {
        assert_eq!(5i32.neg_value(), -5);
        assert_eq!(5u8.neg_value(), 251);
        assert_eq!(2.5f64.neg_value(), -2.5);
        assert_eq!(
            Complex128::new(1.0, -2.0).neg_value(),
            Complex128::new(-1.0, 2.0)
        );
    }
}
