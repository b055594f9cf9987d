//! Rational number type for exact matrix arithmetic
//!
//! This module provides `Rational64`, an i64 numerator/denominator pair that
//! is bytemuck-compatible for zero-copy buffer views and implements the
//! Element trait for matrix operations.
//!
//! # Normalization
//!
//! Every constructed value is normalized: the fraction is reduced by the gcd
//! and the denominator is strictly positive. A zeroed buffer reads as the
//! value 0 (`to_f64` and `normalized` treat a zero denominator as 0), but
//! arithmetic requires normalized inputs; buffer initialization fills
//! rational storage with `Rational64::ZERO`.
//!
//! # Overflow
//!
//! Arithmetic is computed in i128 and reduced before narrowing back to i64.
//! A result whose reduced form still does not fit in i64 falls back to the
//! closest f64-derived approximation rather than wrapping.

use bytemuck::{Pod, Zeroable};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Largest denominator used when approximating an f64
const APPROX_DENOM_LIMIT: i64 = 1_000_000_000;

/// 128-bit rational number (i64 numerator and denominator)
///
/// Memory layout: Rational64 is i64 × 2, numerator then denominator.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Rational64 {
    /// Numerator, carries the sign
    pub numer: i64,
    /// Denominator, always positive in normalized form
    pub denom: i64,
}

const fn gcd_i128(mut a: i128, mut b: i128) -> i128 {
    if a < 0 {
        a = -a;
    }
    if b < 0 {
        b = -b;
    }
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Reduce an i128 fraction and narrow it to a Rational64, approximating
/// through f64 when the reduced form does not fit.
fn reduce(numer: i128, denom: i128) -> Rational64 {
    if denom == 0 {
        return Rational64::ZERO;
    }
    if numer == 0 {
        return Rational64::ZERO;
    }
    let g = gcd_i128(numer, denom);
    let mut n = numer / g;
    let mut d = denom / g;
    if d < 0 {
        n = -n;
        d = -d;
    }
    if n >= i64::MIN as i128 && n <= i64::MAX as i128 && d <= i64::MAX as i128 {
        Rational64 {
            numer: n as i64,
            denom: d as i64,
        }
    } else {
        Rational64::approx_from_f64(n as f64 / d as f64)
    }
}

impl Rational64 {
    /// Zero
    pub const ZERO: Self = Self { numer: 0, denom: 1 };

    /// One
    pub const ONE: Self = Self { numer: 1, denom: 1 };

    /// Create a new rational number, reduced and sign-normalized
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero, like integer division.
    #[inline]
    pub fn new(numer: i64, denom: i64) -> Self {
        assert!(denom != 0, "Rational64 denominator must be nonzero");
        reduce(numer as i128, denom as i128)
    }

    /// Create a rational from an integer
    #[inline]
    pub const fn from_integer(n: i64) -> Self {
        Self { numer: n, denom: 1 }
    }

    /// Re-normalize a possibly raw value; a zero denominator reads as 0
    #[inline]
    pub fn normalized(self) -> Self {
        reduce(self.numer as i128, self.denom as i128)
    }

    /// Value as f64; a zero denominator reads as 0
    #[inline]
    pub fn to_f64(self) -> f64 {
        if self.denom == 0 {
            0.0
        } else {
            self.numer as f64 / self.denom as f64
        }
    }

    /// Closest rational with denominator bounded by 10^9, by continued
    /// fraction expansion. Non-finite input maps to 0.
    pub fn approx_from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ZERO;
        }
        if value == 0.0 {
            return Self::ZERO;
        }
        let negative = value < 0.0;
        let mut x = value.abs();
        // Convergents h/k of the continued fraction of x
        let (mut h0, mut k0, mut h1, mut k1) = (0i64, 1i64, 1i64, 0i64);
        for _ in 0..40 {
            let a = x.floor();
            if a > i64::MAX as f64 {
                break;
            }
            let a_int = a as i64;
            let h2 = match a_int.checked_mul(h1).and_then(|v| v.checked_add(h0)) {
                Some(v) => v,
                None => break,
            };
            let k2 = match a_int.checked_mul(k1).and_then(|v| v.checked_add(k0)) {
                Some(v) => v,
                None => break,
            };
            if k2 > APPROX_DENOM_LIMIT {
                break;
            }
            h0 = h1;
            k0 = k1;
            h1 = h2;
            k1 = k2;
            let frac = x - a;
            if frac < 1.0e-12 {
                break;
            }
            x = 1.0 / frac;
        }
        if k1 == 0 {
            return Self::ZERO;
        }
        let numer = if negative { -h1 } else { h1 };
        Self { numer, denom: k1 }
    }

    /// Absolute value
    #[inline]
    pub fn abs(self) -> Self {
        Self {
            numer: self.numer.abs(),
            denom: self.denom,
        }
    }

    /// Largest integer not greater than the value
    #[inline]
    pub fn floor(self) -> i64 {
        if self.denom == 0 {
            0
        } else {
            self.numer.div_euclid(self.denom)
        }
    }

    /// Smallest integer not less than the value
    #[inline]
    pub fn ceil(self) -> i64 {
        if self.denom == 0 {
            0
        } else {
            -(-self.numer).div_euclid(self.denom)
        }
    }

    /// Nearest integer, half away from zero
    pub fn round(self) -> i64 {
        if self.denom == 0 {
            return 0;
        }
        let n = self.numer as i128;
        let d = self.denom as i128;
        let doubled = if n >= 0 { 2 * n + d } else { 2 * n - d };
        (doubled / (2 * d)) as i64
    }

    /// Rational power: exact for integer exponents, through f64 otherwise
    pub fn pow(self, rhs: Self) -> Self {
        if rhs.denom == 1 && rhs.numer != i64::MIN {
            let mut exp = rhs.numer;
            if exp == 0 {
                return Self::ONE;
            }
            let base = if exp < 0 {
                if self.numer == 0 {
                    return Self::ZERO;
                }
                exp = -exp;
                reduce(self.denom as i128, self.numer as i128)
            } else {
                self
            };
            let mut acc = Self::ONE;
            let mut sq = base;
            while exp > 0 {
                if exp & 1 == 1 {
                    acc = acc * sq;
                }
                sq = sq * sq;
                exp >>= 1;
            }
            acc
        } else {
            Self::approx_from_f64(self.to_f64().powf(rhs.to_f64()))
        }
    }
}

impl Default for Rational64 {
    #[inline]
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Rational64 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let (an, ad) = (self.numer as i128, self.denom as i128);
        let (bn, bd) = (rhs.numer as i128, rhs.denom as i128);
        reduce(an * bd + bn * ad, ad * bd)
    }
}

impl Sub for Rational64 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let (an, ad) = (self.numer as i128, self.denom as i128);
        let (bn, bd) = (rhs.numer as i128, rhs.denom as i128);
        reduce(an * bd - bn * ad, ad * bd)
    }
}

impl Mul for Rational64 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        reduce(
            self.numer as i128 * rhs.numer as i128,
            self.denom as i128 * rhs.denom as i128,
        )
    }
}

impl Div for Rational64 {
    type Output = Self;

    /// Rational division
    ///
    /// # Panics
    ///
    /// Panics if `rhs` is zero, like integer division.
    #[inline]
    fn div(self, rhs: Self) -> Self {
        assert!(rhs.numer != 0, "Rational64 division by zero");
        reduce(
            self.numer as i128 * rhs.denom as i128,
            self.denom as i128 * rhs.numer as i128,
        )
    }
}

impl Neg for Rational64 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            numer: -self.numer,
            denom: self.denom,
        }
    }
}

impl PartialOrd for Rational64 {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let lhs = self.numer as i128 * other.denom as i128;
        let rhs = other.numer as i128 * self.denom as i128;
        lhs.partial_cmp(&rhs)
    }
}

impl fmt::Display for Rational64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer, self.denom)
    }
}

impl From<i64> for Rational64 {
    #[inline]
    fn from(n: i64) -> Self {
        Self::from_integer(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let r = Rational64::new(4, 8);
        assert_eq!(r.numer, 1);
        assert_eq!(r.denom, 2);

        let neg = Rational64::new(3, -6);
        assert_eq!(neg.numer, -1);
        assert_eq!(neg.denom, 2);

        assert_eq!(Rational64::new(0, 5), Rational64::ZERO);
    }

    #[test]
    fn test_arithmetic() {
        let a = Rational64::new(1, 2);
        let b = Rational64::new(1, 3);

        let sum = a + b;
        assert_eq!(sum, Rational64::new(5, 6));

        let diff = a - b;
        assert_eq!(diff, Rational64::new(1, 6));

        let prod = a * b;
        assert_eq!(prod, Rational64::new(1, 6));

        let quot = a / b;
        assert_eq!(quot, Rational64::new(3, 2));
    }

    #[test]
    fn test_ordering() {
        let a = Rational64::new(1, 2);
        let b = Rational64::new(2, 3);
        assert!(a < b);
        assert!(Rational64::new(-1, 2) < Rational64::ZERO);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(Rational64::new(7, 2).floor(), 3);
        assert_eq!(Rational64::new(-7, 2).floor(), -4);
        assert_eq!(Rational64::new(7, 2).ceil(), 4);
        assert_eq!(Rational64::new(-7, 2).ceil(), -3);
        assert_eq!(Rational64::new(7, 2).round(), 4);
        assert_eq!(Rational64::new(-7, 2).round(), -4);
        assert_eq!(Rational64::new(1, 3).round(), 0);
    }

    #[test]
    fn test_pow() {
        let half = Rational64::new(1, 2);
        assert_eq!(half.pow(Rational64::from_integer(3)), Rational64::new(1, 8));
        assert_eq!(
            half.pow(Rational64::from_integer(-2)),
            Rational64::from_integer(4)
        );
        assert_eq!(half.pow(Rational64::ZERO), Rational64::ONE);
    }

    #[test]
    fn test_approx_from_f64() {
        assert_eq!(Rational64::approx_from_f64(0.5), Rational64::new(1, 2));
        assert_eq!(Rational64::approx_from_f64(-0.25), Rational64::new(-1, 4));
        assert_eq!(Rational64::approx_from_f64(3.0), Rational64::from_integer(3));
        assert_eq!(Rational64::approx_from_f64(f64::NAN), Rational64::ZERO);

        let third = Rational64::approx_from_f64(1.0 / 3.0);
        assert!((third.to_f64() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zeroed_reads_as_zero() {
        let raw: Rational64 = Zeroable::zeroed();
        assert_eq!(raw.to_f64(), 0.0);
        assert_eq!(raw.normalized(), Rational64::ZERO);
    }

    #[test]
    fn test_rational_pod() {
        let r = Rational64::new(3, 4);
        let bytes = bytemuck::bytes_of(&r);
        assert_eq!(bytes.len(), 16);
        let r2: &Rational64 = bytemuck::from_bytes(bytes);
        assert_eq!(*r2, r);
    }
}
