//! Data type system for numat matrices
//!
//! This module provides the `DType` enum representing all supported element types,
//! the `StorageKind` tag for the three storage layouts, type promotion rules, and
//! the `Scalar`/`Element` conversion machinery.

pub mod complex;
mod element;
mod promotion;
pub mod rational;

pub use complex::{Complex64, Complex128};
pub use element::{Element, Scalar};
pub use promotion::{can_cast_safely, upcast};
pub use rational::Rational64;

use std::fmt;

// ============================================================================
// StorageKind
// ============================================================================

/// Storage layout of a matrix, the second half of the (kind, dtype) tag pair
/// that drives operation dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Every position materialized in a contiguous row-major buffer
    Dense,
    /// Sparse, position-keyed sorted coordinate list
    List,
    /// Compressed sparse row ("yale")
    Yale,
}

impl StorageKind {
    /// Short name for display (e.g., "dense")
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::List => "list",
            Self::Yale => "yale",
        }
    }

    /// Returns true for the two sparse layouts
    #[inline]
    pub const fn is_sparse(self) -> bool {
        matches!(self, Self::List | Self::Yale)
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

// ============================================================================
// DType Enum
// ============================================================================

/// Data types supported by numat matrices
///
/// This enum represents the element type of a matrix at runtime.
/// Using an enum (rather than generics) allows:
/// - Mixed-dtype operations resolved through the upcast rules
/// - Runtime type selection
/// - A closed, exhaustively testable tag set
///
/// # Discriminant Values (Serialization Stability)
///
/// The discriminant values are **stable** for serialization purposes:
/// - Floats: 0-9 (F64=0, F32=1)
/// - Signed ints: 10-19 (I64=10, I32=11, I16=12, I8=13)
/// - Unsigned ints: 20-29 (U64=20, U32=21, U16=22, U8=23)
/// - Bool: 30
/// - Complex: 40-49 (Complex64=40, Complex128=41)
/// - Rational: 50
/// - Object: 60
///
/// New types will use reserved ranges. Existing values are NEVER changed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum DType {
    // Floating point types (0-9)
    /// 64-bit floating point
    F64 = 0,
    /// 32-bit floating point
    F32 = 1,

    // Integer types
    /// 64-bit signed integer
    I64 = 10,
    /// 32-bit signed integer
    I32 = 11,
    /// 16-bit signed integer
    I16 = 12,
    /// 8-bit signed integer
    I8 = 13,

    // Unsigned integer types
    /// 64-bit unsigned integer
    U64 = 20,
    /// 32-bit unsigned integer
    U32 = 21,
    /// 16-bit unsigned integer
    U16 = 22,
    /// 8-bit unsigned integer
    U8 = 23,

    /// Boolean type, u8-backed; produced by the comparison ops
    Bool = 30,

    // Complex types
    /// 64-bit complex (two f32: re, im)
    Complex64 = 40,
    /// 128-bit complex (two f64: re, im)
    Complex128 = 41,

    /// 128-bit rational (i64 numerator and denominator, always normalized)
    Rational64 = 50,

    /// Generic/opaque element tag; participates in upcast but has no
    /// physical storage, so every kernel dispatch over it reports an error
    Object = 60,
}

impl DType {
    /// Size of one element in bytes
    ///
    /// Object has no physical representation; its size is reported as 0 so
    /// any buffer sized for it is empty rather than lying about a layout.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::Complex128 | Self::Rational64 => 16,
            Self::F64 | Self::I64 | Self::U64 | Self::Complex64 => 8,
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::I16 | Self::U16 => 2,
            Self::I8 | Self::U8 | Self::Bool => 1,
            Self::Object => 0,
        }
    }

    /// Returns true if this is a floating point type
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F64 | Self::F32)
    }

    /// Returns true if this is a complex number type
    #[inline]
    pub const fn is_complex(self) -> bool {
        matches!(self, Self::Complex64 | Self::Complex128)
    }

    /// Returns the underlying float type for complex types
    /// Returns None for non-complex types
    #[inline]
    pub const fn complex_component_dtype(self) -> Option<Self> {
        match self {
            Self::Complex64 => Some(Self::F32),
            Self::Complex128 => Some(Self::F64),
            _ => None,
        }
    }

    /// Returns true if this is a signed integer type
    #[inline]
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::I64 | Self::I32 | Self::I16 | Self::I8)
    }

    /// Returns true if this is an unsigned integer type
    #[inline]
    pub const fn is_unsigned_int(self) -> bool {
        matches!(self, Self::U64 | Self::U32 | Self::U16 | Self::U8)
    }

    /// Returns true if this is any integer type (signed or unsigned)
    #[inline]
    pub const fn is_int(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    /// Returns true if this is the boolean type
    #[inline]
    pub const fn is_bool(self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Returns true if this is the rational type
    #[inline]
    pub const fn is_rational(self) -> bool {
        matches!(self, Self::Rational64)
    }

    /// Returns true if this type can represent negative values
    #[inline]
    pub const fn is_signed(self) -> bool {
        self.is_float() || self.is_signed_int() || self.is_complex() || self.is_rational()
    }

    /// Returns true if elements of this type can be physically stored
    #[inline]
    pub const fn is_storable(self) -> bool {
        !matches!(self, Self::Object)
    }

    /// The dtype produced by taking the element-wise absolute value:
    /// complex magnitudes land in the real tag of matching precision,
    /// everything else keeps its tag.
    #[inline]
    pub const fn abs_dtype(self) -> Self {
        match self {
            Self::Complex64 => Self::F32,
            Self::Complex128 => Self::F64,
            other => other,
        }
    }

    /// Get the default dtype for floating point operations
    #[inline]
    pub const fn default_float() -> Self {
        Self::F64
    }

    /// Get the default dtype for integer operations
    #[inline]
    pub const fn default_int() -> Self {
        Self::I64
    }

    /// Short name for display (e.g., "f32", "i64")
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::F64 => "f64",
            Self::F32 => "f32",
            Self::I64 => "i64",
            Self::I32 => "i32",
            Self::I16 => "i16",
            Self::I8 => "i8",
            Self::U64 => "u64",
            Self::U32 => "u32",
            Self::U16 => "u16",
            Self::U8 => "u8",
            Self::Bool => "bool",
            Self::Complex64 => "c64",
            Self::Complex128 => "c128",
            Self::Rational64 => "r64",
            Self::Object => "object",
        }
    }

    /// All storable dtypes, in discriminant order
    pub const STORABLE: [DType; 14] = [
        Self::F64,
        Self::F32,
        Self::I64,
        Self::I32,
        Self::I16,
        Self::I8,
        Self::U64,
        Self::U32,
        Self::U16,
        Self::U8,
        Self::Bool,
        Self::Complex64,
        Self::Complex128,
        Self::Rational64,
    ];

    /// All dtypes including Object, in discriminant order
    pub const ALL: [DType; 15] = [
        Self::F64,
        Self::F32,
        Self::I64,
        Self::I32,
        Self::I16,
        Self::I8,
        Self::U64,
        Self::U32,
        Self::U16,
        Self::U8,
        Self::Bool,
        Self::Complex64,
        Self::Complex128,
        Self::Rational64,
        Self::Object,
    ];
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}
