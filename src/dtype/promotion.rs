//! Type upcast rules for binary operations

use super::DType;

/// Upcast two dtypes to the common dtype a binary operation must produce
///
/// The lattice: integer tags < F32 < F64 < Complex64 < Complex128 <
/// Rational64 < Object, with special rules layered on top:
/// - Any two integer tags upcast to the wider integer tag; mixed
///   signedness lands in a signed tag wide enough for both
/// - An integer tag with a float tag upcasts to that float tag
/// - Real with complex upcasts to the complex tag of matching precision
///   family
///
/// Total, commutative, and idempotent over the closed tag set.
pub fn upcast(lhs: DType, rhs: DType) -> DType {
    use DType::*;

    if lhs == rhs {
        return lhs;
    }

    // Object absorbs everything
    if lhs == Object || rhs == Object {
        return Object;
    }

    // Real with complex lands in the complex tag of matching precision
    // family; the f64-precision reals push Complex64 up to Complex128
    if lhs.is_complex() || rhs.is_complex() {
        return match (lhs, rhs) {
            (Complex128, _) | (_, Complex128) => Complex128,
            (Complex64, F64 | Rational64) | (F64 | Rational64, Complex64) => Complex128,
            _ => Complex64,
        };
    }

    // Exact arithmetic outranks approximate: rational absorbs the reals
    if lhs == Rational64 || rhs == Rational64 {
        return Rational64;
    }

    // Special case: mixing signed and unsigned integers
    // Promote to a signed type wide enough for both operands
    if lhs.is_signed_int() && rhs.is_unsigned_int() {
        return match (lhs, rhs) {
            (I64, _) | (_, U64) => I64,
            (I32, U32) => I64,
            (I32, _) => I32,
            (I16, U32) => I64,
            (I16, U16) => I32,
            (I16, _) => I16,
            (I8, U32) => I64,
            (I8, U16) => I32,
            (I8, U8) => I16,
            _ => I64,
        };
    }
    if rhs.is_signed_int() && lhs.is_unsigned_int() {
        return upcast(rhs, lhs);
    }

    // Promotion priority (higher = wins); covers float vs float, float vs
    // integer, same-signedness integers, and Bool against anything
    let priority = |dt: DType| -> u8 {
        match dt {
            Object => 127,
            Rational64 => 125,
            Complex128 => 120,
            Complex64 => 110,
            F64 => 100,
            F32 => 90,
            I64 => 65,
            U64 => 60,
            I32 => 55,
            U32 => 50,
            I16 => 45,
            U16 => 40,
            I8 => 35,
            U8 => 30,
            Bool => 25,
        }
    };

    if priority(lhs) >= priority(rhs) {
        lhs
    } else {
        rhs
    }
}

/// Check if a dtype can be cast to another with every value preserved
pub fn can_cast_safely(from: DType, to: DType) -> bool {
    use DType::*;

    if from == to {
        return true;
    }

    match (from, to) {
        // Float widening
        (F32, F64) => true,

        // Complex widening
        (Complex64, Complex128) => true,

        // Real floats to complex of at least matching precision
        (F32, Complex64 | Complex128) => true,
        (F64, Complex128) => true,

        // Integers to floats with enough mantissa
        (I8 | U8 | I16 | U16, F32 | F64) => true,
        (I32 | U32, F64) => true,

        // Integers to complex with enough mantissa
        (I8 | U8 | I16 | U16, Complex64 | Complex128) => true,
        (I32 | U32, Complex128) => true,

        // Integers to rational (u64 may exceed the i64 numerator)
        (I8 | U8 | I16 | U16 | I32 | U32 | I64, Rational64) => true,

        // Integer widening
        (I8, I16 | I32 | I64) => true,
        (I16, I32 | I64) => true,
        (I32, I64) => true,
        (U8, U16 | U32 | U64 | I16 | I32 | I64) => true,
        (U16, U32 | U64 | I32 | I64) => true,
        (U32, U64 | I64) => true,

        // Bool to anything numeric
        (Bool, _) if to.is_int() || to.is_float() || to.is_complex() || to.is_rational() => true,

        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DType::*;

    #[test]
    fn test_same_type_upcast() {
        assert_eq!(upcast(F32, F32), F32);
        assert_eq!(upcast(I64, I64), I64);
        assert_eq!(upcast(Rational64, Rational64), Rational64);
    }

    #[test]
    fn test_total_commutative_idempotent() {
        for &a in &DType::ALL {
            assert_eq!(upcast(a, a), a);
            for &b in &DType::ALL {
                assert_eq!(upcast(a, b), upcast(b, a), "upcast({a}, {b})");
            }
        }
    }

    #[test]
    fn test_float_upcast() {
        assert_eq!(upcast(F32, F64), F64);
    }

    #[test]
    fn test_int_float_upcast() {
        // The float tag always wins over integers
        assert_eq!(upcast(I64, F32), F32);
        assert_eq!(upcast(I32, F64), F64);
        assert_eq!(upcast(U8, F32), F32);
    }

    #[test]
    fn test_int_widening() {
        assert_eq!(upcast(I8, I32), I32);
        assert_eq!(upcast(U16, U64), U64);
        assert_eq!(upcast(I16, I64), I64);
    }

    #[test]
    fn test_signed_unsigned_upcast() {
        assert_eq!(upcast(I32, U32), I64);
        assert_eq!(upcast(I16, U16), I32);
        assert_eq!(upcast(I8, U8), I16);
        assert_eq!(upcast(I64, U8), I64);
        assert_eq!(upcast(I8, U32), I64);
        assert_eq!(upcast(U64, I16), I64);
        assert_eq!(upcast(U16, I32), I32);
    }

    #[test]
    fn test_complex_family_upcast() {
        assert_eq!(upcast(Complex64, Complex128), Complex128);
        assert_eq!(upcast(F32, Complex64), Complex64);
        assert_eq!(upcast(F64, Complex64), Complex128);
        assert_eq!(upcast(F64, Complex128), Complex128);
        assert_eq!(upcast(I32, Complex64), Complex64);
        assert_eq!(upcast(Rational64, Complex64), Complex128);
        assert_eq!(upcast(Rational64, Complex128), Complex128);
    }

    #[test]
    fn test_rational_upcast() {
        assert_eq!(upcast(Rational64, F64), Rational64);
        assert_eq!(upcast(Rational64, I8), Rational64);
        assert_eq!(upcast(Rational64, Bool), Rational64);
    }

    #[test]
    fn test_bool_upcast() {
        assert_eq!(upcast(Bool, U8), U8);
        assert_eq!(upcast(Bool, I32), I32);
        assert_eq!(upcast(Bool, F64), F64);
    }

    #[test]
    fn test_object_absorbs() {
        for &a in &DType::ALL {
            assert_eq!(upcast(a, Object), Object);
        }
    }

    #[test]
    fn test_safe_cast() {
        assert!(can_cast_safely(I32, I64));
        assert!(can_cast_safely(F32, F64));
        assert!(can_cast_safely(U8, I32));
        assert!(can_cast_safely(I64, Rational64));
        assert!(can_cast_safely(Complex64, Complex128));
        assert!(!can_cast_safely(I64, I32));
        assert!(!can_cast_safely(F64, F32));
        assert!(!can_cast_safely(I64, F64));
        assert!(!can_cast_safely(U64, Rational64));
        assert!(!can_cast_safely(F64, Object));
    }
}
