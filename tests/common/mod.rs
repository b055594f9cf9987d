//! Common test utilities
#![allow(dead_code)]

use numat::matrix::Matrix;

/// Compare two floats within an absolute tolerance
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Assert an f64 matrix matches the expected payload elementwise
pub fn assert_matrix_close(m: &Matrix, expected: &[f64], tol: f64, msg: &str) {
    let data = m.to_vec::<f64>().unwrap();
    assert_allclose_f64(&data, expected, 0.0, tol, msg);
}
