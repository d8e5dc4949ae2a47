//! Dense kernels for posterior-weighted moment accumulation.
//!
//! These routines implement the two matrix products at the heart of the
//! expectation step: the posterior matrix transposed (K×T) times the
//! observation sequence (T×D), and the same product against the elementwise
//! square of the sequence. Inputs are stored as `f32`; all accumulation is
//! carried in `f64` and added into caller-owned output buffers.
//!
//! Output-buffer contract: the caller pre-allocates the output at exactly the
//! product shape, the kernel adds into it (never overwrites), and input and
//! output cannot alias because the output is an exclusive borrow. Dimension
//! violations are fatal assertions, not recoverable errors.

use crate::matrix::FlatMatrix;

/// Accumulates `out += Aᵀ · B`.
///
/// `a` is T×K, `b` is T×D, `out` is K×D. Products are formed in `f64` so
/// that long sequences do not lose low-order contributions to `f32`
/// cancellation.
pub fn add_transpose_product(a: &FlatMatrix<f32>, b: &FlatMatrix<f32>, out: &mut FlatMatrix<f64>) {
    assert_eq!(a.rows, b.rows, "transpose product: row counts differ");
    assert_eq!(a.cols, out.rows, "transpose product: output rows != A columns");
    assert_eq!(b.cols, out.cols, "transpose product: output cols != B columns");

    // t-outer ordering keeps both input rows and the touched output row
    // sequential in memory.
    for t in 0..a.rows {
        let weights = a.row(t);
        let obs = b.row(t);
        for (k, &w) in weights.iter().enumerate() {
            let w = w as f64;
            if w == 0.0 {
                continue;
            }
            let out_row = out.row_mut(k);
            for (f, &x) in obs.iter().enumerate() {
                out_row[f] += w * x as f64;
            }
        }
    }
}

/// Returns the elementwise square of a matrix.
///
/// Every element of the T×D input is squared; the result has the same shape.
pub fn square_elements(m: &FlatMatrix<f32>) -> FlatMatrix<f32> {
    let mut out = FlatMatrix::<f32>::zeros(m.rows, m.cols);
    for (dst, &src) in out.data.iter_mut().zip(m.data.iter()) {
        *dst = src * src;
    }
    out
}

/// Accumulates per-column sums: `out[k] += Σ_t a[t][k]`.
///
/// Used to fold the posterior matrix (T×K) into per-state occupancy counts.
pub fn add_column_sums(a: &FlatMatrix<f32>, out: &mut [f64]) {
    assert_eq!(a.cols, out.len(), "column sums: output length != columns");
    for t in 0..a.rows {
        for (k, &v) in a.row(t).iter().enumerate() {
            out[k] += v as f64;
        }
    }
}
