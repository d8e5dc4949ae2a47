//! Flattened row-major matrix storage for observation sequences, posteriors,
//! lattices, and model parameters.
//!
//! A single contiguous buffer keeps the expectation-step kernels
//! cache-friendly. The element type is generic so that bulk per-frame data
//! (observation sequences, frame log-likelihoods, posteriors) can be stored
//! as `f32` to bound memory bandwidth, while model parameters and accumulated
//! statistics stay `f64`.

use crate::errors::{GaussianHmmError, HmmResult};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dense row-major matrix over a flat buffer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlatMatrix<T = f64> {
    /// Single contiguous buffer for all matrix data
    pub data: Vec<T>,
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
}

impl<T: Copy + Default> FlatMatrix<T> {
    /// Create a new matrix with the given dimensions, zero-initialized.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![T::default(); rows * cols],
            rows,
            cols,
        }
    }

    /// Build a matrix from row slices, rejecting ragged or empty input.
    pub fn from_rows(rows: &[Vec<T>]) -> HmmResult<Self> {
        let Some(first) = rows.first() else {
            return Err(GaussianHmmError::ShapeMismatch {
                parameter: "matrix rows",
                expected_rows: 1,
                expected_cols: 1,
                actual_rows: 0,
                actual_cols: 0,
            });
        };
        let cols = first.len();
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(GaussianHmmError::ShapeMismatch {
                    parameter: "matrix rows",
                    expected_rows: rows.len(),
                    expected_cols: cols,
                    actual_rows: i + 1,
                    actual_cols: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// Get element at (row, col)
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col]
    }

    /// Set element at (row, col)
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col] = value;
    }

    /// Borrow one row as a slice.
    #[inline]
    pub fn row(&self, row: usize) -> &[T] {
        debug_assert!(row < self.rows);
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Borrow one row mutably.
    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        debug_assert!(row < self.rows);
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Reset all elements to the default value.
    pub fn clear(&mut self) {
        self.data.fill(T::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_row_major() {
        let mut m = FlatMatrix::<f64>::zeros(2, 3);
        m.set(0, 2, 1.5);
        m.set(1, 0, -2.0);
        assert_eq!(m.get(0, 2), 1.5);
        assert_eq!(m.get(1, 0), -2.0);
        assert_eq!(m.data, vec![0.0, 0.0, 1.5, -2.0, 0.0, 0.0]);
        assert_eq!(m.row(1), &[-2.0, 0.0, 0.0]);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let ok = FlatMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!((ok.rows, ok.cols), (2, 2));

        let ragged = FlatMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(ragged.is_err());

        let empty: Vec<Vec<f64>> = vec![];
        assert!(FlatMatrix::from_rows(&empty).is_err());
    }

    #[test]
    fn clear_zeroes_everything() {
        let mut m = FlatMatrix::<f32>::zeros(2, 2);
        m.set(0, 0, 3.0);
        m.clear();
        assert!(m.data.iter().all(|&x| x == 0.0));
    }
}
