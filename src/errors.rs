//! Error types and validation functions for Gaussian HMM training.
//!
//! This module provides error handling for model construction and the
//! expectation-step pipeline, including shape validation for parameter
//! matrices and probability vectors.

use thiserror::Error;

use crate::matrix::FlatMatrix;

/// Error types for Gaussian HMM expectation-step operations.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum GaussianHmmError {
    /// A parameter matrix does not match the declared model dimensions.
    #[error("Shape mismatch: {parameter} is {actual_rows}x{actual_cols}, expected {expected_rows}x{expected_cols}")]
    ShapeMismatch {
        /// Name of the offending parameter
        parameter: &'static str,
        /// Expected number of rows
        expected_rows: usize,
        /// Expected number of columns
        expected_cols: usize,
        /// Actual number of rows
        actual_rows: usize,
        /// Actual number of columns
        actual_cols: usize,
    },

    /// Insufficient data for the requested computation.
    #[error("Insufficient data: need at least {required} frames, got {actual}")]
    InsufficientData {
        /// Minimum required observation frames
        required: usize,
        /// Actual number of observation frames provided
        actual: usize,
    },

    /// Invalid parameter value.
    #[error("Invalid parameter: {parameter} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value provided
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// Numerical computation error due to instability or degeneracy.
    #[error("Numerical computation failed: {reason}")]
    NumericalError {
        /// Detailed reason for numerical failure
        reason: String,
        /// Operation that failed
        operation: Option<String>,
    },
}

/// Result type for Gaussian HMM operations.
pub type HmmResult<T> = Result<T, GaussianHmmError>;

/// Validates that a matrix has the declared shape.
///
/// # Arguments
/// * `matrix` - Parameter matrix to check
/// * `rows` - Expected number of rows
/// * `cols` - Expected number of columns
/// * `parameter` - Name of the parameter for error reporting
///
/// # Returns
/// * `Ok(())` if the shape matches
/// * `Err(GaussianHmmError::ShapeMismatch)` otherwise
pub fn validate_matrix_shape(
    matrix: &FlatMatrix<f64>,
    rows: usize,
    cols: usize,
    parameter: &'static str,
) -> HmmResult<()> {
    if matrix.rows != rows || matrix.cols != cols {
        return Err(GaussianHmmError::ShapeMismatch {
            parameter,
            expected_rows: rows,
            expected_cols: cols,
            actual_rows: matrix.rows,
            actual_cols: matrix.cols,
        });
    }
    Ok(())
}

/// Validates that a probability vector has the declared length and that
/// every entry lies in [0, 1].
pub fn validate_probability_vector(
    probs: &[f64],
    len: usize,
    parameter: &'static str,
) -> HmmResult<()> {
    if probs.len() != len {
        return Err(GaussianHmmError::ShapeMismatch {
            parameter,
            expected_rows: len,
            expected_cols: 1,
            actual_rows: probs.len(),
            actual_cols: 1,
        });
    }
    for &p in probs {
        if !(0.0..=1.0).contains(&p) {
            return Err(GaussianHmmError::InvalidParameter {
                parameter: parameter.to_string(),
                value: p,
                constraint: "probability in [0, 1]".to_string(),
            });
        }
    }
    Ok(())
}
