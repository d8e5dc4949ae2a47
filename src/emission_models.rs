//! Diagonal-covariance Gaussian emission model.
//!
//! Each hidden state emits observations from a multivariate Gaussian whose
//! covariance matrix is diagonal, so the per-frame log-likelihood factors
//! into independent per-feature terms. The model precomputes every term of
//! that factorization that depends only on (state, feature), leaving the
//! O(T·K·D) kernel free of divisions.

use crate::{
    errors::{validate_matrix_shape, HmmResult},
    math_utils::constants,
    matrix::FlatMatrix,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-state diagonal Gaussian parameters with a derived numerical cache.
///
/// The model is immutable after construction: the cache is computed exactly
/// once from the means and variances that produced it, and a parameter
/// update (a new M-step estimate) constructs a new model rather than
/// mutating this one. This is what makes a model reference safely shareable
/// across parallel workers during the expectation step.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiagonalGaussianModel {
    num_states: usize,
    num_features: usize,
    /// Per-state mean vectors, K×D
    means: FlatMatrix<f64>,
    /// Per-state variance vectors, K×D; strictly positive by caller contract
    variances: FlatMatrix<f64>,
    /// Cached ln(σ²), K×D
    log_variances: FlatMatrix<f64>,
    /// Cached μ/σ², K×D
    mean_over_variance: FlatMatrix<f64>,
    /// Cached μ²/σ², K×D
    mean_sq_over_variance: FlatMatrix<f64>,
}

impl DiagonalGaussianModel {
    /// Construct a model from per-state means and variances, both K×D.
    ///
    /// Fails with [`GaussianHmmError::ShapeMismatch`] if either matrix does
    /// not match the declared state and feature counts; nothing is
    /// constructed on failure.
    ///
    /// Variances must be strictly positive. This is a caller contract, not a
    /// runtime check: a zero or negative variance yields non-finite cache
    /// entries that propagate silently through the likelihood kernel (a
    /// collapsed-state signal for the caller to regularize). A warning is
    /// logged when that contract is visibly broken.
    ///
    /// [`GaussianHmmError::ShapeMismatch`]: crate::errors::GaussianHmmError::ShapeMismatch
    pub fn new(
        num_states: usize,
        num_features: usize,
        means: FlatMatrix<f64>,
        variances: FlatMatrix<f64>,
    ) -> HmmResult<Self> {
        validate_matrix_shape(&means, num_states, num_features, "means")?;
        validate_matrix_shape(&variances, num_states, num_features, "variances")?;

        let degenerate = variances
            .data
            .iter()
            .filter(|&&v| v <= constants::MIN_VARIANCE)
            .count();
        if degenerate > 0 {
            log::warn!(
                "{} of {} variances at or below {:.0e}; emission log-likelihoods may be non-finite",
                degenerate,
                variances.data.len(),
                constants::MIN_VARIANCE
            );
        }

        let mut log_variances = FlatMatrix::zeros(num_states, num_features);
        let mut mean_over_variance = FlatMatrix::zeros(num_states, num_features);
        let mut mean_sq_over_variance = FlatMatrix::zeros(num_states, num_features);
        for s in 0..num_states {
            for f in 0..num_features {
                let m = means.get(s, f);
                let v = variances.get(s, f);
                log_variances.set(s, f, v.ln());
                mean_over_variance.set(s, f, m / v);
                mean_sq_over_variance.set(s, f, (m * m) / v);
            }
        }

        Ok(Self {
            num_states,
            num_features,
            means,
            variances,
            log_variances,
            mean_over_variance,
            mean_sq_over_variance,
        })
    }

    /// Number of hidden states K.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Number of observation features D.
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Per-state mean vectors, K×D.
    pub fn means(&self) -> &FlatMatrix<f64> {
        &self.means
    }

    /// Per-state variance vectors, K×D.
    pub fn variances(&self) -> &FlatMatrix<f64> {
        &self.variances
    }

    /// Cached ln(σ²) matrix, K×D.
    pub fn log_variances(&self) -> &FlatMatrix<f64> {
        &self.log_variances
    }

    /// Compute the frame-by-state log-likelihood matrix for one sequence.
    ///
    /// For every frame t and state j this evaluates the algebraic expansion
    /// of the diagonal Gaussian log-density:
    ///
    /// ```text
    /// out[t][j] = -0.5 * ( D·ln(2π) + Σ_f [ μ²/σ² − 2·x·μ/σ² + x²/σ² + ln σ² ] )
    /// ```
    ///
    /// The μ²/σ² and ln σ² terms come from the construction-time cache, and
    /// the cross term reuses μ/σ², so the inner loop carries no divisions
    /// beyond x²/σ². The per-state sum is carried in `f64` and cast to `f32`
    /// only on store; the output matrix is T×K and freshly allocated per
    /// call.
    ///
    /// The sequence must have exactly `num_features` columns; violating that
    /// is a fatal contract failure, not a recoverable error. A zero variance
    /// drives the corresponding entries to `-inf` without branching.
    pub fn emission_log_likelihood(&self, sequence: &FlatMatrix<f32>) -> FlatMatrix<f32> {
        assert_eq!(
            sequence.cols, self.num_features,
            "sequence feature count does not match model"
        );

        let num_frames = sequence.rows;
        let mut out = FlatMatrix::<f32>::zeros(num_frames, self.num_states);
        let d_ln_two_pi = self.num_features as f64 * constants::LN_TWO_PI;

        for t in 0..num_frames {
            let frame = sequence.row(t);
            let out_row = out.row_mut(t);
            for j in 0..self.num_states {
                let msv = self.mean_sq_over_variance.row(j);
                let mov = self.mean_over_variance.row(j);
                let var = self.variances.row(j);
                let logv = self.log_variances.row(j);

                let mut temp = 0.0f64;
                for f in 0..frame.len() {
                    let x = frame[f] as f64;
                    temp += msv[f] - 2.0 * x * mov[f] + (x * x) / var[f] + logv[f];
                }
                out_row[j] = (-0.5 * (d_ln_two_pi + temp)) as f32;
            }
        }
        out
    }
}
