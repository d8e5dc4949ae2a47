//! Log-space forward-backward recursion.
//!
//! Given one sequence's frame log-likelihoods, the transition matrix, and the
//! start probabilities, this computes the log-domain forward and backward
//! lattices, the total sequence log-likelihood, and the per-frame state
//! posteriors. Everything stays in log space so long sequences cannot
//! underflow; magnitudes grow only linearly with sequence length.

use crate::{
    errors::{
        validate_matrix_shape, validate_probability_vector, GaussianHmmError, HmmResult,
    },
    math_utils::log_sum_exp,
    matrix::FlatMatrix,
};

/// Forward-backward output for one observation sequence.
///
/// The lattices are exact log-domain tables (no per-frame renormalization),
/// so `log_likelihood` equals `log_sum_exp` over the last forward row and
/// downstream consumers can form pairwise posteriors directly from lattice
/// entries.
#[derive(Debug, Clone)]
pub struct LatticePosteriors {
    /// Per-frame state posteriors γ, T×K; every row sums to 1
    pub posteriors: FlatMatrix<f32>,
    /// Log-domain forward lattice α, T×K
    pub fwd_lattice: FlatMatrix<f64>,
    /// Log-domain backward lattice β, T×K
    pub bwd_lattice: FlatMatrix<f64>,
    /// Total sequence log-likelihood ln P(X)
    pub log_likelihood: f64,
}

/// Run the forward-backward recursion over one sequence.
///
/// # Arguments
/// * `frame_log_likelihood` - T×K emission log-likelihoods for the sequence
/// * `transition_matrix` - K×K state transition probabilities
/// * `start_probs` - length-K initial state probabilities
///
/// # Returns
/// * [`LatticePosteriors`] with lattices, posteriors, and log-likelihood
/// * `Err(GaussianHmmError::ShapeMismatch)` on dimension disagreement
/// * `Err(GaussianHmmError::InsufficientData)` for an empty sequence
/// * `Err(GaussianHmmError::NumericalError)` if the sequence log-likelihood
///   is not finite (every state path impossible under the model)
pub fn forward_backward(
    frame_log_likelihood: &FlatMatrix<f32>,
    transition_matrix: &FlatMatrix<f64>,
    start_probs: &[f64],
) -> HmmResult<LatticePosteriors> {
    let k = transition_matrix.rows;
    validate_matrix_shape(transition_matrix, k, k, "transition_matrix")?;
    validate_probability_vector(start_probs, k, "start_probs")?;
    if frame_log_likelihood.cols != k {
        return Err(GaussianHmmError::ShapeMismatch {
            parameter: "frame_log_likelihood",
            expected_rows: frame_log_likelihood.rows,
            expected_cols: k,
            actual_rows: frame_log_likelihood.rows,
            actual_cols: frame_log_likelihood.cols,
        });
    }
    let num_frames = frame_log_likelihood.rows;
    if num_frames == 0 {
        return Err(GaussianHmmError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }

    let mut log_transition = FlatMatrix::zeros(k, k);
    for (dst, &src) in log_transition.data.iter_mut().zip(&transition_matrix.data) {
        *dst = src.ln();
    }

    // Forward pass: α_t(j) = ln Σ_i exp(α_{t-1}(i) + ln A[i][j]) + b_j(t)
    let mut fwd = FlatMatrix::<f64>::zeros(num_frames, k);
    let mut terms = vec![0.0f64; k];
    for j in 0..k {
        fwd.set(
            0,
            j,
            start_probs[j].ln() + frame_log_likelihood.get(0, j) as f64,
        );
    }
    for t in 1..num_frames {
        for j in 0..k {
            for i in 0..k {
                terms[i] = fwd.get(t - 1, i) + log_transition.get(i, j);
            }
            fwd.set(
                t,
                j,
                log_sum_exp(&terms) + frame_log_likelihood.get(t, j) as f64,
            );
        }
    }

    // Backward pass: β_t(i) = ln Σ_j exp(ln A[i][j] + b_j(t+1) + β_{t+1}(j));
    // β_{T-1} = 0.
    let mut bwd = FlatMatrix::<f64>::zeros(num_frames, k);
    for t in (0..num_frames.saturating_sub(1)).rev() {
        for i in 0..k {
            for j in 0..k {
                terms[j] = log_transition.get(i, j)
                    + frame_log_likelihood.get(t + 1, j) as f64
                    + bwd.get(t + 1, j);
            }
            bwd.set(t, i, log_sum_exp(&terms));
        }
    }

    let log_likelihood = log_sum_exp(fwd.row(num_frames - 1));
    if !log_likelihood.is_finite() {
        return Err(GaussianHmmError::NumericalError {
            reason: format!("sequence log-likelihood is {}", log_likelihood),
            operation: Some("forward_backward".to_string()),
        });
    }

    // γ_t(j) = exp(α_t(j) + β_t(j) − ln P(X)), renormalized per row to absorb
    // rounding.
    let mut posteriors = FlatMatrix::<f32>::zeros(num_frames, k);
    for t in 0..num_frames {
        for j in 0..k {
            terms[j] = fwd.get(t, j) + bwd.get(t, j) - log_likelihood;
        }
        let max_log = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = terms.iter().map(|&lg| (lg - max_log).exp()).sum();
        let row = posteriors.row_mut(t);
        for j in 0..k {
            row[j] = ((terms[j] - max_log).exp() / sum) as f32;
        }
    }

    Ok(LatticePosteriors {
        posteriors,
        fwd_lattice: fwd,
        bwd_lattice: bwd,
        log_likelihood,
    })
}
