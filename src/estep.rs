//! Expectation-step accumulation pipeline.
//!
//! Accumulation is a two-stage pipeline. The first stage is a
//! [`LatticeAccumulator`] strategy that folds transition-level statistics
//! (transition counts, start counts, total log-likelihood) out of the
//! forward/backward lattices; [`TransitionAccumulator`] is the provided
//! implementation. The second stage, [`StatsAccumulator`], composes a first
//! stage supplied at construction and adds the emission-specific
//! posterior-weighted observation moments on top.
//!
//! One accumulator may serve many sequences, and independently filled
//! [`SufficientStatistics`] values merge associatively, so sequences can be
//! mapped across workers and reduced afterward with no shared mutable state.

use crate::{
    errors::{validate_matrix_shape, validate_probability_vector, HmmResult},
    linear_algebra::{add_column_sums, add_transpose_product, square_elements},
    math_utils::log_sum_exp,
    matrix::FlatMatrix,
    sufficient_stats::SufficientStatistics,
};

/// First accumulation stage: fold lattice-level statistics into `stats`.
///
/// Implementations read the forward/backward lattices (log-domain, T×K) and
/// the frame log-likelihoods for one sequence, and add their contribution
/// into the same [`SufficientStatistics`] value the emission stage writes to.
pub trait LatticeAccumulator {
    /// Add one sequence's lattice statistics into `stats`.
    fn accumulate(
        &self,
        stats: &mut SufficientStatistics,
        sequence: &FlatMatrix<f32>,
        frame_log_likelihood: &FlatMatrix<f32>,
        posteriors: &FlatMatrix<f32>,
        fwd_lattice: &FlatMatrix<f64>,
        bwd_lattice: &FlatMatrix<f64>,
    );
}

/// Accumulates transition counts, start counts, and total log-likelihood.
///
/// Owns a read-only copy of the transition matrix and start probabilities,
/// with the log-transition matrix cached at construction (the same
/// precompute-once pattern as the emission cache). Expected transition
/// counts follow the standard Baum-Welch pairwise posterior:
///
/// ```text
/// ξ_t(i,j) = exp( α_t(i) + ln A[i][j] + b_j(t+1) + β_{t+1}(j) − ln P(X) )
/// ```
///
/// summed over t, where the lattices are exact log-domain forward/backward
/// tables so that Σ_{i,j} ξ_t(i,j) = 1 without per-frame renormalization.
#[derive(Debug, Clone)]
pub struct TransitionAccumulator {
    num_states: usize,
    log_transition: FlatMatrix<f64>,
    start_probs: Vec<f64>,
}

impl TransitionAccumulator {
    /// Construct from a K×K transition matrix and length-K start
    /// probabilities; fails with a shape error if either disagrees with
    /// `num_states`.
    pub fn new(
        num_states: usize,
        transition_matrix: &FlatMatrix<f64>,
        start_probs: &[f64],
    ) -> HmmResult<Self> {
        validate_matrix_shape(transition_matrix, num_states, num_states, "transition_matrix")?;
        validate_probability_vector(start_probs, num_states, "start_probs")?;

        let mut log_transition = FlatMatrix::zeros(num_states, num_states);
        for (dst, &src) in log_transition
            .data
            .iter_mut()
            .zip(&transition_matrix.data)
        {
            // ln(0) = -inf is fine: forbidden transitions contribute
            // exp(-inf) = 0 counts.
            *dst = src.ln();
        }

        Ok(Self {
            num_states,
            log_transition,
            start_probs: start_probs.to_vec(),
        })
    }

    /// Start probabilities supplied at construction (read-only).
    pub fn start_probs(&self) -> &[f64] {
        &self.start_probs
    }
}

impl LatticeAccumulator for TransitionAccumulator {
    fn accumulate(
        &self,
        stats: &mut SufficientStatistics,
        _sequence: &FlatMatrix<f32>,
        frame_log_likelihood: &FlatMatrix<f32>,
        posteriors: &FlatMatrix<f32>,
        fwd_lattice: &FlatMatrix<f64>,
        bwd_lattice: &FlatMatrix<f64>,
    ) {
        let num_frames = posteriors.rows;
        let k = self.num_states;
        assert!(num_frames > 0, "cannot accumulate an empty sequence");
        assert_eq!(posteriors.cols, k, "posterior state count does not match");
        assert_eq!(fwd_lattice.rows, num_frames, "forward lattice frame count");
        assert_eq!(bwd_lattice.rows, num_frames, "backward lattice frame count");

        let log_likelihood = log_sum_exp(fwd_lattice.row(num_frames - 1));
        stats.log_likelihood += log_likelihood;

        for (count, &p) in stats.start_counts.iter_mut().zip(posteriors.row(0)) {
            *count += p as f64;
        }

        for t in 0..num_frames.saturating_sub(1) {
            let alpha = fwd_lattice.row(t);
            let beta_next = bwd_lattice.row(t + 1);
            let frame_next = frame_log_likelihood.row(t + 1);
            for i in 0..k {
                let counts = stats.transition_counts.row_mut(i);
                let log_a = self.log_transition.row(i);
                for j in 0..k {
                    let log_xi = alpha[i] + log_a[j] + frame_next[j] as f64 + beta_next[j]
                        - log_likelihood;
                    counts[j] += log_xi.exp();
                }
            }
        }
    }
}

/// Second accumulation stage: emission moments on top of a lattice stage.
///
/// Created once per model shape with the lattice strategy it composes;
/// produces fresh zeroed [`SufficientStatistics`] values and folds one
/// sequence per [`accumulate`] call.
///
/// [`accumulate`]: StatsAccumulator::accumulate
#[derive(Debug, Clone)]
pub struct StatsAccumulator<B: LatticeAccumulator> {
    num_states: usize,
    num_features: usize,
    base: B,
}

impl<B: LatticeAccumulator> StatsAccumulator<B> {
    /// Create an accumulator for a K-state, D-feature model composing the
    /// given lattice stage.
    pub fn new(num_states: usize, num_features: usize, base: B) -> Self {
        Self {
            num_states,
            num_features,
            base,
        }
    }

    /// Create an empty [`SufficientStatistics`] for one EM iteration.
    pub fn initialize(&self) -> SufficientStatistics {
        SufficientStatistics::zeros(self.num_states, self.num_features)
    }

    /// Fold one sequence's expectation-step results into `stats`.
    ///
    /// Delegates first to the lattice stage, then adds the per-state
    /// occupancy (posterior column sums) and the two dense transpose
    /// products: `obs_sum += Pᵀ·X` and `obs_sq_sum += Pᵀ·(X∘X)` with every
    /// element of the T×D sequence squared. All additions compose with
    /// whatever the statistics already hold, so repeated calls across
    /// sequences sum their contributions and the processing order does not
    /// matter.
    ///
    /// The sequence must be T×D with T matching the posterior row count.
    /// This sits in the per-iteration hot path and does not re-validate
    /// shapes guaranteed by earlier pipeline stages: violations are fatal
    /// assertions.
    pub fn accumulate(
        &self,
        stats: &mut SufficientStatistics,
        sequence: &FlatMatrix<f32>,
        frame_log_likelihood: &FlatMatrix<f32>,
        posteriors: &FlatMatrix<f32>,
        fwd_lattice: &FlatMatrix<f64>,
        bwd_lattice: &FlatMatrix<f64>,
    ) {
        self.base.accumulate(
            stats,
            sequence,
            frame_log_likelihood,
            posteriors,
            fwd_lattice,
            bwd_lattice,
        );

        assert_eq!(
            sequence.cols, self.num_features,
            "sequence feature count does not match model"
        );
        assert_eq!(
            sequence.rows, posteriors.rows,
            "sequence and posterior frame counts differ"
        );

        add_column_sums(posteriors, &mut stats.occupancy);
        add_transpose_product(posteriors, sequence, &mut stats.obs_sum);
        let sequence_sq = square_elements(sequence);
        add_transpose_product(posteriors, &sequence_sq, &mut stats.obs_sq_sum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    /// Lattice stage that contributes nothing; isolates the emission stage.
    struct NullLattice;

    impl LatticeAccumulator for NullLattice {
        fn accumulate(
            &self,
            _stats: &mut SufficientStatistics,
            _sequence: &FlatMatrix<f32>,
            _frame_log_likelihood: &FlatMatrix<f32>,
            _posteriors: &FlatMatrix<f32>,
            _fwd_lattice: &FlatMatrix<f64>,
            _bwd_lattice: &FlatMatrix<f64>,
        ) {
        }
    }

    #[test]
    fn emission_moments_match_direct_sums() {
        let accumulator = StatsAccumulator::new(2, 1, NullLattice);
        let mut stats = accumulator.initialize();

        let sequence = FlatMatrix::from_rows(&[vec![1.0f32], vec![2.0], vec![3.0]]).unwrap();
        let posteriors =
            FlatMatrix::from_rows(&[vec![1.0f32, 0.0], vec![0.5, 0.5], vec![0.0, 1.0]]).unwrap();
        let lattice = FlatMatrix::<f64>::zeros(3, 2);
        let frame_ll = FlatMatrix::<f32>::zeros(3, 2);

        accumulator.accumulate(&mut stats, &sequence, &frame_ll, &posteriors, &lattice, &lattice);

        assert_approx_eq!(stats.occupancy[0], 1.5, 1e-9);
        assert_approx_eq!(stats.occupancy[1], 1.5, 1e-9);
        // obs_sum[0] = 1·1 + 0.5·2 = 2, obs_sum[1] = 0.5·2 + 1·3 = 4
        assert_approx_eq!(stats.obs_sum.get(0, 0), 2.0, 1e-9);
        assert_approx_eq!(stats.obs_sum.get(1, 0), 4.0, 1e-9);
        // obs_sq_sum[0] = 1·1 + 0.5·4 = 3, obs_sq_sum[1] = 0.5·4 + 1·9 = 11
        assert_approx_eq!(stats.obs_sq_sum.get(0, 0), 3.0, 1e-9);
        assert_approx_eq!(stats.obs_sq_sum.get(1, 0), 11.0, 1e-9);
    }

    #[test]
    fn transition_accumulator_rejects_bad_shapes() {
        let square = FlatMatrix::<f64>::zeros(2, 2);
        assert!(TransitionAccumulator::new(2, &square, &[0.5, 0.5]).is_ok());
        assert!(TransitionAccumulator::new(3, &square, &[0.5, 0.5, 0.0]).is_err());
        assert!(TransitionAccumulator::new(2, &square, &[1.0]).is_err());
    }
}
