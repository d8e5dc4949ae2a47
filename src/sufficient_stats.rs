//! Sufficient statistics for one expectation-maximization iteration.
//!
//! A [`SufficientStatistics`] value is created zeroed at the start of an EM
//! iteration, mutated by one accumulation call per training sequence, and
//! consumed exactly once by the maximization step. It is an owned value with
//! move semantics; partial accumulators filled by independent workers are
//! combined with [`SufficientStatistics::merge`].

use crate::matrix::FlatMatrix;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Running sums collected over training sequences during one EM iteration.
///
/// The transition and start-probability fields are filled by the lattice
/// accumulation stage; occupancy and the observation moments by the emission
/// stage. Every field adds elementwise under [`merge`], so accumulation is
/// associative across sequences and across workers.
///
/// [`merge`]: SufficientStatistics::merge
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SufficientStatistics {
    /// Number of hidden states K
    pub num_states: usize,
    /// Number of observation features D
    pub num_features: usize,
    /// Running total log-likelihood over all accumulated sequences
    pub log_likelihood: f64,
    /// Expected counts of starting in each state, length K
    pub start_counts: Vec<f64>,
    /// Expected transition counts, K×K
    pub transition_counts: FlatMatrix<f64>,
    /// Expected visit count per state: occupancy[s] = Σ_t posterior[t][s]
    pub occupancy: Vec<f64>,
    /// Posterior-weighted observation sums, K×D: Σ_t posterior[t][s]·x_t
    pub obs_sum: FlatMatrix<f64>,
    /// Posterior-weighted squared-observation sums, K×D: Σ_t posterior[t][s]·x_t²
    pub obs_sq_sum: FlatMatrix<f64>,
}

impl SufficientStatistics {
    /// Create an empty accumulator with all sums zero.
    pub fn zeros(num_states: usize, num_features: usize) -> Self {
        Self {
            num_states,
            num_features,
            log_likelihood: 0.0,
            start_counts: vec![0.0; num_states],
            transition_counts: FlatMatrix::zeros(num_states, num_states),
            occupancy: vec![0.0; num_states],
            obs_sum: FlatMatrix::zeros(num_states, num_features),
            obs_sq_sum: FlatMatrix::zeros(num_states, num_features),
        }
    }

    /// Fold another accumulator into this one by elementwise addition.
    ///
    /// This is the reduce step of the map-reduce accumulation contract:
    /// workers accumulate disjoint sequence subsets into private statistics,
    /// then merge them in any order. Merging accumulators of different
    /// dimensions is a fatal contract violation.
    pub fn merge(&mut self, other: &SufficientStatistics) {
        assert_eq!(self.num_states, other.num_states, "merge: state counts differ");
        assert_eq!(
            self.num_features, other.num_features,
            "merge: feature counts differ"
        );

        self.log_likelihood += other.log_likelihood;
        for (a, b) in self.start_counts.iter_mut().zip(&other.start_counts) {
            *a += b;
        }
        for (a, b) in self
            .transition_counts
            .data
            .iter_mut()
            .zip(&other.transition_counts.data)
        {
            *a += b;
        }
        for (a, b) in self.occupancy.iter_mut().zip(&other.occupancy) {
            *a += b;
        }
        for (a, b) in self.obs_sum.data.iter_mut().zip(&other.obs_sum.data) {
            *a += b;
        }
        for (a, b) in self.obs_sq_sum.data.iter_mut().zip(&other.obs_sq_sum.data) {
            *a += b;
        }
    }
}
