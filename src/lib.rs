//! # Gaussian HMM Expectation Step
//!
//! Expectation-step quantities for training Hidden Markov Models whose
//! per-state emissions are multivariate Gaussians with diagonal covariance,
//! as used inside a Baum-Welch expectation-maximization loop.
//!
//! The crate covers the inner loop an EM driver executes per iteration over
//! potentially millions of observation frames:
//!
//! - **Emission model**: [`DiagonalGaussianModel`] owns per-state means and
//!   variances plus a derived numerical cache, and maps an observation
//!   sequence to a frame-by-state log-likelihood matrix with no divisions in
//!   the hot loop.
//! - **Forward-backward**: [`forward_backward`] turns frame log-likelihoods,
//!   a transition matrix, and start probabilities into log-domain lattices
//!   and per-frame state posteriors, entirely in log space.
//! - **Sufficient statistics**: [`StatsAccumulator`] folds one sequence's
//!   posteriors into running occupancy and observation-moment sums, composing
//!   a [`LatticeAccumulator`] stage ([`TransitionAccumulator`]) that
//!   contributes transition counts, start counts, and total log-likelihood.
//!   Partial [`SufficientStatistics`] merge associatively, so sequences can
//!   be processed by independent workers and reduced afterward.
//!
//! Observation sequences, frame log-likelihoods, and posteriors are stored as
//! `f32` to bound memory bandwidth on large datasets; model parameters,
//! lattices, and accumulated statistics are `f64`, and all mixed-precision
//! arithmetic is carried at `f64` before the final cast.
//!
//! What this crate does not do: choose the model topology or state count,
//! decide convergence, re-estimate parameters (the maximization step divides
//! the accumulated moments by occupancy and builds a new model), or load
//! trajectory data.
//!
//! ## Quick Start
//!
//! ```rust
//! use gaussian_hmm::{
//!     forward_backward, DiagonalGaussianModel, FlatMatrix, StatsAccumulator,
//!     TransitionAccumulator,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Two states, one feature: a low-mean and a high-mean regime.
//!     let means = FlatMatrix::from_rows(&[vec![0.0], vec![5.0]])?;
//!     let variances = FlatMatrix::from_rows(&[vec![1.0], vec![1.0]])?;
//!     let model = DiagonalGaussianModel::new(2, 1, means, variances)?;
//!
//!     let transition = FlatMatrix::from_rows(&[vec![0.9, 0.1], vec![0.1, 0.9]])?;
//!     let start_probs = [0.5, 0.5];
//!
//!     let accumulator = StatsAccumulator::new(
//!         2,
//!         1,
//!         TransitionAccumulator::new(2, &transition, &start_probs)?,
//!     );
//!     let mut stats = accumulator.initialize();
//!
//!     // One EM expectation pass over a training sequence.
//!     let sequence =
//!         FlatMatrix::from_rows(&[vec![0.1f32], vec![-0.3], vec![4.9], vec![5.2]])?;
//!     let frame_ll = model.emission_log_likelihood(&sequence);
//!     let lattices = forward_backward(&frame_ll, &transition, &start_probs)?;
//!     accumulator.accumulate(
//!         &mut stats,
//!         &sequence,
//!         &frame_ll,
//!         &lattices.posteriors,
//!         &lattices.fwd_lattice,
//!         &lattices.bwd_lattice,
//!     );
//!
//!     println!("sequence log-likelihood: {:.4}", stats.log_likelihood);
//!     println!("state occupancy: {:?}", stats.occupancy);
//!     Ok(())
//! }
//! ```
//!
//! ## Numerical policy
//!
//! Variances must be strictly positive; this is a caller contract. A zero
//! variance drives the affected log-likelihoods to `-inf` without raising
//! any error (a collapsed-state signal the caller regularizes externally).
//! Hot-path shape violations are fatal assertions, not recoverable errors;
//! recoverable `ShapeMismatch` errors are raised only at construction and at
//! per-sequence boundaries.

pub mod emission_models;
pub mod errors;
pub mod estep;
pub mod forward_backward;
pub mod linear_algebra;
pub mod math_utils;
pub mod matrix;
pub mod sufficient_stats;

pub use emission_models::DiagonalGaussianModel;
pub use errors::{GaussianHmmError, HmmResult};
pub use estep::{LatticeAccumulator, StatsAccumulator, TransitionAccumulator};
pub use forward_backward::{forward_backward, LatticePosteriors};
pub use matrix::FlatMatrix;
pub use sufficient_stats::SufficientStatistics;
