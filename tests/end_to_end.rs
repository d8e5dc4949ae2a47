//! Full expectation-step pipeline on synthetic regime-switching data.

use assert_approx_eq::assert_approx_eq;
use gaussian_hmm::{
    forward_backward, DiagonalGaussianModel, FlatMatrix, StatsAccumulator, SufficientStatistics,
    TransitionAccumulator,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use statrs::distribution::Normal;

const STATE_MEANS: [f64; 2] = [0.0, 5.0];
const STATE_STD_DEV: f64 = 0.5;

/// One noisy sample per frame from the state's Gaussian, states switching
/// halfway through.
fn synthetic_sequence(rng: &mut ChaCha20Rng, frames_per_state: usize) -> (FlatMatrix<f32>, Vec<usize>) {
    use rand::distributions::Distribution;

    let mut seq = FlatMatrix::<f32>::zeros(2 * frames_per_state, 1);
    let mut states = Vec::with_capacity(2 * frames_per_state);
    for (state, &mean) in STATE_MEANS.iter().enumerate() {
        let normal = Normal::new(mean, STATE_STD_DEV).unwrap();
        for i in 0..frames_per_state {
            let t = state * frames_per_state + i;
            seq.set(t, 0, normal.sample(rng) as f32);
            states.push(state);
        }
    }
    (seq, states)
}

fn true_model() -> DiagonalGaussianModel {
    let means = FlatMatrix::from_rows(&[vec![STATE_MEANS[0]], vec![STATE_MEANS[1]]]).unwrap();
    let var = STATE_STD_DEV * STATE_STD_DEV;
    let variances = FlatMatrix::from_rows(&[vec![var], vec![var]]).unwrap();
    DiagonalGaussianModel::new(2, 1, means, variances).unwrap()
}

fn transition_matrix() -> FlatMatrix<f64> {
    FlatMatrix::from_rows(&[vec![0.95, 0.05], vec![0.05, 0.95]]).unwrap()
}

#[test]
fn posteriors_recover_well_separated_regimes() {
    let mut rng = ChaCha20Rng::seed_from_u64(2024);
    let (sequence, states) = synthetic_sequence(&mut rng, 100);
    let model = true_model();
    let transition = transition_matrix();
    let start_probs = [0.5, 0.5];

    let frame_ll = model.emission_log_likelihood(&sequence);
    let lattices = forward_backward(&frame_ll, &transition, &start_probs).unwrap();
    assert!(lattices.log_likelihood.is_finite());

    let mut correct = 0usize;
    for (t, &truth) in states.iter().enumerate() {
        let decoded = if lattices.posteriors.get(t, 1) > lattices.posteriors.get(t, 0) {
            1
        } else {
            0
        };
        if decoded == truth {
            correct += 1;
        }
    }
    // The regimes are ten standard deviations apart; essentially every frame
    // should be assigned to its generating state.
    assert!(
        correct >= states.len() * 95 / 100,
        "only {}/{} frames decoded correctly",
        correct,
        states.len()
    );
}

#[test]
fn accumulated_moments_support_parameter_recovery() {
    let mut rng = ChaCha20Rng::seed_from_u64(7_777);
    let (sequence, _) = synthetic_sequence(&mut rng, 200);
    let model = true_model();
    let transition = transition_matrix();
    let start_probs = [0.5, 0.5];

    let accumulator = StatsAccumulator::new(
        2,
        1,
        TransitionAccumulator::new(2, &transition, &start_probs).unwrap(),
    );
    let mut stats = accumulator.initialize();

    let frame_ll = model.emission_log_likelihood(&sequence);
    let lattices = forward_backward(&frame_ll, &transition, &start_probs).unwrap();
    accumulator.accumulate(
        &mut stats,
        &sequence,
        &frame_ll,
        &lattices.posteriors,
        &lattices.fwd_lattice,
        &lattices.bwd_lattice,
    );

    // What the maximization step would compute: mean = obs_sum / occupancy,
    // variance = obs_sq_sum / occupancy − mean².
    for s in 0..2 {
        let occupancy = stats.occupancy[s];
        assert!(occupancy > 150.0, "state {} occupancy {}", s, occupancy);

        let mean = stats.obs_sum.get(s, 0) / occupancy;
        let variance = stats.obs_sq_sum.get(s, 0) / occupancy - mean * mean;
        assert_approx_eq!(mean, STATE_MEANS[s], 0.15);
        assert_approx_eq!(variance, STATE_STD_DEV * STATE_STD_DEV, 0.15);
    }

    // Each regime occupies half the frames.
    assert_approx_eq!(stats.occupancy[0], 200.0, 5.0);
    assert_approx_eq!(stats.occupancy[1], 200.0, 5.0);
}

#[test]
fn parallel_partial_accumulators_match_sequential_accumulation() {
    let mut rng = ChaCha20Rng::seed_from_u64(31);
    let model = true_model();
    let transition = transition_matrix();
    let start_probs = [0.5, 0.5];
    let accumulator = StatsAccumulator::new(
        2,
        1,
        TransitionAccumulator::new(2, &transition, &start_probs).unwrap(),
    );

    let sequences: Vec<FlatMatrix<f32>> = (0..3)
        .map(|_| synthetic_sequence(&mut rng, 50).0)
        .collect();

    // Sequential: one accumulator over all sequences.
    let mut sequential = accumulator.initialize();
    for seq in &sequences {
        let frame_ll = model.emission_log_likelihood(seq);
        let lattices = forward_backward(&frame_ll, &transition, &start_probs).unwrap();
        accumulator.accumulate(
            &mut sequential,
            seq,
            &frame_ll,
            &lattices.posteriors,
            &lattices.fwd_lattice,
            &lattices.bwd_lattice,
        );
    }

    // Map-reduce: one isolated accumulator per worker, merged afterward.
    let partials: Vec<SufficientStatistics> = sequences
        .iter()
        .map(|seq| {
            let mut partial = accumulator.initialize();
            let frame_ll = model.emission_log_likelihood(seq);
            let lattices = forward_backward(&frame_ll, &transition, &start_probs).unwrap();
            accumulator.accumulate(
                &mut partial,
                seq,
                &frame_ll,
                &lattices.posteriors,
                &lattices.fwd_lattice,
                &lattices.bwd_lattice,
            );
            partial
        })
        .collect();
    let mut merged = accumulator.initialize();
    for partial in &partials {
        merged.merge(partial);
    }

    assert_approx_eq!(sequential.log_likelihood, merged.log_likelihood, 1e-9);
    for s in 0..2 {
        assert_approx_eq!(sequential.occupancy[s], merged.occupancy[s], 1e-9);
        assert_approx_eq!(sequential.start_counts[s], merged.start_counts[s], 1e-9);
        assert_approx_eq!(
            sequential.obs_sum.get(s, 0),
            merged.obs_sum.get(s, 0),
            1e-9
        );
        assert_approx_eq!(
            sequential.obs_sq_sum.get(s, 0),
            merged.obs_sq_sum.get(s, 0),
            1e-9
        );
    }
    for (x, y) in sequential
        .transition_counts
        .data
        .iter()
        .zip(&merged.transition_counts.data)
    {
        assert_approx_eq!(x, y, 1e-9);
    }
}
