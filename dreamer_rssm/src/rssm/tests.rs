//! Rollout behavior of the recurrent state-space model.
//!
//! Test categories:
//! 1. Output layout (lengths, empty rollouts, variants)
//! 2. Zero-initialized parameters give closed-form outputs
//! 3. Nonterminal masking
//! 4. Embedding alignment and posterior feedback
//! 5. Shape validation

use burn::backend::NdArray;
use burn::nn::Initializer;
use burn::tensor::{Tensor, TensorData};

use super::*;
use crate::config::RssmConfig;
use crate::error::DreamerError;
use crate::noise::SeededNoise;

type B = NdArray<f32>;

const BELIEF: usize = 4;
const STATE: usize = 3;
const ACTION: usize = 2;
const EMBEDDING: usize = 6;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn to_vec<const D: usize>(t: Tensor<B, D>) -> Vec<f32> {
    t.into_data().to_vec::<f32>().unwrap()
}

fn config() -> RssmConfig {
    RssmConfig::new(ACTION)
        .with_belief_size(BELIEF)
        .with_state_size(STATE)
        .with_hidden_size(5)
        .with_embedding_size(EMBEDDING)
}

fn model() -> TransitionModel<B> {
    TransitionModelConfig::new(config())
        .init(&Default::default())
        .unwrap()
}

fn zero_model() -> TransitionModel<B> {
    TransitionModelConfig::new(config())
        .with_initializer(Initializer::Zeros)
        .init(&Default::default())
        .unwrap()
}

/// Distinguishable actions: step `t` of batch element `b` is `0.1 * (t + b)`.
fn actions(steps: usize, batch: usize) -> Tensor<B, 3> {
    let device = Default::default();
    let values: Vec<f32> = (0..steps)
        .flat_map(|t| (0..batch).flat_map(move |b| [0.1 * (t + b) as f32; ACTION]))
        .collect();
    Tensor::from_data(TensorData::new(values, [steps, batch, ACTION]), &device)
}

fn seeded_input(steps: usize, batch: usize) -> RolloutInput<B> {
    let device = Default::default();
    RolloutInput::new(
        Tensor::full([batch, STATE], 0.5, &device),
        actions(steps, batch),
        Tensor::full([batch, BELIEF], -0.25, &device),
    )
}

fn step_of(sequence: &Tensor<B, 3>, t: usize) -> Vec<f32> {
    let [_, batch, features] = sequence.dims();
    to_vec(sequence.clone().narrow(0, t, 1).reshape([batch, features]))
}

// =============================================================================
// 1. OUTPUT LAYOUT
// =============================================================================

#[test]
fn test_single_step_sequence_is_empty() {
    let trajectory = model()
        .rollout(seeded_input(0, 3), &SeededNoise::new(0))
        .unwrap();

    assert!(trajectory.is_empty());
    assert_eq!(trajectory.len(), 0);
    assert!(!trajectory.is_observed());
    assert_eq!(trajectory.beliefs.dims(), [0, 3, BELIEF]);
    assert_eq!(trajectory.prior.states.dims(), [0, 3, STATE]);
    assert_eq!(trajectory.prior.means.dims(), [0, 3, STATE]);
    assert_eq!(trajectory.prior.std_devs.dims(), [0, 3, STATE]);
}

#[test]
fn test_single_step_observed_sequence_is_empty() {
    let device = Default::default();
    let input = seeded_input(0, 2).with_embeddings(Tensor::zeros([0, 2, EMBEDDING], &device));
    let trajectory = model().rollout(input, &SeededNoise::new(0)).unwrap();

    assert!(trajectory.is_observed());
    let posterior = trajectory.posterior().unwrap();
    assert_eq!(posterior.states.dims(), [0, 2, STATE]);
}

#[test]
fn test_output_length_is_action_count() {
    let trajectory = model()
        .rollout(seeded_input(5, 2), &SeededNoise::new(0))
        .unwrap();

    assert_eq!(trajectory.len(), 5);
    assert_eq!(trajectory.beliefs.dims(), [5, 2, BELIEF]);
    assert_eq!(trajectory.prior.states.dims(), [5, 2, STATE]);
    assert!(trajectory.posterior.is_none());
    assert_eq!(trajectory.features().dims(), [5, 2, BELIEF + STATE]);
}

#[test]
fn test_observed_variant_appends_posterior() {
    let device = Default::default();
    let input = seeded_input(4, 3).with_embeddings(Tensor::ones([4, 3, EMBEDDING], &device));
    let trajectory = model().rollout(input, &SeededNoise::new(0)).unwrap();

    assert!(trajectory.is_observed());
    let posterior = trajectory.posterior().unwrap();
    assert_eq!(posterior.states.dims(), [4, 3, STATE]);
    assert_eq!(posterior.means.dims(), [4, 3, STATE]);
    assert_eq!(posterior.std_devs.dims(), [4, 3, STATE]);

    // Observed features use the posterior states.
    let features = trajectory.features();
    let [steps, batch, _] = features.dims();
    let states = features.narrow(2, BELIEF, STATE);
    assert_eq!(states.dims(), [steps, batch, STATE]);
    assert_eq!(to_vec(states), to_vec(posterior.states.clone()));
}

#[test]
fn test_seed_is_not_emitted() {
    let device = Default::default();
    let seed_belief = Tensor::<B, 2>::full([1, BELIEF], 7.0, &device);
    let input = RolloutInput::new(
        Tensor::zeros([1, STATE], &device),
        actions(1, 1),
        seed_belief,
    );
    let trajectory = zero_model().rollout(input, &SeededNoise::new(0)).unwrap();

    // Zero GRU parameters halve the belief: the seed itself is never returned.
    for b in step_of(&trajectory.beliefs, 0) {
        assert!((b - 3.5).abs() < 1e-5, "belief {}", b);
    }
}

// =============================================================================
// 2. ZERO-INITIALIZED PARAMETERS
// =============================================================================

#[test]
fn test_zero_parameters_give_closed_form_prior() {
    let device = Default::default();
    let input = RolloutInput::new(
        Tensor::zeros([2, STATE], &device),
        Tensor::zeros([3, 2, ACTION], &device),
        Tensor::zeros([2, BELIEF], &device),
    );
    let trajectory = zero_model().rollout(input, &SeededNoise::new(0)).unwrap();

    let expected_std = std::f32::consts::LN_2 + 0.1;
    for b in to_vec(trajectory.beliefs) {
        assert!(b.abs() < 1e-6, "belief {}", b);
    }
    for m in to_vec(trajectory.prior.means) {
        assert!(m.abs() < 1e-6, "mean {}", m);
    }
    for s in to_vec(trajectory.prior.std_devs) {
        assert!((s - expected_std).abs() < 1e-5, "std {}", s);
    }
}

#[test]
fn test_std_devs_never_below_floor() {
    let device = Default::default();
    let model = TransitionModelConfig::new(config().with_min_std_dev(0.2))
        .init::<B>(&device)
        .unwrap();
    let input = RolloutInput::new(
        Tensor::full([2, STATE], 30.0, &device),
        Tensor::full([6, 2, ACTION], -30.0, &device),
        Tensor::full([2, BELIEF], 30.0, &device),
    )
    .with_embeddings(Tensor::full([6, 2, EMBEDDING], 30.0, &device));
    let trajectory = model.rollout(input, &SeededNoise::new(3)).unwrap();

    for s in to_vec(trajectory.prior.std_devs.clone()) {
        assert!(s >= 0.2);
    }
    for s in to_vec(trajectory.posterior.unwrap().std_devs) {
        assert!(s >= 0.2);
    }
}

// =============================================================================
// 3. NONTERMINAL MASKING
// =============================================================================

#[test]
fn test_all_ones_mask_matches_unmasked() {
    let device = Default::default();
    let model = model();

    let unmasked = model
        .rollout(seeded_input(4, 2), &SeededNoise::new(17))
        .unwrap();
    let masked = model
        .rollout(
            seeded_input(4, 2).with_nonterminals(Tensor::ones([4, 2, 1], &device)),
            &SeededNoise::new(17),
        )
        .unwrap();

    assert_eq!(to_vec(unmasked.beliefs), to_vec(masked.beliefs));
    assert_eq!(
        to_vec(unmasked.prior.states),
        to_vec(masked.prior.states)
    );
}

#[test]
fn test_zero_mask_resets_state_not_belief() {
    let device = Default::default();
    let model = model();

    // Episode boundary before the first transition only.
    let mask: Tensor<B, 3> = Tensor::cat(
        vec![Tensor::zeros([1, 2, 1], &device), Tensor::ones([2, 2, 1], &device)],
        0,
    );
    let masked = model
        .rollout(seeded_input(3, 2).with_nonterminals(mask), &SeededNoise::new(4))
        .unwrap();

    let mut zero_state = seeded_input(3, 2);
    zero_state.prev_state = Tensor::zeros([2, STATE], &device);
    let reference = model.rollout(zero_state, &SeededNoise::new(4)).unwrap();

    assert_eq!(to_vec(masked.beliefs.clone()), to_vec(reference.beliefs));
    assert_eq!(to_vec(masked.prior.states), to_vec(reference.prior.states));

    // The belief seed is carried through: zeroing it too changes the result.
    let mut zero_both = seeded_input(3, 2);
    zero_both.prev_state = Tensor::zeros([2, STATE], &device);
    zero_both.prev_belief = Tensor::zeros([2, BELIEF], &device);
    let both = model.rollout(zero_both, &SeededNoise::new(4)).unwrap();
    assert_ne!(step_of(&masked.beliefs, 0), step_of(&both.beliefs, 0));
}

// =============================================================================
// 4. EMBEDDING ALIGNMENT
// =============================================================================

#[test]
fn test_embedding_t_shapes_output_step_t() {
    let device = Default::default();
    let model = model();

    let base: Tensor<B, 3> = Tensor::ones([3, 2, EMBEDDING], &device);
    let changed_last = Tensor::cat(
        vec![
            base.clone().narrow(0, 0, 2),
            Tensor::full([1, 2, EMBEDDING], -5.0, &device),
        ],
        0,
    );

    let a = model
        .rollout(seeded_input(3, 2).with_embeddings(base), &SeededNoise::new(8))
        .unwrap();
    let b = model
        .rollout(
            seeded_input(3, 2).with_embeddings(changed_last),
            &SeededNoise::new(8),
        )
        .unwrap();

    let (pa, pb) = (a.posterior().unwrap(), b.posterior().unwrap());
    assert_eq!(step_of(&pa.means, 0), step_of(&pb.means, 0));
    assert_eq!(step_of(&pa.means, 1), step_of(&pb.means, 1));
    assert_ne!(step_of(&pa.means, 2), step_of(&pb.means, 2));
    // The belief at a step does not see that step's embedding.
    assert_eq!(step_of(&a.beliefs, 2), step_of(&b.beliefs, 2));
}

#[test]
fn test_rollout_matches_manual_steps_with_posterior_feedback() {
    let device = Default::default();
    let model = model();
    let embeddings: Tensor<B, 3> = Tensor::full([2, 1, EMBEDDING], 0.3, &device);
    let input = seeded_input(2, 1).with_embeddings(embeddings.clone());

    let trajectory = model.rollout(input.clone(), &SeededNoise::new(12)).unwrap();

    let noise = SeededNoise::new(12);
    let first = model
        .step(
            StepInput::new(
                input.prev_belief.clone(),
                input.prev_state.clone(),
                input.actions.clone().narrow(0, 0, 1).reshape([1, ACTION]),
            )
            .with_embedding(embeddings.clone().narrow(0, 0, 1).reshape([1, EMBEDDING])),
            &noise,
        )
        .unwrap();
    let first_posterior = first.posterior.clone().unwrap();
    let second = model
        .step(
            StepInput::new(
                first.belief.clone(),
                first_posterior.state,
                input.actions.clone().narrow(0, 1, 1).reshape([1, ACTION]),
            )
            .with_embedding(embeddings.narrow(0, 1, 1).reshape([1, EMBEDDING])),
            &noise,
        )
        .unwrap();

    assert_eq!(step_of(&trajectory.beliefs, 0), to_vec(first.belief));
    assert_eq!(step_of(&trajectory.beliefs, 1), to_vec(second.belief));
    let posterior = trajectory.posterior().unwrap();
    assert_eq!(
        step_of(&posterior.states, 1),
        to_vec(second.posterior.unwrap().state)
    );
    assert_eq!(step_of(&trajectory.prior.states, 1), to_vec(second.prior.state));
}

// =============================================================================
// 5. SHAPE VALIDATION
// =============================================================================

#[test]
fn test_embeddings_per_step_or_per_slot() {
    let device = Default::default();
    let model = model();
    let embeddings: Tensor<B, 3> = Tensor::random(
        [4, 2, EMBEDDING],
        burn::tensor::Distribution::Normal(0.0, 1.0),
        &device,
    );

    // T entries: the trailing one is never consumed.
    let full = model
        .rollout(
            seeded_input(3, 2).with_embeddings(embeddings.clone()),
            &SeededNoise::new(6),
        )
        .unwrap();
    let trimmed = model
        .rollout(
            seeded_input(3, 2).with_embeddings(embeddings.narrow(0, 0, 3)),
            &SeededNoise::new(6),
        )
        .unwrap();

    assert_eq!(full.len(), 3);
    assert_eq!(to_vec(full.beliefs), to_vec(trimmed.beliefs));
    assert_eq!(
        to_vec(full.posterior.unwrap().states),
        to_vec(trimmed.posterior.unwrap().states)
    );
}

#[test]
fn test_embeddings_of_other_lengths_rejected() {
    let device = Default::default();
    let model = model();

    for len in [2, 5] {
        let input = seeded_input(3, 2).with_embeddings(Tensor::zeros([len, 2, EMBEDDING], &device));
        let err = model.rollout(input, &SeededNoise::new(0)).unwrap_err();
        assert_eq!(
            err,
            DreamerError::ShapeMismatch {
                what: "embeddings",
                expected: vec![3, 2, EMBEDDING],
                actual: vec![len, 2, EMBEDDING],
            }
        );
    }

    // Correct length, wrong width.
    let input = seeded_input(3, 2).with_embeddings(Tensor::zeros([4, 2, EMBEDDING + 1], &device));
    assert!(matches!(
        model.rollout(input, &SeededNoise::new(0)),
        Err(DreamerError::ShapeMismatch { what: "embeddings", .. })
    ));
}

#[test]
fn test_rollout_rejects_malformed_inputs() {
    let device = Default::default();
    let model = model();
    let noise = SeededNoise::new(0);

    let mut wide_actions = seeded_input(3, 2);
    wide_actions.actions = Tensor::zeros([3, 2, ACTION + 1], &device);
    assert!(matches!(
        model.rollout(wide_actions, &noise),
        Err(DreamerError::ShapeMismatch { what: "actions", .. })
    ));

    let mut bad_belief = seeded_input(3, 2);
    bad_belief.prev_belief = Tensor::zeros([2, BELIEF + 1], &device);
    assert!(matches!(
        model.rollout(bad_belief, &noise),
        Err(DreamerError::ShapeMismatch { what: "prev_belief", .. })
    ));

    let mut bad_batch = seeded_input(3, 2);
    bad_batch.prev_state = Tensor::zeros([3, STATE], &device);
    assert!(matches!(
        model.rollout(bad_batch, &noise),
        Err(DreamerError::ShapeMismatch { what: "prev_state", .. })
    ));

    let bad_mask = seeded_input(3, 2).with_nonterminals(Tensor::ones([2, 2, 1], &device));
    assert!(matches!(
        model.rollout(bad_mask, &noise),
        Err(DreamerError::ShapeMismatch { what: "nonterminals", .. })
    ));
}

#[test]
fn test_heads_consume_rollout_features() {
    use burn::nn::LinearConfig;

    let device = Default::default();
    let trajectory = model()
        .rollout(seeded_input(4, 3), &SeededNoise::new(0))
        .unwrap();
    let reward_head = LinearConfig::new(BELIEF + STATE, 1).init::<B>(&device);

    let rewards = time_distributed(trajectory.features(), |x| reward_head.forward(x));
    assert_eq!(rewards.dims(), [4, 3, 1]);
}

#[test]
fn test_heads_consume_empty_rollout() {
    use burn::nn::LinearConfig;

    let device = Default::default();
    let trajectory = model()
        .rollout(seeded_input(0, 2), &SeededNoise::new(0))
        .unwrap();
    let value_head = LinearConfig::new(BELIEF + STATE, 1).init::<B>(&device);

    let values = time_distributed(trajectory.features(), |x| value_head.forward(x));
    assert_eq!(values.dims(), [0, 2, 1]);
}
