//! # Dreamer RSSM: latent dynamics core for model-based RL
//!
//! The recurrent state-space model of the PlaNet/Dreamer family together with
//! the bounded policy distribution used to act from its latent state.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         TransitionModel                              │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  s_{t-1} ⊙ nonterminal ─┐                                           │
//! │  a_{t-1} ───────────────┴─► embed ─► GRU ─► h_t (belief)            │
//! │                                      ▲       │                      │
//! │  h_{t-1} ────────────────────────────┘       ├─► prior  N(μ_p, σ_p) │
//! │  e_t (observation embedding) ────────────────┴─► post   N(μ_q, σ_q) │
//! └─────────────────────────────────────────────────────────────────────┘
//!
//!   [h_t, s_t] ─► (external actor head) ─► SquashedGaussian ─► SampleDist
//!                                                                 │
//!                                          select_action ◄────────┘
//! ```
//!
//! - [`rssm`]: single step and full sequence rollout
//! - [`distributions`]: diagonal and tanh-squashed Gaussians, Monte-Carlo
//!   statistics
//! - [`action`]: greedy or exploratory action selection
//! - [`noise`]: standard-normal noise sources for reparameterized sampling
//!
//! All computation is generic over the Burn backend; callers pick the device.
//!
//! ## Usage
//!
//! ```rust
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//! use dreamer_rssm::{RolloutInput, RssmConfig, SeededNoise, TransitionModelConfig};
//!
//! type B = NdArray<f32>;
//! let device = Default::default();
//!
//! let config = RssmConfig::new(2)
//!     .with_belief_size(8)
//!     .with_state_size(4)
//!     .with_hidden_size(8)
//!     .with_embedding_size(16);
//! let model = TransitionModelConfig::new(config).init::<B>(&device).unwrap();
//!
//! let (belief, state) = model.initial_state(3, &device);
//! let input = RolloutInput::new(state, Tensor::zeros([5, 3, 2], &device), belief)
//!     .with_embeddings(Tensor::zeros([5, 3, 16], &device));
//!
//! let trajectory = model.rollout(input, &SeededNoise::new(0)).unwrap();
//! assert!(trajectory.is_observed());
//! assert_eq!(trajectory.beliefs.dims(), [5, 3, 8]);
//! ```

pub mod action;
pub mod config;
pub mod distributions;
pub mod error;
pub mod nn;
pub mod noise;
pub mod rssm;

// Re-export commonly used types
pub use action::{select_action, ActionSelection};
pub use config::{PolicyConfig, RssmConfig};
pub use distributions::{DiagGaussian, ReparamDistribution, SampleDist, SquashedGaussian};
pub use error::{DreamerError, Result};
pub use nn::{Activation, GruCell, GruCellConfig};
pub use noise::{BackendNoise, NoiseSource, SeededNoise};
pub use rssm::{
    time_distributed, LatentSample, RolloutInput, StateSequence, StepInput, StepOutput,
    Trajectory, TransitionModel, TransitionModelConfig,
};
