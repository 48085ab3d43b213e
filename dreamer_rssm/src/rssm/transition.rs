//! One step of the recurrent state-space model.
//!
//! ```text
//! s̃      = s_{t-1} ⊙ nonterminal            (mask, if given)
//! x       = act(W_e [s̃, a_{t-1}])
//! h_t     = GRU(x, h_{t-1})                    (deterministic belief)
//! prior   = N(μ_p, σ_p)  from act(W_p h_t)
//! post    = N(μ_q, σ_q)  from act(W_q [h_t, e_t]) (if an embedding is given)
//! σ       = softplus(raw) + min_std_dev
//! ```
//!
//! Beliefs are never masked. Only the state that feeds the recurrence is.

use burn::module::{Ignored, Module};
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::config::RssmConfig;
use crate::distributions::{DiagGaussian, ReparamDistribution};
use crate::error::{ensure_dims, Result};
use crate::nn::{Activation, GruCell, GruCellConfig};
use crate::noise::NoiseSource;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for [`TransitionModel`].
#[derive(Debug, Clone)]
pub struct TransitionModelConfig {
    pub rssm: RssmConfig,
    /// Initializer for every layer. `None` keeps Burn's `Linear` default.
    pub initializer: Option<Initializer>,
}

impl TransitionModelConfig {
    /// Create new transition model config.
    pub fn new(rssm: RssmConfig) -> Self {
        Self {
            rssm,
            initializer: None,
        }
    }

    /// Set the initializer of every layer.
    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = Some(initializer);
        self
    }

    fn linear<B: Backend>(&self, d_in: usize, d_out: usize, device: &B::Device) -> Linear<B> {
        let mut config = LinearConfig::new(d_in, d_out);
        if let Some(initializer) = &self.initializer {
            config = config.with_initializer(initializer.clone());
        }
        config.init(device)
    }

    /// Validate the sizes and build the model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<TransitionModel<B>> {
        self.rssm.validate()?;
        let c = &self.rssm;

        let mut rnn = GruCellConfig::new(c.belief_size, c.belief_size);
        if let Some(initializer) = &self.initializer {
            rnn = rnn.with_initializer(initializer.clone());
        }

        Ok(TransitionModel {
            fc_embed_state_action: self.linear(c.state_size + c.action_size, c.belief_size, device),
            rnn: rnn.init(device),
            fc_embed_belief_prior: self.linear(c.belief_size, c.hidden_size, device),
            fc_state_prior: self.linear(c.hidden_size, 2 * c.state_size, device),
            fc_embed_belief_posterior: self.linear(
                c.belief_size + c.embedding_size,
                c.hidden_size,
                device,
            ),
            fc_state_posterior: self.linear(c.hidden_size, 2 * c.state_size, device),
            activation: Ignored(c.activation),
            min_std_dev: c.min_std_dev,
            belief_size: c.belief_size,
            state_size: c.state_size,
            action_size: c.action_size,
            embedding_size: c.embedding_size,
        })
    }
}

// ============================================================================
// Step inputs and outputs
// ============================================================================

/// Inputs of a single transition. All tensors are `[batch, _]`.
#[derive(Debug, Clone)]
pub struct StepInput<B: Backend> {
    /// `[batch, belief_size]`
    pub prev_belief: Tensor<B, 2>,
    /// `[batch, state_size]`, prior or posterior at the caller's choice.
    pub prev_state: Tensor<B, 2>,
    /// `[batch, action_size]`
    pub action: Tensor<B, 2>,
    /// `[batch, 1]`, 0.0 where the previous transition ended an episode.
    pub nonterminal: Option<Tensor<B, 2>>,
    /// `[batch, embedding_size]`, the embedding of the observation at the new step.
    pub embedding: Option<Tensor<B, 2>>,
}

impl<B: Backend> StepInput<B> {
    /// Create step inputs without mask or embedding.
    pub fn new(prev_belief: Tensor<B, 2>, prev_state: Tensor<B, 2>, action: Tensor<B, 2>) -> Self {
        Self {
            prev_belief,
            prev_state,
            action,
            nonterminal: None,
            embedding: None,
        }
    }

    /// Set the nonterminal mask.
    pub fn with_nonterminal(mut self, nonterminal: Tensor<B, 2>) -> Self {
        self.nonterminal = Some(nonterminal);
        self
    }

    /// Set the observation embedding, requesting a posterior.
    pub fn with_embedding(mut self, embedding: Tensor<B, 2>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// A reparameterized state sample with the parameters it was drawn from.
#[derive(Debug, Clone)]
pub struct LatentSample<B: Backend> {
    pub state: Tensor<B, 2>,
    pub mean: Tensor<B, 2>,
    pub std_dev: Tensor<B, 2>,
}

impl<B: Backend> LatentSample<B> {
    /// Rebuild the Gaussian the state was drawn from.
    pub fn distribution(&self) -> DiagGaussian<B> {
        // Shapes were checked when the sample was drawn.
        DiagGaussian::from_checked(self.mean.clone(), self.std_dev.clone())
    }
}

/// Output of a single transition.
#[derive(Debug, Clone)]
pub struct StepOutput<B: Backend> {
    /// `[batch, belief_size]`
    pub belief: Tensor<B, 2>,
    pub prior: LatentSample<B>,
    /// Present only when an embedding was supplied.
    pub posterior: Option<LatentSample<B>>,
}

// ============================================================================
// Model
// ============================================================================

/// Deterministic belief recurrence with stochastic prior and posterior heads.
#[derive(Module, Debug)]
pub struct TransitionModel<B: Backend> {
    fc_embed_state_action: Linear<B>,
    rnn: GruCell<B>,
    fc_embed_belief_prior: Linear<B>,
    fc_state_prior: Linear<B>,
    fc_embed_belief_posterior: Linear<B>,
    fc_state_posterior: Linear<B>,
    activation: Ignored<Activation>,
    #[module(skip)]
    min_std_dev: f32,
    #[module(skip)]
    belief_size: usize,
    #[module(skip)]
    state_size: usize,
    #[module(skip)]
    action_size: usize,
    #[module(skip)]
    embedding_size: usize,
}

impl<B: Backend> TransitionModel<B> {
    pub fn belief_size(&self) -> usize {
        self.belief_size
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    pub fn action_size(&self) -> usize {
        self.action_size
    }

    pub fn embedding_size(&self) -> usize {
        self.embedding_size
    }

    /// Non-linearity of the embedding and head layers.
    pub fn activation(&self) -> Activation {
        self.activation.0
    }

    pub fn min_std_dev(&self) -> f32 {
        self.min_std_dev
    }

    /// Zero belief and state for `batch` sequences: the usual episode seed.
    pub fn initial_state(&self, batch: usize, device: &B::Device) -> (Tensor<B, 2>, Tensor<B, 2>) {
        (
            Tensor::zeros([batch, self.belief_size], device),
            Tensor::zeros([batch, self.state_size], device),
        )
    }

    /// Advance one step.
    ///
    /// Prior noise is drawn before posterior noise. Fails with
    /// `ShapeMismatch` before any computation when an input is malformed.
    pub fn step<N: NoiseSource<B>>(&self, input: StepInput<B>, noise: &N) -> Result<StepOutput<B>> {
        let batch = input.prev_belief.dims()[0];
        self.check_step_shapes(batch, &input)?;
        self.advance(input, noise)
    }

    fn check_step_shapes(&self, batch: usize, input: &StepInput<B>) -> Result<()> {
        ensure_dims("prev_belief", [batch, self.belief_size], input.prev_belief.dims())?;
        ensure_dims("prev_state", [batch, self.state_size], input.prev_state.dims())?;
        ensure_dims("action", [batch, self.action_size], input.action.dims())?;
        if let Some(nonterminal) = &input.nonterminal {
            ensure_dims("nonterminal", [batch, 1], nonterminal.dims())?;
        }
        if let Some(embedding) = &input.embedding {
            ensure_dims("embedding", [batch, self.embedding_size], embedding.dims())?;
        }
        Ok(())
    }

    /// Transition over inputs whose shapes are already known to be valid.
    pub(crate) fn advance<N: NoiseSource<B>>(
        &self,
        input: StepInput<B>,
        noise: &N,
    ) -> Result<StepOutput<B>> {
        let StepInput {
            prev_belief,
            prev_state,
            action,
            nonterminal,
            embedding,
        } = input;

        let state = match nonterminal {
            Some(mask) => prev_state * mask.repeat_dim(1, self.state_size),
            None => prev_state,
        };

        let hidden = self
            .activation
            .0
            .apply(self.fc_embed_state_action.forward(Tensor::cat(vec![state, action], 1)));
        let belief = self.rnn.forward(hidden, prev_belief);

        let hidden = self
            .activation
            .0
            .apply(self.fc_embed_belief_prior.forward(belief.clone()));
        let prior = self.sample(self.fc_state_prior.forward(hidden), noise)?;

        let posterior = match embedding {
            Some(embedding) => {
                let hidden = self.activation.0.apply(
                    self.fc_embed_belief_posterior
                        .forward(Tensor::cat(vec![belief.clone(), embedding], 1)),
                );
                Some(self.sample(self.fc_state_posterior.forward(hidden), noise)?)
            }
            None => None,
        };

        Ok(StepOutput {
            belief,
            prior,
            posterior,
        })
    }

    fn sample<N: NoiseSource<B>>(&self, raw: Tensor<B, 2>, noise: &N) -> Result<LatentSample<B>> {
        let dist = DiagGaussian::from_raw(raw, self.state_size, self.min_std_dev)?;
        let state = dist.rsample(noise);
        let (mean, std_dev) = dist.into_parts();
        Ok(LatentSample {
            state,
            mean,
            std_dev,
        })
    }
}
