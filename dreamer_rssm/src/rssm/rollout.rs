//! Sequence rollout of the transition model.
//!
//! Time-major layout for `T` total steps (seed included):
//!
//! ```text
//! t          :  0    1    2   ...  T-1
//! actions    :  a0   a1  ...  a_{T-2}          [T-1, B, A]
//! nonterminal:  n0   n1  ...  n_{T-2}          [T-1, B, 1]
//! embeddings :       e0   e1  ...  e_{T-2}     [T-1, B, E]  (or [T, B, E])
//! output     :  -    x1   x2  ...  x_{T-1}     [T-1, B, _]
//! ```
//!
//! Slot 0 is the seed and is never emitted. At iteration `t` the step consumes
//! `actions[t]` and `nonterminals[t]` together with `embeddings[t]`, the
//! embedding paired with the belief produced at output slot `t + 1`. A
//! sequence of `T` embeddings is accepted; its last entry is never read.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::transition::{LatentSample, StepInput, TransitionModel};
use crate::error::{ensure_dims, Result};
use crate::noise::NoiseSource;

/// Inputs of a full rollout.
#[derive(Debug, Clone)]
pub struct RolloutInput<B: Backend> {
    /// Seed state `[batch, state_size]`.
    pub prev_state: Tensor<B, 2>,
    /// `[steps, batch, action_size]`
    pub actions: Tensor<B, 3>,
    /// Seed belief `[batch, belief_size]`.
    pub prev_belief: Tensor<B, 2>,
    /// `[steps, batch, embedding_size]`, one per output step. A trailing
    /// extra step (`steps + 1` in total) is accepted and ignored.
    pub embeddings: Option<Tensor<B, 3>>,
    /// `[steps, batch, 1]`, entry `t` masks the transition from `t` to `t + 1`.
    pub nonterminals: Option<Tensor<B, 3>>,
}

impl<B: Backend> RolloutInput<B> {
    /// Create rollout inputs without embeddings or masks.
    pub fn new(prev_state: Tensor<B, 2>, actions: Tensor<B, 3>, prev_belief: Tensor<B, 2>) -> Self {
        Self {
            prev_state,
            actions,
            prev_belief,
            embeddings: None,
            nonterminals: None,
        }
    }

    /// Set observation embeddings, requesting the posterior variant.
    pub fn with_embeddings(mut self, embeddings: Tensor<B, 3>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    /// Set nonterminal masks.
    pub fn with_nonterminals(mut self, nonterminals: Tensor<B, 3>) -> Self {
        self.nonterminals = Some(nonterminals);
        self
    }

    /// Number of transitions (`T - 1`).
    pub fn steps(&self) -> usize {
        self.actions.dims()[0]
    }
}

/// Stacked samples and parameters of one state sequence, each `[steps, batch, state_size]`.
#[derive(Debug, Clone)]
pub struct StateSequence<B: Backend> {
    pub states: Tensor<B, 3>,
    pub means: Tensor<B, 3>,
    pub std_devs: Tensor<B, 3>,
}

/// Result of [`TransitionModel::rollout`].
///
/// The posterior is present exactly when embeddings were supplied.
#[derive(Debug, Clone)]
pub struct Trajectory<B: Backend> {
    /// `[steps, batch, belief_size]`
    pub beliefs: Tensor<B, 3>,
    pub prior: StateSequence<B>,
    pub posterior: Option<StateSequence<B>>,
}

impl<B: Backend> Trajectory<B> {
    /// Whether this is the observation-conditioned variant.
    pub fn is_observed(&self) -> bool {
        self.posterior.is_some()
    }

    pub fn posterior(&self) -> Option<&StateSequence<B>> {
        self.posterior.as_ref()
    }

    /// Number of emitted steps (`T - 1`).
    pub fn len(&self) -> usize {
        self.beliefs.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `[steps, batch, belief_size + state_size]` model features: belief joined
    /// with the posterior state when observed, else the prior state.
    pub fn features(&self) -> Tensor<B, 3> {
        let states = self
            .posterior
            .as_ref()
            .unwrap_or(&self.prior)
            .states
            .clone();
        Tensor::cat(vec![self.beliefs.clone(), states], 2)
    }
}

/// Per-step samples gathered before stacking.
struct SequenceBuilder<B: Backend> {
    states: Vec<Tensor<B, 2>>,
    means: Vec<Tensor<B, 2>>,
    std_devs: Vec<Tensor<B, 2>>,
}

impl<B: Backend> SequenceBuilder<B> {
    fn with_capacity(steps: usize) -> Self {
        Self {
            states: Vec::with_capacity(steps),
            means: Vec::with_capacity(steps),
            std_devs: Vec::with_capacity(steps),
        }
    }

    fn push(&mut self, sample: LatentSample<B>) {
        self.states.push(sample.state);
        self.means.push(sample.mean);
        self.std_devs.push(sample.std_dev);
    }

    fn finish(self, shape: [usize; 2], device: &B::Device) -> StateSequence<B> {
        StateSequence {
            states: stack_steps(self.states, shape, device),
            means: stack_steps(self.means, shape, device),
            std_devs: stack_steps(self.std_devs, shape, device),
        }
    }
}

/// Stack `[batch, features]` steps along a new leading time axis.
/// An empty list gives `[0, batch, features]`.
fn stack_steps<B: Backend>(
    steps: Vec<Tensor<B, 2>>,
    [batch, features]: [usize; 2],
    device: &B::Device,
) -> Tensor<B, 3> {
    if steps.is_empty() {
        Tensor::zeros([0, batch, features], device)
    } else {
        Tensor::stack(steps, 0)
    }
}

/// Row `t` of a time-major tensor as `[batch, features]`.
fn at_step<B: Backend>(sequence: &Tensor<B, 3>, t: usize) -> Tensor<B, 2> {
    let [_, batch, features] = sequence.dims();
    sequence.clone().narrow(0, t, 1).reshape([batch, features])
}

impl<B: Backend> TransitionModel<B> {
    /// Roll the model forward over a whole action sequence.
    ///
    /// Uses the posterior of the previous step as the next input state when
    /// embeddings are supplied and the prior otherwise. All shapes are checked
    /// before the first step; `steps == 0` yields empty sequences.
    pub fn rollout<N: NoiseSource<B>>(
        &self,
        input: RolloutInput<B>,
        noise: &N,
    ) -> Result<Trajectory<B>> {
        let [steps, batch, _] = input.actions.dims();
        self.check_rollout_shapes(steps, batch, &input)?;

        let observed = input.embeddings.is_some();
        log::debug!(
            "RSSM rollout: steps={}, batch={}, observed={}, masked={}",
            steps,
            batch,
            observed,
            input.nonterminals.is_some()
        );

        let device = input.actions.device();
        let mut beliefs = Vec::with_capacity(steps);
        let mut prior = SequenceBuilder::with_capacity(steps);
        let mut posterior = SequenceBuilder::with_capacity(if observed { steps } else { 0 });

        let mut belief = input.prev_belief;
        let mut state = input.prev_state;

        for t in 0..steps {
            let mut step = StepInput::new(belief, state, at_step(&input.actions, t));
            if let Some(nonterminals) = &input.nonterminals {
                step = step.with_nonterminal(at_step(nonterminals, t));
            }
            if let Some(embeddings) = &input.embeddings {
                step = step.with_embedding(at_step(embeddings, t));
            }

            let out = self.advance(step, noise)?;
            log::trace!("RSSM rollout step {}/{}", t + 1, steps);

            state = match &out.posterior {
                Some(post) => post.state.clone(),
                None => out.prior.state.clone(),
            };
            belief = out.belief.clone();

            beliefs.push(out.belief);
            prior.push(out.prior);
            if let Some(post) = out.posterior {
                posterior.push(post);
            }
        }

        let state_shape = [batch, self.state_size()];
        Ok(Trajectory {
            beliefs: stack_steps(beliefs, [batch, self.belief_size()], &device),
            prior: prior.finish(state_shape, &device),
            posterior: observed.then(|| posterior.finish(state_shape, &device)),
        })
    }

    fn check_rollout_shapes(&self, steps: usize, batch: usize, input: &RolloutInput<B>) -> Result<()> {
        ensure_dims(
            "actions",
            [steps, batch, self.action_size()],
            input.actions.dims(),
        )?;
        ensure_dims("prev_state", [batch, self.state_size()], input.prev_state.dims())?;
        ensure_dims("prev_belief", [batch, self.belief_size()], input.prev_belief.dims())?;
        if let Some(embeddings) = &input.embeddings {
            let len = embeddings.dims()[0];
            let expected_len = if len == steps + 1 { len } else { steps };
            ensure_dims(
                "embeddings",
                [expected_len, batch, self.embedding_size()],
                embeddings.dims(),
            )?;
        }
        if let Some(nonterminals) = &input.nonterminals {
            ensure_dims("nonterminals", [steps, batch, 1], nonterminals.dims())?;
        }
        Ok(())
    }
}
