//! Monte-Carlo statistics for distributions without closed forms.
//!
//! After a non-linear bijection such as tanh, the mean, mode and entropy of a
//! distribution are no longer available analytically. [`SampleDist`] estimates
//! them from `samples` reparameterized draws per batch element:
//!
//! - `mean`: average of the draws. Unbiased, error O(1/√samples).
//! - `mode`: the draw with the highest log-density. Always one of the actual
//!   draws, never an interpolation. This is an approximation that does not
//!   converge to the true mode for continuous distributions and degrades for
//!   multi-modal or high-dimensional targets.
//! - `entropy`: `−mean(log p(draws))`, the Monte-Carlo estimate of
//!   `E[−log p(x)]`.
//!
//! Everything else is forwarded to the wrapped distribution unchanged.

use std::marker::PhantomData;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::ReparamDistribution;
use crate::config::{positive_count, PolicyConfig};
use crate::error::Result;
use crate::noise::NoiseSource;

/// Read-only Monte-Carlo view over a borrowed distribution.
#[derive(Debug)]
pub struct SampleDist<'a, B: Backend, D: ReparamDistribution<B>> {
    dist: &'a D,
    samples: usize,
    _backend: PhantomData<B>,
}

impl<'a, B: Backend, D: ReparamDistribution<B>> SampleDist<'a, B, D> {
    /// Wrap `dist`, drawing `samples` values per statistic. `samples` must be > 0.
    pub fn new(dist: &'a D, samples: usize) -> Result<Self> {
        positive_count("samples", samples)?;
        Ok(Self {
            dist,
            samples,
            _backend: PhantomData,
        })
    }

    /// Wrap `dist` with the sample count from `config`, validating all of `config`.
    pub fn from_config(dist: &'a D, config: &PolicyConfig) -> Result<Self> {
        config.validate()?;
        Self::new(dist, config.samples)
    }

    pub fn inner(&self) -> &'a D {
        self.dist
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Draws `[samples, batch, event]` and the expanded distribution they came from.
    fn draw<N: NoiseSource<B>>(&self, noise: &N) -> (Tensor<B, 3>, D) {
        let batch = self.dist.batch_size();
        let event = self.dist.event_size();
        let expanded = self.dist.expand(self.samples);
        let draws = expanded
            .rsample(noise)
            .reshape([self.samples, batch, event]);
        (draws, expanded)
    }

    /// Log-density of every draw, `[samples, batch]`.
    fn score(&self, expanded: &D, draws: Tensor<B, 3>) -> Tensor<B, 2> {
        let batch = self.dist.batch_size();
        let event = self.dist.event_size();
        expanded
            .log_prob(draws.reshape([self.samples * batch, event]))
            .reshape([self.samples, batch])
    }

    /// Monte-Carlo mean, `[batch, event]`.
    pub fn mean<N: NoiseSource<B>>(&self, noise: &N) -> Tensor<B, 2> {
        let (draws, _) = self.draw(noise);
        let [_, batch, event] = draws.dims();
        draws.mean_dim(0).reshape([batch, event])
    }

    /// Highest-density draw per batch element, `[batch, event]`.
    pub fn mode<N: NoiseSource<B>>(&self, noise: &N) -> Tensor<B, 2> {
        let (draws, expanded) = self.draw(noise);
        let [_, batch, event] = draws.dims();
        let log_probs = self.score(&expanded, draws.clone());

        let best = log_probs
            .argmax(0)
            .reshape([1, batch, 1])
            .repeat_dim(2, event);
        draws.gather(0, best).reshape([batch, event])
    }

    /// Monte-Carlo entropy, `[batch]`.
    pub fn entropy<N: NoiseSource<B>>(&self, noise: &N) -> Tensor<B, 1> {
        let (draws, expanded) = self.draw(noise);
        let batch = draws.dims()[1];
        self.score(&expanded, draws)
            .mean_dim(0)
            .reshape([batch])
            .neg()
    }

    // ------------------------------------------------------------------------
    // Forwarded to the wrapped distribution
    // ------------------------------------------------------------------------

    pub fn batch_size(&self) -> usize {
        self.dist.batch_size()
    }

    pub fn event_size(&self) -> usize {
        self.dist.event_size()
    }

    pub fn device(&self) -> B::Device {
        self.dist.device()
    }

    pub fn rsample<N: NoiseSource<B>>(&self, noise: &N) -> Tensor<B, 2> {
        self.dist.rsample(noise)
    }

    pub fn log_prob(&self, value: Tensor<B, 2>) -> Tensor<B, 1> {
        self.dist.log_prob(value)
    }
}
