//! Tanh-squashed Gaussian policy distribution.
//!
//! Raw `(mean, scale)` outputs of the action backbone are shaped before the
//! base Gaussian is built:
//!
//! ```text
//! mean' = mean_scale · tanh(mean / mean_scale)
//! std   = softplus(scale + ln(e^init_std − 1)) + min_std
//! a     = tanh(u),  u ~ N(mean', std)
//! ```
//!
//! Bounding the mean keeps `u` away from the region where tanh is flat and
//! its inverse is ill-conditioned. The inverse-softplus bias makes a zero raw
//! scale produce `init_std`.
//!
//! # Log Probability Correction
//!
//! ```text
//! log p(a) = Σ_d [ log N(u_d; mean'_d, std_d) − log(1 − tanh²(u_d)) ]
//! log(1 − tanh²(u)) = 2 · (ln 2 − u − softplus(−2u))
//! ```
//!
//! Mean, mode and entropy have no closed form here; wrap the distribution in
//! [`SampleDist`](super::SampleDist) for Monte-Carlo estimates.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::gaussian::DiagGaussian;
use super::ReparamDistribution;
use crate::config::PolicyConfig;
use crate::error::{ensure_dims, Result};
use crate::nn::activation::softplus;
use crate::noise::NoiseSource;

/// Distance kept from ±1. `tanh` rounds to exactly ±1 in `f32` once
/// `|u| > ~9`, which would put samples on the boundary.
const EPSILON: f32 = 1e-6;

/// Squashed Gaussian over `[batch, action_dim]`, support `(-1, 1)^action_dim`.
#[derive(Debug, Clone)]
pub struct SquashedGaussian<B: Backend> {
    base: DiagGaussian<B>,
}

impl<B: Backend> SquashedGaussian<B> {
    /// Build from raw backbone outputs of equal shape `[batch, action_dim]`.
    ///
    /// Fails with `InvalidConfiguration` unless `mean_scale`, `min_std` and
    /// `init_std` are finite and positive.
    pub fn from_raw(
        mean: Tensor<B, 2>,
        raw_scale: Tensor<B, 2>,
        config: &PolicyConfig,
    ) -> Result<Self> {
        config.validate_shaping()?;
        ensure_dims("policy raw scale", mean.dims(), raw_scale.dims())?;

        let mean_scale = config.mean_scale;
        let bounded_mean = mean.div_scalar(mean_scale).tanh().mul_scalar(mean_scale);
        let std_dev = softplus(raw_scale.add_scalar(config.raw_init_bias() as f32))
            .add_scalar(config.min_std);

        let base = DiagGaussian::new(bounded_mean, std_dev)?;
        Ok(Self { base })
    }

    /// Build from a single backbone output `[batch, 2 * action_dim]`, mean first.
    pub fn from_chunked(raw: Tensor<B, 2>, action_dim: usize, config: &PolicyConfig) -> Result<Self> {
        let [batch, width] = raw.dims();
        ensure_dims("policy raw parameters", [batch, 2 * action_dim], [batch, width])?;

        let mean = raw.clone().narrow(1, 0, action_dim);
        let raw_scale = raw.narrow(1, action_dim, action_dim);
        Self::from_raw(mean, raw_scale, config)
    }

    /// The pre-squash Gaussian.
    pub fn base(&self) -> &DiagGaussian<B> {
        &self.base
    }

    /// Bounded pre-squash mean, `[batch, action_dim]`.
    pub fn pre_squash_mean(&self) -> Tensor<B, 2> {
        self.base.mean()
    }

    /// Pre-squash stddev, `[batch, action_dim]`. Never below `min_std`.
    pub fn std_dev(&self) -> Tensor<B, 2> {
        self.base.std_dev()
    }

    /// Sample and score in one pass, scoring on the pre-squash value.
    ///
    /// Avoids the `atanh` round trip of [`ReparamDistribution::log_prob`].
    pub fn rsample_with_log_prob<N: NoiseSource<B>>(
        &self,
        noise: &N,
    ) -> (Tensor<B, 2>, Tensor<B, 1>) {
        let pre_squash = self.base.rsample(noise);
        let log_prob = self.log_prob_pre_squash(pre_squash.clone());
        (squash(pre_squash), log_prob)
    }

    fn log_prob_pre_squash(&self, pre_squash: Tensor<B, 2>) -> Tensor<B, 1> {
        let batch = self.batch_size();
        let gaussian = self.base.log_prob_per_dim(pre_squash.clone());
        (gaussian - log_abs_det_jacobian(pre_squash))
            .sum_dim(1)
            .reshape([batch])
    }
}

impl<B: Backend> ReparamDistribution<B> for SquashedGaussian<B> {
    fn batch_size(&self) -> usize {
        self.base.batch_size()
    }

    fn event_size(&self) -> usize {
        self.base.event_size()
    }

    fn device(&self) -> B::Device {
        self.base.device()
    }

    fn expand(&self, samples: usize) -> Self {
        Self {
            base: self.base.expand(samples),
        }
    }

    fn rsample<N: NoiseSource<B>>(&self, noise: &N) -> Tensor<B, 2> {
        squash(self.base.rsample(noise))
    }

    fn log_prob(&self, value: Tensor<B, 2>) -> Tensor<B, 1> {
        self.log_prob_pre_squash(atanh(value))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn squash<B: Backend>(pre_squash: Tensor<B, 2>) -> Tensor<B, 2> {
    pre_squash.tanh().clamp(-1.0 + EPSILON, 1.0 - EPSILON)
}

/// `log |d tanh(u) / du| = 2 · (ln 2 − u − softplus(−2u))`, per dimension.
fn log_abs_det_jacobian<B: Backend>(u: Tensor<B, 2>) -> Tensor<B, 2> {
    (softplus(u.clone().mul_scalar(-2.0)) + u)
        .neg()
        .add_scalar(std::f32::consts::LN_2)
        .mul_scalar(2.0)
}

/// `atanh(a) = ½ (log1p(a) − log1p(−a))`, with `a` pulled inside `(-1, 1)`.
fn atanh<B: Backend>(a: Tensor<B, 2>) -> Tensor<B, 2> {
    let a = a.clamp(-1.0 + EPSILON, 1.0 - EPSILON);
    (a.clone().log1p() - a.neg().log1p()).mul_scalar(0.5)
}
