//! Diagonal Gaussian with a stddev floor.
//!
//! Prior and posterior heads emit `2 * state_size` raw values per batch
//! element. The first half is the mean, the second half becomes the stddev
//! through `softplus(raw) + floor`, so every stddev is at least `floor`.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::ReparamDistribution;
use crate::error::{ensure_dims, Result};
use crate::nn::activation::softplus;
use crate::noise::NoiseSource;

/// ln(2π)
const LOG_2PI: f32 = 1.837_877_1;

/// Independent Gaussian per event dimension: `[batch, event]` parameters.
#[derive(Debug, Clone)]
pub struct DiagGaussian<B: Backend> {
    mean: Tensor<B, 2>,
    std_dev: Tensor<B, 2>,
}

impl<B: Backend> DiagGaussian<B> {
    /// Build from explicit parameters of matching shape.
    pub fn new(mean: Tensor<B, 2>, std_dev: Tensor<B, 2>) -> Result<Self> {
        ensure_dims("gaussian std_dev", mean.dims(), std_dev.dims())?;
        Ok(Self { mean, std_dev })
    }

    /// Parameters whose shapes the caller has already checked.
    pub(crate) fn from_checked(mean: Tensor<B, 2>, std_dev: Tensor<B, 2>) -> Self {
        Self { mean, std_dev }
    }

    /// Build from a raw head output `[batch, 2 * event_size]`.
    ///
    /// `std = softplus(raw_scale) + floor`.
    pub fn from_raw(raw: Tensor<B, 2>, event_size: usize, floor: f32) -> Result<Self> {
        let [batch, width] = raw.dims();
        ensure_dims("gaussian raw parameters", [batch, 2 * event_size], [batch, width])?;

        let mean = raw.clone().narrow(1, 0, event_size);
        let raw_scale = raw.narrow(1, event_size, event_size);
        let std_dev = softplus(raw_scale).add_scalar(floor);

        Ok(Self { mean, std_dev })
    }

    pub fn mean(&self) -> Tensor<B, 2> {
        self.mean.clone()
    }

    pub fn std_dev(&self) -> Tensor<B, 2> {
        self.std_dev.clone()
    }

    pub fn into_parts(self) -> (Tensor<B, 2>, Tensor<B, 2>) {
        (self.mean, self.std_dev)
    }

    /// `mean + std ⊙ noise` for caller-supplied noise of matching shape.
    pub fn rsample_with(&self, noise: Tensor<B, 2>) -> Tensor<B, 2> {
        self.mean.clone() + self.std_dev.clone() * noise
    }

    /// Closed-form entropy: `Σ ln σ + ½ D (1 + ln 2π)`, one per batch element.
    pub fn entropy(&self) -> Tensor<B, 1> {
        let [batch, event] = self.mean.dims();
        let constant = 0.5 * event as f32 * (1.0 + LOG_2PI);
        self.std_dev
            .clone()
            .log()
            .sum_dim(1)
            .reshape([batch])
            .add_scalar(constant)
    }

    /// Per-dimension log-density, `[batch, event]`.
    pub(crate) fn log_prob_per_dim(&self, value: Tensor<B, 2>) -> Tensor<B, 2> {
        let normalized = (value - self.mean.clone()) / self.std_dev.clone();
        normalized.powf_scalar(2.0).mul_scalar(-0.5) - self.std_dev.clone().log()
            - 0.5 * LOG_2PI
    }
}

impl<B: Backend> ReparamDistribution<B> for DiagGaussian<B> {
    fn batch_size(&self) -> usize {
        self.mean.dims()[0]
    }

    fn event_size(&self) -> usize {
        self.mean.dims()[1]
    }

    fn device(&self) -> B::Device {
        self.mean.device()
    }

    fn expand(&self, samples: usize) -> Self {
        Self {
            mean: self.mean.clone().repeat_dim(0, samples),
            std_dev: self.std_dev.clone().repeat_dim(0, samples),
        }
    }

    fn rsample<N: NoiseSource<B>>(&self, noise: &N) -> Tensor<B, 2> {
        let eps = noise.standard_normal_like(&self.mean);
        self.rsample_with(eps)
    }

    fn log_prob(&self, value: Tensor<B, 2>) -> Tensor<B, 1> {
        let batch = self.batch_size();
        self.log_prob_per_dim(value).sum_dim(1).reshape([batch])
    }
}
