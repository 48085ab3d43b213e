//! Standard-normal noise for reparameterized sampling.
//!
//! Every stochastic quantity in this crate is written as
//! `mean + std ⊙ ε` with `ε ~ N(0, I)` drawn from a [`NoiseSource`]. The noise
//! tensor is created from plain data, so an autodiff backend treats it as a
//! constant and gradients flow only through `mean` and `std`.
//!
//! - [`BackendNoise`] uses the backend's own generator (`Tensor::random`).
//! - [`SeededNoise`] owns a seeded generator behind a mutex. One instance can
//!   be shared between threads, and two instances with the same seed replay
//!   the same draws.

use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor, TensorData};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Source of independent standard-normal noise.
pub trait NoiseSource<B: Backend> {
    /// Draw a fresh tensor of i.i.d. `N(0, 1)` values.
    fn standard_normal<const D: usize>(&self, shape: [usize; D], device: &B::Device)
        -> Tensor<B, D>;

    /// Draw noise with the shape and device of `like`.
    fn standard_normal_like<const D: usize>(&self, like: &Tensor<B, D>) -> Tensor<B, D> {
        self.standard_normal(like.dims(), &like.device())
    }
}

/// Noise from the backend's global generator. Fresh on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendNoise;

impl<B: Backend> NoiseSource<B> for BackendNoise {
    fn standard_normal<const D: usize>(
        &self,
        shape: [usize; D],
        device: &B::Device,
    ) -> Tensor<B, D> {
        Tensor::random(shape, Distribution::Normal(0.0, 1.0), device)
    }
}

/// Noise from a caller-seeded generator.
///
/// Draws are serialized through a mutex, so concurrent callers never race on
/// the generator state. Cross-thread draw order is whatever order the lock is
/// acquired in.
#[derive(Debug)]
pub struct SeededNoise {
    rng: Mutex<StdRng>,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Restart the stream from `seed`.
    pub fn reseed(&self, seed: u64) {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
    }

    fn draw(&self, n: usize) -> Vec<f32> {
        let mut rng = self.rng.lock();
        (0..n).map(|_| rng.sample::<f32, _>(StandardNormal)).collect()
    }
}

impl<B: Backend> NoiseSource<B> for SeededNoise {
    fn standard_normal<const D: usize>(
        &self,
        shape: [usize; D],
        device: &B::Device,
    ) -> Tensor<B, D> {
        let n = shape.iter().product();
        let values = self.draw(n);
        Tensor::from_data(TensorData::new(values, shape), device)
    }
}
