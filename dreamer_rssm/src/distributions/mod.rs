//! Reparameterizable distributions over fixed-size vectors.
//!
//! - [`ReparamDistribution`]: the capability set a distribution must offer to
//!   be wrapped by [`SampleDist`]
//! - [`DiagGaussian`]: independent Gaussian with a stddev floor (prior and
//!   posterior states)
//! - [`SquashedGaussian`]: tanh-bounded Gaussian policy over action vectors
//! - [`SampleDist`]: Monte-Carlo mean, mode and entropy for any of the above
//!
//! Distributions are batched: parameters are `[batch, event]` and every
//! log-density query returns one value per batch element, treating the whole
//! event vector as a single joint outcome.

pub mod gaussian;
pub mod sample_dist;
pub mod squashed;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::noise::NoiseSource;

pub use gaussian::DiagGaussian;
pub use sample_dist::SampleDist;
pub use squashed::SquashedGaussian;

/// Capabilities required for Monte-Carlo approximation.
pub trait ReparamDistribution<B: Backend> {
    /// Number of independent distributions in the batch.
    fn batch_size(&self) -> usize;

    /// Size of one event (one joint sample).
    fn event_size(&self) -> usize;

    /// Device the parameters live on.
    fn device(&self) -> B::Device;

    /// Repeat the distribution over a leading sample axis.
    ///
    /// The result has batch size `samples * batch_size()`, ordered
    /// sample-major: row `i * batch_size() + b` is draw `i` of element `b`.
    fn expand(&self, samples: usize) -> Self
    where
        Self: Sized;

    /// Reparameterized sample `[batch, event]`.
    fn rsample<N: NoiseSource<B>>(&self, noise: &N) -> Tensor<B, 2>;

    /// Joint log-density of `value` `[batch, event]`, one per batch element.
    fn log_prob(&self, value: Tensor<B, 2>) -> Tensor<B, 1>;
}
