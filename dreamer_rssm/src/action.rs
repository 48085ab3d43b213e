//! Per-step action selection from a policy distribution.
//!
//! - [`ActionSelection::Greedy`]: the Monte-Carlo mode of the policy
//! - [`ActionSelection::Explore`]: a policy sample perturbed by Gaussian noise
//!   of fixed scale, clamped back to `[-1, 1]`

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::distributions::{ReparamDistribution, SampleDist};
use crate::error::{DreamerError, Result};
use crate::noise::NoiseSource;

/// Default exploration noise scale.
pub const DEFAULT_EXPLORATION_NOISE: f32 = 0.3;

/// How an action is picked from the policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSelection {
    Greedy,
    Explore { noise_amount: f32 },
}

impl Default for ActionSelection {
    fn default() -> Self {
        Self::Greedy
    }
}

impl ActionSelection {
    pub fn explore() -> Self {
        Self::Explore {
            noise_amount: DEFAULT_EXPLORATION_NOISE,
        }
    }

    /// Noise scale must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Greedy => Ok(()),
            Self::Explore { noise_amount } if noise_amount.is_finite() && noise_amount >= 0.0 => {
                Ok(())
            }
            Self::Explore { noise_amount } => Err(DreamerError::config(
                "noise_amount",
                format!("must be finite and >= 0, got {}", noise_amount),
            )),
        }
    }
}

/// Pick one action per batch element, `[batch, action_dim]`.
pub fn select_action<B, D, N>(
    policy: &SampleDist<'_, B, D>,
    selection: ActionSelection,
    noise: &N,
) -> Result<Tensor<B, 2>>
where
    B: Backend,
    D: ReparamDistribution<B>,
    N: NoiseSource<B>,
{
    selection.validate()?;
    let action = match selection {
        ActionSelection::Greedy => policy.mode(noise),
        ActionSelection::Explore { noise_amount } => {
            let sample = policy.rsample(noise);
            let perturbation = noise.standard_normal_like(&sample).mul_scalar(noise_amount);
            (sample + perturbation).clamp(-1.0, 1.0)
        }
    };
    Ok(action)
}
