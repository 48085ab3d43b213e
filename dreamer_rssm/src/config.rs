//! Configuration for the dynamics model and the policy distribution.
//!
//! Both configs are plain structs with `with_*` builders. Call
//! [`RssmConfig::build`] / [`PolicyConfig::build`] (or `validate`) before
//! use so that bad values fail before any data-dependent computation.
//!
//! # Example
//!
//! ```rust
//! use dreamer_rssm::{Activation, PolicyConfig, RssmConfig};
//!
//! let rssm = RssmConfig::new(6)
//!     .with_belief_size(64)
//!     .with_state_size(16)
//!     .with_activation(Activation::Elu)
//!     .build()
//!     .unwrap();
//! assert_eq!(rssm.action_size, 6);
//!
//! let policy = PolicyConfig::default().with_samples(32).build().unwrap();
//! assert!((policy.raw_init_bias() - (5.0f64.exp() - 1.0).ln()).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{DreamerError, Result};
use crate::nn::activation::{inverse_softplus, Activation};

// ============================================================================
// RSSM Configuration
// ============================================================================

/// Sizes and shaping for the recurrent state-space model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RssmConfig {
    /// Deterministic belief (GRU hidden) size.
    pub belief_size: usize,
    /// Stochastic state size.
    pub state_size: usize,
    /// Action vector size.
    pub action_size: usize,
    /// Hidden layer width of the prior/posterior heads.
    pub hidden_size: usize,
    /// Observation embedding size produced by the external encoder.
    pub embedding_size: usize,
    /// Hidden-layer non-linearity.
    pub activation: Activation,
    /// Floor added to every prior/posterior stddev.
    pub min_std_dev: f32,
}

impl Default for RssmConfig {
    fn default() -> Self {
        Self {
            belief_size: 200,
            state_size: 30,
            action_size: 1,
            hidden_size: 400,
            embedding_size: 1024,
            activation: Activation::Relu,
            min_std_dev: 0.1,
        }
    }
}

impl RssmConfig {
    /// Default sizes for the given action dimensionality.
    pub fn new(action_size: usize) -> Self {
        Self {
            action_size,
            ..Default::default()
        }
    }

    /// Set belief size.
    pub fn with_belief_size(mut self, belief_size: usize) -> Self {
        self.belief_size = belief_size;
        self
    }

    /// Set stochastic state size.
    pub fn with_state_size(mut self, state_size: usize) -> Self {
        self.state_size = state_size;
        self
    }

    /// Set action size.
    pub fn with_action_size(mut self, action_size: usize) -> Self {
        self.action_size = action_size;
        self
    }

    /// Set hidden layer width.
    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    /// Set observation embedding size.
    pub fn with_embedding_size(mut self, embedding_size: usize) -> Self {
        self.embedding_size = embedding_size;
        self
    }

    /// Set hidden-layer activation.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Set the stddev floor.
    pub fn with_min_std_dev(mut self, min_std_dev: f32) -> Self {
        self.min_std_dev = min_std_dev;
        self
    }

    /// Validate all parameters.
    ///
    /// # Validation Rules
    /// - Every size must be > 0
    /// - `min_std_dev` must be finite and > 0
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("belief_size", self.belief_size),
            ("state_size", self.state_size),
            ("action_size", self.action_size),
            ("hidden_size", self.hidden_size),
            ("embedding_size", self.embedding_size),
        ];
        for (field, value) in sizes {
            positive_count(field, value)?;
        }
        positive_scale("min_std_dev", self.min_std_dev as f64)
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
}

// ============================================================================
// Policy Distribution Configuration
// ============================================================================

/// Shaping of the squashed Gaussian policy and its Monte-Carlo statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Pre-squash mean is bounded to `(-mean_scale, mean_scale)`.
    pub mean_scale: f32,
    /// Floor added to the policy stddev.
    pub min_std: f32,
    /// Stddev produced when the raw scale output is zero.
    pub init_std: f32,
    /// Draws used by the Monte-Carlo mean/mode/entropy estimates.
    pub samples: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            mean_scale: 5.0,
            min_std: 1e-4,
            init_std: 5.0,
            samples: 100,
        }
    }
}

impl PolicyConfig {
    /// Create new policy config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pre-squash mean bound.
    pub fn with_mean_scale(mut self, mean_scale: f32) -> Self {
        self.mean_scale = mean_scale;
        self
    }

    /// Set the policy stddev floor.
    pub fn with_min_std(mut self, min_std: f32) -> Self {
        self.min_std = min_std;
        self
    }

    /// Set the stddev at a zero raw scale.
    pub fn with_init_std(mut self, init_std: f32) -> Self {
        self.init_std = init_std;
        self
    }

    /// Set Monte-Carlo sample count.
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    /// Bias added to the raw scale before softplus: `ln(exp(init_std) - 1)`.
    ///
    /// Depends on configuration only. With a zero raw scale the resulting
    /// stddev is `init_std + min_std`.
    pub fn raw_init_bias(&self) -> f64 {
        inverse_softplus(self.init_std as f64)
    }

    /// Validate all parameters.
    ///
    /// # Validation Rules
    /// - `mean_scale`, `min_std` and `init_std` must be finite and > 0
    /// - `samples` must be > 0
    pub fn validate(&self) -> Result<()> {
        self.validate_shaping()?;
        positive_count("samples", self.samples)?;
        if self.samples < 10 {
            log::warn!(
                "PolicyConfig.samples = {} gives coarse Monte-Carlo mean/mode/entropy estimates",
                self.samples
            );
        }
        Ok(())
    }

    /// Validate the distribution shaping only: `mean_scale`, `min_std` and
    /// `init_std` must be finite and > 0.
    pub fn validate_shaping(&self) -> Result<()> {
        positive_scale("mean_scale", self.mean_scale as f64)?;
        positive_scale("min_std", self.min_std as f64)?;
        positive_scale("init_std", self.init_std as f64)
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub(crate) fn positive_count(field: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(DreamerError::config(field, "must be > 0, got 0"));
    }
    Ok(())
}

fn positive_scale(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DreamerError::config(
            field,
            format!("must be finite and > 0, got {}", value),
        ));
    }
    Ok(())
}
