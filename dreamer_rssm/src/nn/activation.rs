//! Pointwise non-linearities selectable by name.
//!
//! The dynamics model takes its hidden-layer activation from configuration,
//! so the supported set is closed and parsed up front. An unknown name is a
//! configuration error raised before any tensor is touched.

use std::fmt;
use std::str::FromStr;

use burn::tensor::activation::{gelu, leaky_relu, relu, sigmoid, silu};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::error::DreamerError;

/// Negative slope used by [`Activation::LeakyRelu`].
const LEAKY_RELU_SLOPE: f64 = 0.01;

/// Supported hidden-layer activations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Activation {
    #[default]
    Relu,
    Elu,
    Tanh,
    Sigmoid,
    Gelu,
    Silu,
    LeakyRelu,
    Softplus,
}

impl Activation {
    /// Every supported activation, in declaration order.
    pub const ALL: [Activation; 8] = [
        Activation::Relu,
        Activation::Elu,
        Activation::Tanh,
        Activation::Sigmoid,
        Activation::Gelu,
        Activation::Silu,
        Activation::LeakyRelu,
        Activation::Softplus,
    ];

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Relu => "relu",
            Self::Elu => "elu",
            Self::Tanh => "tanh",
            Self::Sigmoid => "sigmoid",
            Self::Gelu => "gelu",
            Self::Silu => "silu",
            Self::LeakyRelu => "leaky_relu",
            Self::Softplus => "softplus",
        }
    }

    /// Apply the activation elementwise.
    pub fn apply<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Self::Relu => relu(x),
            // elu(x) = max(x, 0) + (exp(min(x, 0)) - 1), alpha = 1
            Self::Elu => x.clone().clamp_min(0.0) + x.clamp_max(0.0).exp().sub_scalar(1.0),
            Self::Tanh => x.tanh(),
            Self::Sigmoid => sigmoid(x),
            Self::Gelu => gelu(x),
            Self::Silu => silu(x),
            Self::LeakyRelu => leaky_relu(x, LEAKY_RELU_SLOPE),
            Self::Softplus => softplus(x),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = DreamerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| {
                let supported: Vec<&str> = Self::ALL.iter().map(|a| a.name()).collect();
                DreamerError::config(
                    "activation",
                    format!("unknown activation '{}', expected one of {:?}", s, supported),
                )
            })
    }
}

impl TryFrom<String> for Activation {
    type Error = DreamerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Activation> for String {
    fn from(value: Activation) -> Self {
        value.name().to_string()
    }
}

/// Numerically stable softplus: `log(1 + exp(x)) = max(x, 0) + log1p(exp(-|x|))`.
///
/// Burn's `activation::softplus` exponentiates `x` directly and overflows to
/// infinity for large inputs, which would break the stddev floor guarantee.
pub fn softplus<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    x.clone().clamp_min(0.0) + x.abs().neg().exp().log1p()
}

/// Scalar counterpart of [`softplus`], used for configuration-time constants.
pub fn softplus_scalar(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// Inverse of softplus: `log(exp(y) - 1)` for `y > 0`.
///
/// Written as `y + log(1 - exp(-y))` so large `y` does not overflow.
pub fn inverse_softplus(y: f64) -> f64 {
    y + (-(-y).exp()).ln_1p()
}
