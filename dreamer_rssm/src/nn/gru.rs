//! Gated recurrent unit used as the belief recurrence.
//!
//! Burn ships an LSTM but no single-step GRU, so the cell is assembled from
//! `Linear` layers. Gate equations follow the common `GRUCell` form with
//! separate input and hidden biases:
//!
//! ```text
//! r  = σ(W_ir x + b_ir + W_hr h + b_hr)
//! z  = σ(W_iz x + b_iz + W_hz h + b_hz)
//! n  = tanh(W_in x + b_in + r ⊙ (W_hn h + b_hn))
//! h' = (1 - z) ⊙ n + z ⊙ h
//! ```
//!
//! `with_bias(false)` removes the input and the hidden biases together.
//!
//! The cell holds no randomness: identical inputs and parameters give
//! identical outputs.

use burn::module::Module;
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Configuration for [`GruCell`].
#[derive(Debug, Clone)]
pub struct GruCellConfig {
    /// Input feature size.
    pub d_input: usize,
    /// Hidden state size.
    pub d_hidden: usize,
    /// Whether the gates carry biases.
    pub bias: bool,
    /// Parameter initializer. `None` keeps Burn's `Linear` default.
    pub initializer: Option<Initializer>,
}

impl GruCellConfig {
    /// Create new GRU config.
    pub fn new(d_input: usize, d_hidden: usize) -> Self {
        Self {
            d_input,
            d_hidden,
            bias: true,
            initializer: None,
        }
    }

    /// Set bias option for every gate, input and hidden side alike.
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    /// Override the initializer of every gate weight and bias.
    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = Some(initializer);
        self
    }

    fn linear<B: Backend>(&self, d_in: usize, device: &B::Device) -> Linear<B> {
        let mut config = LinearConfig::new(d_in, self.d_hidden).with_bias(self.bias);
        if let Some(initializer) = &self.initializer {
            config = config.with_initializer(initializer.clone());
        }
        config.init(device)
    }

    /// Initialize a new GRU cell.
    pub fn init<B: Backend>(&self, device: &B::Device) -> GruCell<B> {
        GruCell {
            reset_input: self.linear(self.d_input, device),
            reset_hidden: self.linear(self.d_hidden, device),
            update_input: self.linear(self.d_input, device),
            update_hidden: self.linear(self.d_hidden, device),
            candidate_input: self.linear(self.d_input, device),
            candidate_hidden: self.linear(self.d_hidden, device),
            d_input: self.d_input,
            d_hidden: self.d_hidden,
        }
    }
}

/// Single-step GRU cell.
#[derive(Module, Debug)]
pub struct GruCell<B: Backend> {
    reset_input: Linear<B>,
    reset_hidden: Linear<B>,
    update_input: Linear<B>,
    update_hidden: Linear<B>,
    candidate_input: Linear<B>,
    candidate_hidden: Linear<B>,
    #[module(skip)]
    d_input: usize,
    #[module(skip)]
    d_hidden: usize,
}

impl<B: Backend> GruCell<B> {
    /// Advance the hidden state by one step.
    ///
    /// # Arguments
    /// * `input` - `[batch, d_input]`
    /// * `hidden` - `[batch, d_hidden]`
    ///
    /// # Returns
    /// Next hidden state `[batch, d_hidden]`.
    pub fn forward(&self, input: Tensor<B, 2>, hidden: Tensor<B, 2>) -> Tensor<B, 2> {
        let r = sigmoid(
            self.reset_input.forward(input.clone()) + self.reset_hidden.forward(hidden.clone()),
        );
        let z = sigmoid(
            self.update_input.forward(input.clone()) + self.update_hidden.forward(hidden.clone()),
        );
        let n = (self.candidate_input.forward(input)
            + r * self.candidate_hidden.forward(hidden.clone()))
        .tanh();

        // (1 - z) ⊙ n + z ⊙ h
        z.clone().neg().add_scalar(1.0) * n + z * hidden
    }

    pub fn input_size(&self) -> usize {
        self.d_input
    }

    pub fn hidden_size(&self) -> usize {
        self.d_hidden
    }
}
