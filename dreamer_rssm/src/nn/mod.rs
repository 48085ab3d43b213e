//! Neural network building blocks for the dynamics model.
//!
//! - [`activation`]: named pointwise non-linearities and a stable softplus
//! - [`gru`]: single-step GRU cell for the belief recurrence

pub mod activation;
pub mod gru;

pub use activation::{inverse_softplus, softplus, softplus_scalar, Activation};
pub use gru::{GruCell, GruCellConfig};
