//! Recurrent state-space model.
//!
//! - [`TransitionModel::step`]: one belief update with prior and optional
//!   posterior state samples
//! - [`TransitionModel::rollout`]: the step applied over a whole action
//!   sequence, returning stacked [`Trajectory`] tensors
//! - [`time_distributed`]: run per-step heads over a rollout's output

pub mod rollout;
pub mod sequence;
pub mod transition;

pub use rollout::{RolloutInput, StateSequence, Trajectory};
pub use sequence::time_distributed;
pub use transition::{LatentSample, StepInput, StepOutput, TransitionModel, TransitionModelConfig};

#[cfg(test)]
mod tests;
