//! Apply per-step networks to whole time-major sequences.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Run `f` over every step of `[steps, batch, features]` at once by folding
/// time into the batch axis, returning `[steps, batch, out]`.
///
/// Decoders, reward and value heads take `[batch, features]`; this lets them
/// consume a [`Trajectory`](super::Trajectory) in one call.
///
/// An empty sequence (`steps == 0` or `batch == 0`) yields an empty output.
/// `f` then sees a single zero row, used only to read its output width.
pub fn time_distributed<B, F>(sequence: Tensor<B, 3>, f: F) -> Tensor<B, 3>
where
    B: Backend,
    F: FnOnce(Tensor<B, 2>) -> Tensor<B, 2>,
{
    let [steps, batch, features] = sequence.dims();
    if steps * batch == 0 {
        let device = sequence.device();
        let out_features = f(Tensor::zeros([1, features], &device)).dims()[1];
        return Tensor::zeros([steps, batch, out_features], &device);
    }

    let output = f(sequence.reshape([steps * batch, features]));
    let out_features = output.dims()[1];
    output.reshape([steps, batch, out_features])
}
