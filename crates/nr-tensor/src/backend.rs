use std::fmt::Debug;

use crate::error::Result;
use crate::storage::CpuStorage;

/// Trait for pluggable compute backends.
///
/// Operations take dtype-tagged storages and write into caller-provided
/// buffers. All operands of one call must share a dtype and an element count;
/// implementations report violations as `DTypeMismatch` / `ShapeMismatch`
/// rather than touching any buffer.
///
/// `negative_slope` is the leak coefficient ν, converted to the storage's
/// element type before use.
pub trait ComputeBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu", "cpu-parallel").
    fn name(&self) -> &str;

    /// BReLU forward: `y = clamp(x, 0, 1)` for ν = 0, otherwise
    /// `y = max(0, x) + ν * min(0, x)`.
    fn brelu_forward(&self, x: &CpuStorage, y: &mut CpuStorage, negative_slope: f32)
        -> Result<()>;

    /// BReLU forward, overwriting `x` with the output.
    fn brelu_forward_in_place(&self, x: &mut CpuStorage, negative_slope: f32) -> Result<()>;

    /// BReLU backward: `dx = dy` where `x > 0`, `dx = ν * dy` where `x <= 0`.
    ///
    /// - `dy`: gradient with respect to the forward output
    /// - `x`: the forward input
    /// - `dx`: receives the gradient with respect to `x`
    fn brelu_backward(
        &self,
        dy: &CpuStorage,
        x: &CpuStorage,
        dx: &mut CpuStorage,
        negative_slope: f32,
    ) -> Result<()>;

    /// BReLU backward, overwriting the output gradient `d` with the input
    /// gradient. The branch is chosen from the values in `x`.
    fn brelu_backward_in_place(
        &self,
        x: &CpuStorage,
        d: &mut CpuStorage,
        negative_slope: f32,
    ) -> Result<()>;
}
