use nr_tensor::{ComputeBackend, Tensor};

use crate::error::{NeuronError, Result};

/// Trait for layers the engine drives through forward and backward passes.
///
/// The engine owns every tensor. A layer reads its bottom (input) blobs and
/// writes its top (output) blobs on the forward pass; on the backward pass it
/// reads the top blobs' diffs and fills the bottom blobs' diffs.
pub trait Layer: Send + Sync {
    /// Identifier of this layer kind, as used in network definitions.
    fn type_name(&self) -> &'static str;

    /// Number of bottom blobs this layer requires, if fixed.
    fn exact_num_bottom_blobs(&self) -> Option<usize> {
        None
    }

    /// Number of top blobs this layer requires, if fixed.
    fn exact_num_top_blobs(&self) -> Option<usize> {
        None
    }

    /// Check blob counts against `exact_num_bottom_blobs` / `exact_num_top_blobs`.
    fn check_blob_counts(&self, n_bottom: usize, n_top: usize) -> Result<()> {
        let checks = [
            ("bottom", self.exact_num_bottom_blobs(), n_bottom),
            ("top", self.exact_num_top_blobs(), n_top),
        ];
        for (role, expected, got) in checks {
            if let Some(expected) = expected {
                if expected != got {
                    return Err(NeuronError::BlobCount {
                        layer: self.type_name(),
                        role,
                        expected,
                        got,
                    });
                }
            }
        }
        Ok(())
    }

    /// Compute top blob data from bottom blob data.
    fn forward(
        &self,
        bottom: &[&Tensor],
        top: &mut [&mut Tensor],
        backend: &dyn ComputeBackend,
    ) -> Result<()>;

    /// Compute bottom blob diffs from top blob diffs.
    ///
    /// `propagate_down[i]` says whether bottom blob `i` wants a gradient; a
    /// bottom whose flag is false must be left untouched.
    fn backward(
        &self,
        top: &[&Tensor],
        propagate_down: &[bool],
        bottom: &mut [&mut Tensor],
        backend: &dyn ComputeBackend,
    ) -> Result<()>;
}
