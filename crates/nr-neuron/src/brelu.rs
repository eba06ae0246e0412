use log::{debug, trace};
use nr_tensor::{ComputeBackend, Tensor};

use crate::config::BReluConfig;
use crate::error::{NeuronError, Result};
use crate::layer::Layer;

/// Bilateral rectified linear unit.
///
/// Forward, elementwise:
/// - ν = 0: `y = min(max(0, x), 1)`
/// - ν ≠ 0: `y = max(0, x) + ν * min(0, x)`
///
/// Backward, elementwise, decided by the sign of the forward input `x`:
/// - `x > 0`: `dE/dx = dE/dy`
/// - `x <= 0`: `dE/dx = ν * dE/dy`
///
/// With ν = 0 the gradient still passes for `x >= 1` even though the forward
/// output saturates there, so the backward acts as a straight-through
/// estimator above the upper bound.
#[derive(Debug, Clone)]
pub struct BReluLayer {
    config: BReluConfig,
}

impl BReluLayer {
    pub const TYPE_NAME: &'static str = "BReLU";

    pub fn new(config: BReluConfig) -> Self {
        if config.negative_slope == 0.0 {
            debug!(
                "{}: clamped forward, gradient passes unclamped for x >= 1",
                Self::TYPE_NAME
            );
        } else {
            debug!(
                "{}: leaky forward with negative_slope={}",
                Self::TYPE_NAME,
                config.negative_slope
            );
        }
        Self { config }
    }

    pub fn config(&self) -> &BReluConfig {
        &self.config
    }

    pub fn negative_slope(&self) -> f32 {
        self.config.negative_slope
    }

    /// Forward pass where the top blob is the bottom blob: overwrites the
    /// blob's data with the activation.
    pub fn forward_in_place(&self, blob: &mut Tensor, backend: &dyn ComputeBackend) -> Result<()> {
        trace!(
            "{} forward in place: {} elements ({}) on {}",
            Self::TYPE_NAME,
            blob.numel(),
            blob.dtype(),
            backend.name()
        );
        backend.brelu_forward_in_place(blob.data_mut(), self.negative_slope())?;
        Ok(())
    }

    /// Backward pass where the top blob is the bottom blob: overwrites the
    /// blob's diff (dE/dy) with dE/dx.
    ///
    /// The branch is chosen from the blob's current data, which after an
    /// in-place forward is the output. That matches the input's sign only
    /// for ν >= 0.
    pub fn backward_in_place(
        &self,
        blob: &mut Tensor,
        propagate_down: bool,
        backend: &dyn ComputeBackend,
    ) -> Result<()> {
        if !propagate_down {
            trace!("{} backward in place skipped", Self::TYPE_NAME);
            return Ok(());
        }
        trace!(
            "{} backward in place: {} elements ({}) on {}",
            Self::TYPE_NAME,
            blob.numel(),
            blob.dtype(),
            backend.name()
        );
        let (x, d) = blob.data_and_diff_mut();
        backend.brelu_backward_in_place(x, d, self.negative_slope())?;
        Ok(())
    }
}

impl Default for BReluLayer {
    fn default() -> Self {
        Self::new(BReluConfig::default())
    }
}

impl Layer for BReluLayer {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn exact_num_bottom_blobs(&self) -> Option<usize> {
        Some(1)
    }

    fn exact_num_top_blobs(&self) -> Option<usize> {
        Some(1)
    }

    fn forward(
        &self,
        bottom: &[&Tensor],
        top: &mut [&mut Tensor],
        backend: &dyn ComputeBackend,
    ) -> Result<()> {
        self.check_blob_counts(bottom.len(), top.len())?;
        let x = bottom[0];
        trace!(
            "{} forward: {} elements ({}) on {}",
            Self::TYPE_NAME,
            x.numel(),
            x.dtype(),
            backend.name()
        );
        backend.brelu_forward(x.data(), top[0].data_mut(), self.negative_slope())?;
        Ok(())
    }

    fn backward(
        &self,
        top: &[&Tensor],
        propagate_down: &[bool],
        bottom: &mut [&mut Tensor],
        backend: &dyn ComputeBackend,
    ) -> Result<()> {
        self.check_blob_counts(bottom.len(), top.len())?;
        if propagate_down.len() != bottom.len() {
            return Err(NeuronError::PropagateCount {
                expected: bottom.len(),
                got: propagate_down.len(),
            });
        }
        if !propagate_down[0] {
            trace!("{} backward skipped: propagate_down is false", Self::TYPE_NAME);
            return Ok(());
        }

        let dy = top[0].diff();
        let (x, dx) = bottom[0].data_and_diff_mut();
        trace!(
            "{} backward: {} elements ({}) on {}",
            Self::TYPE_NAME,
            x.len(),
            x.dtype(),
            backend.name()
        );
        backend.brelu_backward(dy, x, dx, self.negative_slope())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use half::f16;
    use nr_tensor::{CpuBackend, DType, ParallelCpuBackend, Shape, TensorError};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const X: [f32; 5] = [-2.0, 0.0, 0.5, 1.0, 3.0];

    fn backends() -> Vec<Box<dyn ComputeBackend>> {
        vec![
            Box::new(CpuBackend::new()),
            Box::new(ParallelCpuBackend::new().with_chunk_size(2)),
        ]
    }

    fn blob(values: &[f32]) -> Tensor {
        Tensor::new(values.to_vec(), Shape::new(vec![values.len()]))
    }

    /// Output blob whose diff carries `dy`, as left by the layer above.
    fn top_with_diff(dy: &[f32]) -> Tensor {
        Tensor::from_data_and_diff(vec![0.0f32; dy.len()], dy.to_vec(), Shape::new(vec![dy.len()]))
            .unwrap()
    }

    #[test]
    fn test_type_name() {
        let layer = BReluLayer::default();
        assert_eq!(layer.type_name(), "BReLU");
        assert_eq!(layer.negative_slope(), 0.0);
    }

    #[test]
    fn test_forward_clamp_scenario() {
        let layer = BReluLayer::new(BReluConfig::default());
        for backend in backends() {
            let x = blob(&X);
            let mut y = Tensor::zeros(x.shape().clone(), DType::F32);
            layer.forward(&[&x], &mut [&mut y], backend.as_ref()).unwrap();
            assert_eq!(y.data_as::<f32>().unwrap(), &[0.0, 0.0, 0.5, 1.0, 1.0]);
            // bottom is read only
            assert_eq!(x.data_as::<f32>().unwrap(), &X);
        }
    }

    #[test]
    fn test_forward_leaky_scenario() {
        let layer = BReluLayer::new(BReluConfig::new(0.1));
        let x = blob(&X);
        let mut y = Tensor::zeros(x.shape().clone(), DType::F32);
        layer.forward(&[&x], &mut [&mut y], &CpuBackend::new()).unwrap();
        let y = y.data_as::<f32>().unwrap();
        assert_relative_eq!(y[0], -0.2);
        assert_eq!(&y[1..], &[0.0, 0.5, 1.0, 3.0]);
    }

    #[test]
    fn test_forward_repeatable() {
        let layer = BReluLayer::new(BReluConfig::new(0.3));
        let backend = CpuBackend::new();
        let x = blob(&X);
        let mut first = Tensor::zeros(x.shape().clone(), DType::F32);
        let mut second = Tensor::zeros(x.shape().clone(), DType::F32);
        layer.forward(&[&x], &mut [&mut first], &backend).unwrap();
        layer.forward(&[&x], &mut [&mut second], &backend).unwrap();
        assert_eq!(first.data(), second.data());
    }

    #[test]
    fn test_backward_scenario() {
        let layer = BReluLayer::new(BReluConfig::new(0.1));
        for backend in backends() {
            let top = top_with_diff(&[1.0; 5]);
            let mut x = blob(&X);
            layer
                .backward(&[&top], &[true], &mut [&mut x], backend.as_ref())
                .unwrap();
            let dx = x.diff_as::<f32>().unwrap();
            assert_relative_eq!(dx[0], 0.1);
            assert_relative_eq!(dx[1], 0.1);
            assert_eq!(&dx[2..], &[1.0, 1.0, 1.0]);
        }
    }

    #[test]
    fn test_backward_default_passes_gradient_above_one() {
        let layer = BReluLayer::default();
        let top = top_with_diff(&[2.0; 5]);
        let mut x = blob(&X);
        layer
            .backward(&[&top], &[true], &mut [&mut x], &CpuBackend::new())
            .unwrap();
        assert_eq!(x.diff_as::<f32>().unwrap(), &[0.0, 0.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_backward_uses_input_not_output() {
        // output data that disagrees in sign with the input must be ignored
        let layer = BReluLayer::default();
        let top = Tensor::from_data_and_diff(vec![5.0f32, -5.0], vec![1.0, 1.0], Shape::new(vec![2]))
            .unwrap();
        let mut x = blob(&[-1.0, 1.0]);
        layer
            .backward(&[&top], &[true], &mut [&mut x], &CpuBackend::new())
            .unwrap();
        assert_eq!(x.diff_as::<f32>().unwrap(), &[0.0, 1.0]);
    }

    #[test]
    fn test_backward_without_propagate_leaves_diff() {
        let layer = BReluLayer::new(BReluConfig::new(0.1));
        let sentinel = [-7.5f32, 42.0, f32::MAX, 1e-30, -0.0];
        for backend in backends() {
            let top = top_with_diff(&[1.0; 5]);
            let mut x =
                Tensor::from_data_and_diff(X.to_vec(), sentinel.to_vec(), Shape::new(vec![5]))
                    .unwrap();
            layer
                .backward(&[&top], &[false], &mut [&mut x], backend.as_ref())
                .unwrap();
            let diff = x.diff_as::<f32>().unwrap();
            for (got, want) in diff.iter().zip(&sentinel) {
                assert_eq!(got.to_bits(), want.to_bits());
            }
        }
    }

    #[test]
    fn test_empty_blob_is_noop() {
        let layer = BReluLayer::default();
        let backend = CpuBackend::new();
        let mut x = Tensor::zeros(Shape::new(vec![0, 3, 4, 4]), DType::F32);
        let mut y = Tensor::zeros(Shape::new(vec![0, 3, 4, 4]), DType::F32);
        layer.forward(&[&x], &mut [&mut y], &backend).unwrap();
        assert_eq!(y.numel(), 0);
        layer.backward(&[&y], &[true], &mut [&mut x], &backend).unwrap();
        assert!(x.diff().is_empty());
    }

    #[test]
    fn test_shape_is_opaque() {
        // N x C x H x W input, flat output of the same element count
        let layer = BReluLayer::default();
        let values: Vec<f64> = (0..24).map(|i| i as f64 / 10.0 - 1.0).collect();
        let x = Tensor::new(values.clone(), Shape::new(vec![2, 3, 2, 2]));
        let mut y = Tensor::zeros(Shape::new(vec![24]), DType::F64);
        layer.forward(&[&x], &mut [&mut y], &CpuBackend::new()).unwrap();
        for (&xi, &yi) in values.iter().zip(y.data_as::<f64>().unwrap()) {
            assert_eq!(yi, xi.clamp(0.0, 1.0));
        }
    }

    #[test]
    fn test_f16_blobs() {
        let layer = BReluLayer::new(BReluConfig::new(0.5));
        let backend = CpuBackend::new();
        let data: Vec<f16> = [-1.0f32, 2.0].iter().map(|&v| f16::from_f32(v)).collect();
        let x = Tensor::new(data, Shape::new(vec![2]));
        let mut y = Tensor::zeros(Shape::new(vec![2]), DType::F16);
        layer.forward(&[&x], &mut [&mut y], &backend).unwrap();
        let out: Vec<f32> = y.data_as::<f16>().unwrap().iter().map(|v| v.to_f32()).collect();
        assert_eq!(out, vec![-0.5, 2.0]);
    }

    #[test]
    fn test_wrong_blob_counts() {
        let layer = BReluLayer::default();
        let backend = CpuBackend::new();
        let a = blob(&[1.0]);
        let b = blob(&[1.0]);
        let mut y = blob(&[0.0]);

        let err = layer
            .forward(&[&a, &b], &mut [&mut y], &backend)
            .unwrap_err();
        assert!(matches!(
            err,
            NeuronError::BlobCount { role: "bottom", expected: 1, got: 2, .. }
        ));
        assert_eq!(
            err.to_string(),
            "BReLU layer takes exactly 1 bottom blob(s), got 2"
        );

        let err = layer.forward(&[&a], &mut [], &backend).unwrap_err();
        assert!(matches!(err, NeuronError::BlobCount { role: "top", got: 0, .. }));
    }

    #[test]
    fn test_wrong_propagate_count() {
        let layer = BReluLayer::default();
        let top = top_with_diff(&[1.0]);
        let mut x = blob(&[1.0]);
        let err = layer
            .backward(&[&top], &[], &mut [&mut x], &CpuBackend::new())
            .unwrap_err();
        assert!(matches!(
            err,
            NeuronError::PropagateCount { expected: 1, got: 0 }
        ));
    }

    #[test]
    fn test_mismatched_blobs_surface_tensor_errors() {
        let layer = BReluLayer::default();
        let backend = CpuBackend::new();
        let x = blob(&[1.0, 2.0]);

        let mut short = blob(&[0.0]);
        let err = layer.forward(&[&x], &mut [&mut short], &backend).unwrap_err();
        assert!(matches!(
            err,
            NeuronError::TensorError(TensorError::ShapeMismatch { .. })
        ));

        let mut wide = Tensor::zeros(Shape::new(vec![2]), DType::F64);
        let err = layer.forward(&[&x], &mut [&mut wide], &backend).unwrap_err();
        assert!(matches!(
            err,
            NeuronError::TensorError(TensorError::DTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_in_place_pair() {
        let layer = BReluLayer::new(BReluConfig::new(0.1));
        for backend in backends() {
            let mut t =
                Tensor::from_data_and_diff(X.to_vec(), vec![1.0; 5], Shape::new(vec![5])).unwrap();
            layer.forward_in_place(&mut t, backend.as_ref()).unwrap();
            let y = t.data_as::<f32>().unwrap();
            assert_relative_eq!(y[0], -0.2);
            assert_eq!(&y[1..], &[0.0, 0.5, 1.0, 3.0]);

            layer.backward_in_place(&mut t, true, backend.as_ref()).unwrap();
            let dx = t.diff_as::<f32>().unwrap();
            assert_relative_eq!(dx[0], 0.1);
            assert_relative_eq!(dx[1], 0.1);
            assert_eq!(&dx[2..], &[1.0, 1.0, 1.0]);
        }
    }

    #[test]
    fn test_backward_in_place_without_propagate() {
        let layer = BReluLayer::default();
        let mut t =
            Tensor::from_data_and_diff(X.to_vec(), vec![9.0; 5], Shape::new(vec![5])).unwrap();
        layer
            .backward_in_place(&mut t, false, &CpuBackend::new())
            .unwrap();
        assert_eq!(t.diff_as::<f32>().unwrap(), &[9.0; 5]);
    }

    #[test]
    fn test_usable_as_trait_object() {
        let layers: Vec<Box<dyn Layer>> = vec![Box::new(BReluLayer::default())];
        let x = blob(&[0.5]);
        let mut y = blob(&[0.0]);
        for layer in &layers {
            assert_eq!(layer.exact_num_bottom_blobs(), Some(1));
            layer.forward(&[&x], &mut [&mut y], &CpuBackend::new()).unwrap();
        }
        assert_eq!(y.data_as::<f32>().unwrap(), &[0.5]);
    }

    #[test]
    fn test_random_blobs_follow_elementwise_rule() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 2_000;
        let x: Vec<f64> = (0..n).map(|_| rng.gen_range(-4.0..4.0)).collect();
        let dy: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let slope = 0.2f32;
        let nu = slope as f64;
        let layer = BReluLayer::new(BReluConfig::new(slope));

        for backend in backends() {
            let bottom = Tensor::new(x.clone(), Shape::new(vec![4, 5, 10, 10]));
            let mut top = Tensor::zeros(Shape::new(vec![n]), DType::F64);
            layer.forward(&[&bottom], &mut [&mut top], backend.as_ref()).unwrap();
            for (&xi, &yi) in x.iter().zip(top.data_as::<f64>().unwrap()) {
                let expected = xi.max(0.0) + nu * xi.min(0.0);
                assert_relative_eq!(yi, expected);
            }

            let top =
                Tensor::from_data_and_diff(vec![0.0f64; n], dy.clone(), Shape::new(vec![n])).unwrap();
            let mut bottom = bottom;
            layer
                .backward(&[&top], &[true], &mut [&mut bottom], backend.as_ref())
                .unwrap();
            let dx = bottom.diff_as::<f64>().unwrap();
            for i in 0..n {
                let expected = if x[i] > 0.0 { dy[i] } else { nu * dy[i] };
                assert_eq!(dx[i], expected);
            }
        }
    }
}
