use rayon::prelude::*;

use super::{gradient_operands, unary, unary_operands};
use crate::backend::ComputeBackend;
use crate::dtype::Element;
use crate::error::Result;
use crate::storage::CpuStorage;

/// Default number of elements handed to one rayon task.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Data-parallel CPU backend.
///
/// Splits buffers into fixed-size chunks and runs the sequential kernels on
/// each chunk from the global rayon pool. Elements are independent, so chunk
/// boundaries do not affect the result.
#[derive(Debug, Clone)]
pub struct ParallelCpuBackend {
    chunk_size: usize,
}

impl ParallelCpuBackend {
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the number of elements per task. Zero is treated as one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for ParallelCpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for ParallelCpuBackend {
    fn name(&self) -> &str {
        "cpu-parallel"
    }

    fn brelu_forward(
        &self,
        x: &CpuStorage,
        y: &mut CpuStorage,
        negative_slope: f32,
    ) -> Result<()> {
        let cs = self.chunk_size;
        dispatch_dtype!(x.dtype(), |T| {
            let (x, y) = unary_operands::<T>(x, y)?;
            let slope = <T as Element>::from_f32(negative_slope);
            y.par_chunks_mut(cs)
                .zip(x.par_chunks(cs))
                .for_each(|(y, x)| unary::brelu_forward(x, y, slope));
            Ok(())
        })
    }

    fn brelu_forward_in_place(&self, x: &mut CpuStorage, negative_slope: f32) -> Result<()> {
        let cs = self.chunk_size;
        dispatch_dtype!(x.dtype(), |T| {
            let x = x.as_slice_mut::<T>()?;
            let slope = <T as Element>::from_f32(negative_slope);
            x.par_chunks_mut(cs)
                .for_each(|x| unary::brelu_forward_in_place(x, slope));
            Ok(())
        })
    }

    fn brelu_backward(
        &self,
        dy: &CpuStorage,
        x: &CpuStorage,
        dx: &mut CpuStorage,
        negative_slope: f32,
    ) -> Result<()> {
        let cs = self.chunk_size;
        dispatch_dtype!(x.dtype(), |T| {
            let (dy, x, dx) = gradient_operands::<T>(dy, x, dx)?;
            let slope = <T as Element>::from_f32(negative_slope);
            dx.par_chunks_mut(cs)
                .zip(dy.par_chunks(cs))
                .zip(x.par_chunks(cs))
                .for_each(|((dx, dy), x)| unary::brelu_backward(dy, x, dx, slope));
            Ok(())
        })
    }

    fn brelu_backward_in_place(
        &self,
        x: &CpuStorage,
        d: &mut CpuStorage,
        negative_slope: f32,
    ) -> Result<()> {
        let cs = self.chunk_size;
        dispatch_dtype!(x.dtype(), |T| {
            let (x, d) = unary_operands::<T>(x, d)?;
            let slope = <T as Element>::from_f32(negative_slope);
            d.par_chunks_mut(cs)
                .zip(x.par_chunks(cs))
                .for_each(|(d, x)| unary::brelu_backward_in_place(x, d, slope));
            Ok(())
        })
    }
}
