/// Run `$body` with `$t` bound to the element type matching `$dtype`.
macro_rules! dispatch_dtype {
    ($dtype:expr, |$t:ident| $body:expr) => {
        match $dtype {
            $crate::dtype::DType::F16 => {
                type $t = half::f16;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $t = f32;
                $body
            }
            $crate::dtype::DType::F64 => {
                type $t = f64;
                $body
            }
        }
    };
}

pub mod parallel;
pub mod unary;

use crate::backend::ComputeBackend;
use crate::dtype::Element;
use crate::error::{Result, TensorError};
use crate::storage::CpuStorage;

/// Pure-Rust CPU compute backend.
///
/// Runs every kernel as a single sequential loop. Intended as the reference
/// implementation and fallback.
#[derive(Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn brelu_forward(
        &self,
        x: &CpuStorage,
        y: &mut CpuStorage,
        negative_slope: f32,
    ) -> Result<()> {
        dispatch_dtype!(x.dtype(), |T| {
            let (x, y) = unary_operands::<T>(x, y)?;
            unary::brelu_forward(x, y, <T as Element>::from_f32(negative_slope));
            Ok(())
        })
    }

    fn brelu_forward_in_place(&self, x: &mut CpuStorage, negative_slope: f32) -> Result<()> {
        dispatch_dtype!(x.dtype(), |T| {
            let x = x.as_slice_mut::<T>()?;
            unary::brelu_forward_in_place(x, <T as Element>::from_f32(negative_slope));
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
        dispatch_dtype!(x.dtype(), |T| {
            let (dy, x, dx) = gradient_operands::<T>(dy, x, dx)?;
            unary::brelu_backward(dy, x, dx, <T as Element>::from_f32(negative_slope));
            Ok(())
        })
    }

    fn brelu_backward_in_place(
        &self,
        x: &CpuStorage,
        d: &mut CpuStorage,
        negative_slope: f32,
    ) -> Result<()> {
        dispatch_dtype!(x.dtype(), |T| {
            let (x, d) = unary_operands::<T>(x, d)?;
            unary::brelu_backward_in_place(x, d, <T as Element>::from_f32(negative_slope));
            Ok(())
        })
    }
}

/// Borrow an input/output pair as `T` slices, checking dtype and length.
pub(crate) fn unary_operands<'a, T: Element>(
    x: &'a CpuStorage,
    y: &'a mut CpuStorage,
) -> Result<(&'a [T], &'a mut [T])> {
    let x = x.as_slice::<T>()?;
    let y = y.as_slice_mut::<T>()?;
    check_len(x.len(), y.len())?;
    Ok((x, y))
}

/// Borrow `(dy, x, dx)` as `T` slices, checking dtype and length.
pub(crate) fn gradient_operands<'a, T: Element>(
    dy: &'a CpuStorage,
    x: &'a CpuStorage,
    dx: &'a mut CpuStorage,
) -> Result<(&'a [T], &'a [T], &'a mut [T])> {
    let x = x.as_slice::<T>()?;
    let dy = dy.as_slice::<T>()?;
    let dx = dx.as_slice_mut::<T>()?;
    check_len(x.len(), dy.len())?;
    check_len(x.len(), dx.len())?;
    Ok((dy, x, dx))
}

fn check_len(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(TensorError::ShapeMismatch {
            expected: vec![expected],
            got: vec![got],
        });
    }
    Ok(())
}
