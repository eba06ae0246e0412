//! Elementwise activation kernels over typed slices.
//!
//! Kernels write into caller-provided buffers and never allocate. Slice
//! lengths must match; the backends check this before calling in.

use crate::dtype::Element;

/// BReLU forward: `y = clamp(x, 0, 1)` when `negative_slope` is zero,
/// otherwise `y = max(0, x) + negative_slope * min(0, x)`.
pub fn brelu_forward<T: Element>(x: &[T], y: &mut [T], negative_slope: T) {
    debug_assert_eq!(x.len(), y.len(), "brelu_forward: x and y differ in length");
    if negative_slope == T::ZERO {
        for (yi, &xi) in y.iter_mut().zip(x) {
            *yi = clamp_unit(xi);
        }
    } else {
        for (yi, &xi) in y.iter_mut().zip(x) {
            *yi = leaky(xi, negative_slope);
        }
    }
}

/// BReLU forward, overwriting `x` with the output.
pub fn brelu_forward_in_place<T: Element>(x: &mut [T], negative_slope: T) {
    if negative_slope == T::ZERO {
        for v in x.iter_mut() {
            *v = clamp_unit(*v);
        }
    } else {
        for v in x.iter_mut() {
            *v = leaky(*v, negative_slope);
        }
    }
}

/// BReLU backward: `dx = dy` where `x > 0`, `dx = negative_slope * dy`
/// elsewhere. `x` is the forward input, not the forward output.
pub fn brelu_backward<T: Element>(dy: &[T], x: &[T], dx: &mut [T], negative_slope: T) {
    debug_assert_eq!(dy.len(), x.len(), "brelu_backward: dy and x differ in length");
    debug_assert_eq!(dx.len(), x.len(), "brelu_backward: dx and x differ in length");
    for ((dxi, &dyi), &xi) in dx.iter_mut().zip(dy).zip(x) {
        *dxi = gate(xi, dyi, negative_slope);
    }
}

/// BReLU backward, overwriting the output gradient `d` with the input gradient.
pub fn brelu_backward_in_place<T: Element>(x: &[T], d: &mut [T], negative_slope: T) {
    debug_assert_eq!(d.len(), x.len(), "brelu_backward_in_place: d and x differ in length");
    for (di, &xi) in d.iter_mut().zip(x) {
        *di = gate(xi, *di, negative_slope);
    }
}

#[inline(always)]
fn clamp_unit<T: Element>(x: T) -> T {
    if x <= T::ZERO {
        T::ZERO
    } else if x >= T::ONE {
        T::ONE
    } else {
        x
    }
}

#[inline(always)]
fn leaky<T: Element>(x: T, negative_slope: T) -> T {
    let pos = if x > T::ZERO { x } else { T::ZERO };
    let neg = if x < T::ZERO { x } else { T::ZERO };
    pos + negative_slope * neg
}

#[inline(always)]
fn gate<T: Element>(x: T, dy: T, negative_slope: T) -> T {
    if x > T::ZERO {
        dy
    } else {
        negative_slope * dy
    }
}
