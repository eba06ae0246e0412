use std::fmt;
use std::ops::{Add, Mul};

use half::f16;

use crate::storage::CpuStorage;

/// Supported element types for tensor storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 16-bit floating point (IEEE 754 half-precision, via the `half` crate).
    F16,
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F16 => write!(f, "f16"),
            DType::F32 => write!(f, "f32"),
            DType::F64 => write!(f, "f64"),
        }
    }
}

/// A floating-point element that can live in a [`CpuStorage`].
///
/// Kernels are written once against this trait and instantiated for every
/// [`DType`]. The storage hooks let generic code borrow the typed buffer out
/// of the dtype-tagged storage enum.
pub trait Element:
    Copy + PartialOrd + Add<Output = Self> + Mul<Output = Self> + fmt::Debug + Send + Sync + 'static
{
    /// The runtime tag for this element type.
    const DTYPE: DType;
    const ZERO: Self;
    const ONE: Self;

    /// Convert from an f32 (the precision layer parameters are stored in).
    fn from_f32(v: f32) -> Self;

    fn to_f32(self) -> f32;

    /// Borrow the typed buffer, or `None` if `storage` holds another dtype.
    fn slice(storage: &CpuStorage) -> Option<&[Self]>;

    /// Mutably borrow the typed buffer, or `None` if `storage` holds another dtype.
    fn slice_mut(storage: &mut CpuStorage) -> Option<&mut [Self]>;

    /// Wrap an owned buffer in the matching storage variant.
    fn into_storage(data: Vec<Self>) -> CpuStorage;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident, $zero:expr, $one:expr, |$v:ident| $from:expr, |$s:ident| $to:expr) => {
        impl Element for $ty {
            const DTYPE: DType = DType::$variant;
            const ZERO: Self = $zero;
            const ONE: Self = $one;

            #[inline(always)]
            fn from_f32($v: f32) -> Self {
                $from
            }

            #[inline(always)]
            fn to_f32(self) -> f32 {
                let $s = self;
                $to
            }

            fn slice(storage: &CpuStorage) -> Option<&[Self]> {
                match storage {
                    CpuStorage::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn slice_mut(storage: &mut CpuStorage) -> Option<&mut [Self]> {
                match storage {
                    CpuStorage::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }

            fn into_storage(data: Vec<Self>) -> CpuStorage {
                CpuStorage::$variant(data)
            }
        }
    };
}

impl_element!(f16, F16, f16::ZERO, f16::ONE, |v| f16::from_f32(v), |v| f16::to_f32(v));
impl_element!(f32, F32, 0.0, 1.0, |v| v, |v| v);
impl_element!(f64, F64, 0.0, 1.0, |v| v as f64, |v| v as f32);
