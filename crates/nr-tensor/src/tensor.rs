use crate::dtype::{DType, Element};
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::CpuStorage;

/// A blob tensor backed by CPU storage.
///
/// Holds two contiguous buffers of the same dtype and element count: `data`
/// (activations) and `diff` (the gradient of the loss with respect to
/// `data`). Layers read one blob's data and write another's, and during the
/// backward pass fill a blob's diff from its own data plus a downstream diff.
#[derive(Debug, Clone)]
pub struct Tensor {
    data: CpuStorage,
    diff: CpuStorage,
    shape: Shape,
}

impl Tensor {
    /// Create a new tensor from typed data and a shape. The diff buffer is
    /// zero-filled.
    ///
    /// # Panics
    /// Panics if `data.len() != shape.numel()`.
    pub fn new<T: Element>(data: Vec<T>, shape: Shape) -> Self {
        assert_eq!(
            data.len(),
            shape.numel(),
            "data length {} does not match shape {:?} (numel={})",
            data.len(),
            shape,
            shape.numel()
        );
        let n = data.len();
        Tensor {
            data: CpuStorage::from_vec(data),
            diff: CpuStorage::zeros(T::DTYPE, n),
            shape,
        }
    }

    /// Create a tensor whose data and diff are both zero-filled.
    pub fn zeros(shape: Shape, dtype: DType) -> Self {
        let n = shape.numel();
        Tensor {
            data: CpuStorage::zeros(dtype, n),
            diff: CpuStorage::zeros(dtype, n),
            shape,
        }
    }

    /// Create a tensor from explicit data and diff buffers.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if either buffer's length differs from
    /// `shape.numel()`.
    pub fn from_data_and_diff<T: Element>(data: Vec<T>, diff: Vec<T>, shape: Shape) -> Result<Self> {
        for len in [data.len(), diff.len()] {
            if len != shape.numel() {
                return Err(TensorError::ShapeMismatch {
                    expected: shape.dims().to_vec(),
                    got: vec![len],
                });
            }
        }
        Ok(Tensor {
            data: CpuStorage::from_vec(data),
            diff: CpuStorage::from_vec(diff),
            shape,
        })
    }

    /// Returns a reference to the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's element type.
    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    pub fn data(&self) -> &CpuStorage {
        &self.data
    }

    pub fn diff(&self) -> &CpuStorage {
        &self.diff
    }

    pub fn data_mut(&mut self) -> &mut CpuStorage {
        &mut self.data
    }

    /// Borrow the data for reading and the diff for writing at the same time.
    pub fn data_and_diff_mut(&mut self) -> (&CpuStorage, &mut CpuStorage) {
        (&self.data, &mut self.diff)
    }

    /// Returns the data as a typed slice.
    pub fn data_as<T: Element>(&self) -> Result<&[T]> {
        self.data.as_slice()
    }

    /// Returns the diff as a typed slice.
    pub fn diff_as<T: Element>(&self) -> Result<&[T]> {
        self.diff.as_slice()
    }

    /// Returns the diff as a mutable typed slice.
    pub fn diff_as_mut<T: Element>(&mut self) -> Result<&mut [T]> {
        self.diff.as_slice_mut()
    }
}
