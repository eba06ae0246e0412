//! `nr-tensor` - Blob tensors and compute backends for neuron-runtime.
//!
//! This crate provides:
//! - A `Tensor` (blob) type holding a data buffer and a same-sized gradient buffer
//! - Element types (F16, F32, F64) and the `Element` trait kernels are generic over
//! - A `ComputeBackend` trait for pluggable compute
//! - A sequential `CpuBackend` and a rayon-backed `ParallelCpuBackend`
//! - The BReLU slice kernels in `cpu::unary`

pub mod backend;
pub mod cpu;
pub mod dtype;
pub mod error;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use backend::ComputeBackend;
pub use cpu::parallel::ParallelCpuBackend;
pub use cpu::CpuBackend;
pub use dtype::{DType, Element};
pub use error::{Result, TensorError};
pub use shape::Shape;
pub use storage::CpuStorage;
pub use tensor::Tensor;
