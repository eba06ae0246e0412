use thiserror::Error;

#[derive(Error, Debug)]
pub enum NeuronError {
    #[error("{layer} layer takes exactly {expected} {role} blob(s), got {got}")]
    BlobCount {
        layer: &'static str,
        role: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("expected {expected} propagate_down flag(s), got {got}")]
    PropagateCount { expected: usize, got: usize },
    #[error("tensor error: {0}")]
    TensorError(#[from] nr_tensor::TensorError),
}

pub type Result<T> = std::result::Result<T, NeuronError>;
