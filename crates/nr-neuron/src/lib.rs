//! `nr-neuron` - Neuron layers for neuron-runtime.
//!
//! Neuron layers map one bottom blob to one top blob elementwise. This crate
//! provides the `Layer` trait the engine drives and the bilateral rectified
//! linear unit (`BReluLayer`, type name `"BReLU"`).

pub mod brelu;
pub mod config;
pub mod error;
pub mod layer;

pub use brelu::BReluLayer;
pub use config::BReluConfig;
pub use error::{NeuronError, Result};
pub use layer::Layer;
