use serde::{Deserialize, Serialize};

/// Parameters for a BReLU layer.
///
/// Deserializes from the engine's layer parameters; every field is optional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BReluConfig {
    /// Leak coefficient ν applied to inputs at or below zero. Zero selects
    /// the clamp-to-[0, 1] forward.
    pub negative_slope: f32,
}

impl BReluConfig {
    pub fn new(negative_slope: f32) -> Self {
        Self { negative_slope }
    }

    pub fn with_negative_slope(mut self, negative_slope: f32) -> Self {
        self.negative_slope = negative_slope;
        self
    }
}
