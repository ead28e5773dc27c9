use serde::{Deserialize, Serialize};

/// Annotations stored next to the weights in `save.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    /// Backbone identifier the weights were built for.
    pub backbone: String,
    /// `(mel bins, frames)` the network expects.
    pub input_size: (usize, usize),
    /// Human-readable class labels, indexed by output neuron.
    pub output_labels: Vec<String>,
}
