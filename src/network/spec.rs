use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{MelError, Result};

/// Architecture of a convolutional backbone plus its classifier head.
///
/// Fields:
/// - `name`       — identifier accepted by `--model`
/// - `input_size` — `(mel bins, frames)` every input is resized to
/// - `channels`   — output channels of each conv block (conv 3×3 + pool 2×2)
/// - `hidden`     — width of the hidden dense layer in the head
/// - `activation` — activation used by conv blocks and the hidden layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackboneSpec {
    pub name: String,
    pub input_size: (usize, usize),
    pub channels: Vec<usize>,
    pub hidden: usize,
    pub activation: ActivationFunction,
}

pub const KNOWN_BACKBONES: [&str; 3] = ["cnn_tiny", "cnn_small", "cnn_wide"];

impl BackboneSpec {
    /// Resolves a backbone identifier into its architecture.
    pub fn lookup(name: &str) -> Result<BackboneSpec> {
        let (input_size, channels, hidden, activation) = match name {
            "cnn_tiny" => ((32, 32), vec![8, 16], 32, ActivationFunction::ReLU),
            "cnn_small" => ((64, 64), vec![16, 32, 64], 64, ActivationFunction::ReLU),
            "cnn_wide" => (
                (64, 64),
                vec![32, 64, 128],
                128,
                ActivationFunction::LeakyReLU { alpha: 0.01 },
            ),
            other => {
                return Err(MelError::UnknownBackbone(
                    other.to_string(),
                    KNOWN_BACKBONES.join(", "),
                ))
            }
        };
        Ok(BackboneSpec { name: name.to_string(), input_size, channels, hidden, activation })
    }

    /// Spatial size of the feature map leaving the last conv block.
    pub fn feature_size(&self) -> (usize, usize) {
        let scale = 1usize << self.channels.len();
        (self.input_size.0 / scale, self.input_size.1 / scale)
    }

    pub fn feature_channels(&self) -> usize {
        self.channels.last().copied().unwrap_or(1)
    }
}
