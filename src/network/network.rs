use std::path::Path;

use rand::Rng;
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::{
    activation::activation::ActivationFunction,
    error::{MelError, Result},
    layers::{Conv2d, Dense, GlobalAvgPool, MaxPool2d, ParamMut},
    math::feature_map::FeatureMap,
    network::{metadata::ModelMetadata, spec::BackboneSpec},
};

/// One backbone stage: 3×3 convolution (activation fused) followed by 2×2 max pooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvBlock {
    pub conv: Conv2d,
    pub pool: MaxPool2d,
}

/// Convolutional mel classifier: conv blocks → global average pool → dense head.
///
/// The network always emits raw logits; softmax lives in the loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub metadata: ModelMetadata,
    pub blocks: Vec<ConvBlock>,
    pub head: Vec<Dense>,
    #[serde(skip)]
    gap: GlobalAvgPool,
    #[serde(skip)]
    frozen_backbone: bool,
}

const KERNEL_SIZE: usize = 3;

impl Network {
    /// Builds a freshly initialized network for `classes.len()` outputs.
    pub fn new<R: Rng + ?Sized>(spec: &BackboneSpec, classes: Vec<String>, rng: &mut R) -> Network {
        let mut blocks = Vec::with_capacity(spec.channels.len());
        let mut in_channels = 1;
        for &out_channels in &spec.channels {
            blocks.push(ConvBlock {
                conv: Conv2d::new(in_channels, out_channels, KERNEL_SIZE, spec.activation, rng),
                pool: MaxPool2d::new(),
            });
            in_channels = out_channels;
        }

        let head = vec![
            Dense::new(spec.hidden, spec.feature_channels(), spec.activation, rng),
            Dense::new(classes.len(), spec.hidden, ActivationFunction::Identity, rng),
        ];

        Network {
            metadata: ModelMetadata {
                backbone: spec.name.clone(),
                input_size: spec.input_size,
                output_labels: classes,
            },
            blocks,
            head,
            gap: GlobalAvgPool::default(),
            frozen_backbone: false,
        }
    }

    /// `(mel bins, frames)` every input must be resized to.
    pub fn input_size(&self) -> (usize, usize) {
        self.metadata.input_size
    }

    pub fn num_classes(&self) -> usize {
        self.metadata.output_labels.len()
    }

    /// With `full_finetune == false` only the dense head is trained; the conv
    /// blocks keep their current (usually pretrained) weights.
    pub fn set_full_finetune(&mut self, full_finetune: bool) {
        self.frozen_backbone = !full_finetune;
    }

    pub fn is_backbone_frozen(&self) -> bool {
        self.frozen_backbone
    }

    /// Forward pass; every layer caches what its backward pass needs.
    pub fn forward(&mut self, input: &FeatureMap) -> Vec<f64> {
        let mut current = input.clone();
        for block in &mut self.blocks {
            let activated = block.conv.forward(&current);
            current = block.pool.forward(&activated);
        }

        let mut vector = self.gap.forward(&current);
        for layer in &mut self.head {
            vector = layer.feed_from(&vector);
        }
        vector
    }

    /// Backward pass from ∂L/∂logits of the most recent `forward` call.
    ///
    /// Gradients accumulate until `zero_grad`, so a mini-batch is a sequence
    /// of forward/backward pairs followed by one optimizer step.
    pub fn backward(&mut self, grad_logits: &[f64]) {
        let mut delta = grad_logits.to_vec();
        for layer in self.head.iter_mut().rev() {
            delta = layer.backward(&delta);
        }
        if self.frozen_backbone {
            return;
        }

        let mut grad = self.gap.backward(&delta);
        for (i, block) in self.blocks.iter_mut().enumerate().rev() {
            let grad_activated = block.pool.backward(&grad);
            match block.conv.backward(&grad_activated, i > 0) {
                Some(upstream) => grad = upstream,
                None => break,
            }
        }
    }

    pub fn zero_grad(&mut self) {
        for block in &mut self.blocks {
            block.conv.zero_grad();
        }
        for layer in &mut self.head {
            layer.zero_grad();
        }
    }

    /// Trainable parameters in a stable order: conv blocks first (unless
    /// frozen), then the head.
    pub fn parameters_mut(&mut self) -> Vec<ParamMut<'_>> {
        let mut params = Vec::new();
        if !self.frozen_backbone {
            for block in &mut self.blocks {
                params.extend(block.conv.params_mut());
            }
        }
        for layer in &mut self.head {
            params.extend(layer.params_mut());
        }
        params
    }

    /// Serializes weights and metadata to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| MelError::io(path, e))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| MelError::json(path, e))
    }

    /// Deserializes a network previously written by `save_json`.
    pub fn load_json(path: &Path) -> Result<Network> {
        let file = std::fs::File::open(path).map_err(|e| MelError::io(path, e))?;
        let reader = std::io::BufReader::new(file);
        let mut network: Network =
            serde_json::from_reader(reader).map_err(|e| MelError::json(path, e))?;
        network.zero_grad();
        Ok(network)
    }

    /// Copies the conv block weights of a saved network into `self`.
    ///
    /// The head is left untouched so a backbone trained on one label set can
    /// be reused for another.
    pub fn load_backbone_from(&mut self, path: &Path) -> Result<()> {
        let donor = Network::load_json(path)?;
        if donor.blocks.len() != self.blocks.len() {
            return Err(MelError::ShapeMismatch(format!(
                "'{}' has {} conv blocks, backbone '{}' needs {}",
                path.display(),
                donor.blocks.len(),
                self.metadata.backbone,
                self.blocks.len()
            )));
        }
        for (i, (mine, theirs)) in self.blocks.iter().zip(&donor.blocks).enumerate() {
            if mine.conv.weights.shape() != theirs.conv.weights.shape() {
                return Err(MelError::ShapeMismatch(format!(
                    "conv block {}: expected kernel {:?}, found {:?}",
                    i,
                    mine.conv.weights.shape(),
                    theirs.conv.weights.shape()
                )));
            }
        }

        for (mine, theirs) in self.blocks.iter_mut().zip(donor.blocks) {
            mine.conv.weights = theirs.conv.weights;
            mine.conv.biases = theirs.conv.biases;
            mine.conv.zero_grad();
        }
        info!(path = %path.display(), "loaded backbone weights");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn tiny() -> Network {
        let spec = BackboneSpec::lookup("cnn_tiny").unwrap();
        Network::new(&spec, vec!["a".into(), "b".into(), "c".into()], &mut StdRng::seed_from_u64(5))
    }

    #[test]
    fn forward_emits_one_logit_per_class() {
        let mut net = tiny();
        let (h, w) = net.input_size();
        let logits = net.forward(&FeatureMap::zeros(1, h, w));
        assert_eq!(logits.len(), 3);
        assert_eq!(net.num_classes(), 3);
    }

    #[test]
    fn freezing_hides_backbone_parameters() {
        let mut net = tiny();
        assert!(!net.is_backbone_frozen());
        assert_eq!(net.parameters_mut().len(), 2 * (2 + 2));
        net.set_full_finetune(false);
        assert!(net.is_backbone_frozen());
        assert_eq!(net.parameters_mut().len(), 2 * 2);
    }

    #[test]
    fn json_round_trip_keeps_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let mut net = tiny();
        let (h, w) = net.input_size();
        let input = FeatureMap::from_vec(1, h, w, (0..h * w).map(|i| (i % 13) as f64 / 13.0).collect());
        let before = net.forward(&input);

        net.save_json(&path).unwrap();
        let mut loaded = Network::load_json(&path).unwrap();
        assert_eq!(loaded.metadata, net.metadata);
        let after = loaded.forward(&input);
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn backbone_from_other_backbone_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.json");
        let small = BackboneSpec::lookup("cnn_small").unwrap();
        Network::new(&small, vec!["x".into()], &mut StdRng::seed_from_u64(1))
            .save_json(&path)
            .unwrap();

        let mut net = tiny();
        assert!(matches!(net.load_backbone_from(&path), Err(MelError::ShapeMismatch(_))));
    }
}
