pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod data;
pub mod metrics;
pub mod train;
pub mod report;
pub mod run;

// Convenience re-exports
pub use error::{MelError, Result};
pub use math::{feature_map::FeatureMap, matrix::Matrix};
pub use activation::activation::ActivationFunction;
pub use network::{BackboneSpec, Network};
pub use loss::{Criterion, LossType};
pub use optim::{ReduceLrOnPlateau, Sgd};
pub use data::{DataLoader, DatasetIndex, MelDataset, MelSample};
pub use train::{train_loop, TrainConfig, TrainHistory};
pub use run::{run, RunOptions, RunSummary};
