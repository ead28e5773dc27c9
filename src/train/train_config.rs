use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::{MelError, Result};
use crate::loss::focal::FocalLoss;
use crate::optim::plateau::PlateauConfig;

/// Which loss value the plateau scheduler observes at the end of an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateauMetric {
    /// Loss of the final mini-batch of the epoch.
    LastBatch,
    /// Mean loss over every mini-batch of the epoch.
    EpochMean,
}

/// Hyperparameters for one training run.
///
/// # Fields
/// - `epoch_num`      — full passes over the training partition
/// - `iteration`      — running loss is averaged and recorded every this many batches
/// - `learning_rate`  — initial SGD learning rate
/// - `momentum`       — SGD momentum
/// - `batch_size`     — samples per mini-batch
/// - `seed`           — seeds weight init, the dataset split and batch shuffling
/// - `split`          — `[train, validation, test]` ratios, summing to 1
/// - `focal_gamma`    — focusing parameter of the focal loss
/// - `plateau`        — `ReduceLrOnPlateau` settings
/// - `plateau_metric` — loss value fed to the scheduler each epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epoch_num: usize,
    pub iteration: usize,
    pub learning_rate: f64,
    pub momentum: f64,
    pub batch_size: usize,
    pub seed: u64,
    pub split: [f64; 3],
    pub focal_gamma: f64,
    pub plateau: PlateauConfig,
    pub plateau_metric: PlateauMetric,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epoch_num: 40,
            iteration: 10,
            learning_rate: 0.001,
            momentum: 0.9,
            batch_size: 16,
            seed: 42,
            split: [0.8, 0.1, 0.1],
            focal_gamma: FocalLoss::DEFAULT_GAMMA,
            plateau: PlateauConfig::default(),
            plateau_metric: PlateauMetric::LastBatch,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(MelError::InvalidConfig(msg));
        if self.epoch_num == 0 {
            return fail("epoch_num must be at least 1".into());
        }
        if self.iteration == 0 {
            return fail("iteration must be at least 1".into());
        }
        if self.batch_size == 0 {
            return fail("batch_size must be at least 1".into());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return fail(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return fail(format!("momentum must be in [0, 1), got {}", self.momentum));
        }
        if self.focal_gamma < 0.0 {
            return fail(format!("focal_gamma must be non-negative, got {}", self.focal_gamma));
        }
        if !(self.plateau.factor > 0.0 && self.plateau.factor < 1.0) {
            return fail(format!("plateau.factor must be in (0, 1), got {}", self.plateau.factor));
        }
        Ok(())
    }

    /// Reads a config from JSON; missing fields take their defaults.
    pub fn load_json(path: &Path) -> Result<TrainConfig> {
        let file = std::fs::File::open(path).map_err(|e| MelError::io(path, e))?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| MelError::json(path, e))
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| MelError::io(path, e))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| MelError::json(path, e))
    }
}
