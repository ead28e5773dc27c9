use serde::{Serialize, Deserialize};
use tracing::info;

/// Hyperparameters of [`ReduceLrOnPlateau`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateauConfig {
    pub factor: f64,
    pub patience: usize,
    /// Relative improvement threshold; `None` uses the initial learning rate.
    pub threshold: Option<f64>,
    pub cooldown: usize,
    pub min_lr: f64,
    pub eps: f64,
}

impl Default for PlateauConfig {
    fn default() -> Self {
        PlateauConfig {
            factor: 0.1,
            patience: 5,
            threshold: None,
            cooldown: 0,
            min_lr: 0.0,
            eps: 1e-8,
        }
    }
}

/// Multiplies the learning rate by `factor` once a minimized metric has not
/// improved for more than `patience` consecutive steps.
///
/// Improvement is relative: `value < best * (1 - threshold)`.
#[derive(Debug, Clone)]
pub struct ReduceLrOnPlateau {
    config: PlateauConfig,
    threshold: f64,
    best: f64,
    num_bad_epochs: usize,
    cooldown_counter: usize,
}

impl ReduceLrOnPlateau {
    pub fn new(config: PlateauConfig, initial_lr: f64) -> ReduceLrOnPlateau {
        let threshold = config.threshold.unwrap_or(initial_lr);
        ReduceLrOnPlateau {
            config,
            threshold,
            best: f64::INFINITY,
            num_bad_epochs: 0,
            cooldown_counter: 0,
        }
    }

    fn is_better(&self, value: f64) -> bool {
        value < self.best * (1.0 - self.threshold)
    }

    /// Feeds one observation of the metric and returns the learning rate to
    /// use from now on.
    pub fn step(&mut self, metric: f64, current_lr: f64) -> f64 {
        if self.is_better(metric) {
            self.best = metric;
            self.num_bad_epochs = 0;
        } else {
            self.num_bad_epochs += 1;
        }

        if self.cooldown_counter > 0 {
            self.cooldown_counter -= 1;
            self.num_bad_epochs = 0;
        }

        if self.num_bad_epochs <= self.config.patience {
            return current_lr;
        }

        self.cooldown_counter = self.config.cooldown;
        self.num_bad_epochs = 0;

        let new_lr = (current_lr * self.config.factor).max(self.config.min_lr);
        if current_lr - new_lr > self.config.eps {
            info!(old_lr = current_lr, new_lr, "reducing learning rate");
            new_lr
        } else {
            current_lr
        }
    }

    pub fn best(&self) -> f64 {
        self.best
    }
}
