use serde::{Serialize, Deserialize};

/// Summary of one completed epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Learning rate used throughout this epoch.
    pub learning_rate: f64,
    /// Mean mini-batch loss over the epoch.
    pub mean_loss: f64,
    /// Loss of the final mini-batch.
    pub last_batch_loss: f64,
    /// Training accuracy in percent, from a full re-inference pass.
    pub train_accuracy: f64,
    /// Validation accuracy in percent.
    pub val_accuracy: f64,
    /// Wall-clock duration of the epoch (training and evaluation) in milliseconds.
    pub elapsed_ms: u64,
}

/// Curves recorded during a run.
///
/// `tra_acc`, `val_acc`, `lr` and `epochs` hold one entry per epoch;
/// `loss` holds one running-loss sample per `iteration` batches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainHistory {
    pub tra_acc: Vec<f64>,
    pub val_acc: Vec<f64>,
    pub loss: Vec<f64>,
    pub lr: Vec<f64>,
    pub epochs: Vec<EpochStats>,
}

impl TrainHistory {
    pub fn push_epoch(&mut self, stats: EpochStats) {
        self.tra_acc.push(stats.train_accuracy);
        self.val_acc.push(stats.val_accuracy);
        self.lr.push(stats.learning_rate);
        self.epochs.push(stats);
    }

    pub fn final_val_accuracy(&self) -> Option<f64> {
        self.val_acc.last().copied()
    }
}
