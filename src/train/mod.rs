pub mod epoch_stats;
pub mod evaluate;
pub mod loop_fn;
pub mod train_config;

pub use epoch_stats::{EpochStats, TrainHistory};
pub use evaluate::{evaluate_accuracy, evaluate_test, predict};
pub use loop_fn::train_loop;
pub use train_config::{PlateauMetric, TrainConfig};
