use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::data::{dataset::MelSample, loader::Loaders};
use crate::error::{MelError, Result};
use crate::loss::loss_type::Criterion;
use crate::network::network::Network;
use crate::optim::{plateau::ReduceLrOnPlateau, sgd::Sgd};
use crate::train::epoch_stats::{EpochStats, TrainHistory};
use crate::train::evaluate::evaluate_accuracy;
use crate::train::train_config::{PlateauMetric, TrainConfig};

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epoch_num` epochs and returns the recorded curves.
///
/// Per epoch:
/// - the current learning rate is recorded before any batch runs
/// - every `config.iteration` batches the mean batch loss of that group is
///   appended to `history.loss`; a trailing partial group is discarded
/// - training and validation accuracy are measured by full re-inference
/// - the plateau scheduler observes the loss selected by `config.plateau_metric`
///   and may lower the learning rate for the next epoch
///
/// Whether the backbone is trained is decided by the network itself
/// (`Network::set_full_finetune`).
pub fn train_loop(
    network: &mut Network,
    loaders: &mut Loaders,
    criterion: &Criterion,
    config: &TrainConfig,
) -> Result<TrainHistory> {
    config.validate()?;
    if loaders.train.is_empty() {
        return Err(MelError::InvalidDataset("training partition is empty".into()));
    }

    let mut optimizer = Sgd::new(config.learning_rate, config.momentum);
    let mut scheduler = ReduceLrOnPlateau::new(config.plateau.clone(), config.learning_rate);
    let mut history = TrainHistory::default();

    for epoch in 1..=config.epoch_num {
        let t_start = Instant::now();
        let lr = optimizer.learning_rate;
        info!("{:-^40}", format!(" Epoch {}/{} ", epoch, config.epoch_num));
        info!(lr, "learning rate");

        // ── One full pass over the training data ───────────────────────────
        let pbar = progress_bar(loaders.train.len() as u64);
        let mut running_loss = 0.0;
        let mut epoch_loss = 0.0;
        let mut last_loss = 0.0;
        let mut batches = 0usize;

        for (i, batch) in loaders.train.epoch().enumerate() {
            let loss = train_batch(network, &mut optimizer, criterion, &batch);
            running_loss += loss;
            epoch_loss += loss;
            last_loss = loss;
            batches += 1;

            if i % config.iteration == config.iteration - 1 {
                let avg = running_loss / config.iteration as f64;
                pbar.set_message(format!(
                    "epoch={}/{}, lr={:.4}, loss={:.4}",
                    epoch, config.epoch_num, lr, avg
                ));
                history.loss.push(avg);
                running_loss = 0.0;
            }
            pbar.inc(1);
        }
        pbar.finish_and_clear();

        // ── Accuracy ───────────────────────────────────────────────────────
        let train_accuracy = evaluate_accuracy(network, &loaders.train);
        info!("Training acc   : {:.2}%", train_accuracy);
        let val_accuracy = evaluate_accuracy(network, &loaders.validation);
        info!("Validation acc : {:.2}%", val_accuracy);

        // ── Schedule ───────────────────────────────────────────────────────
        let mean_loss = epoch_loss / batches as f64;
        let observed = match config.plateau_metric {
            PlateauMetric::LastBatch => last_loss,
            PlateauMetric::EpochMean => mean_loss,
        };
        optimizer.learning_rate = scheduler.step(observed, lr);

        history.push_epoch(EpochStats {
            epoch,
            total_epochs: config.epoch_num,
            learning_rate: lr,
            mean_loss,
            last_batch_loss: last_loss,
            train_accuracy,
            val_accuracy,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        });
    }

    Ok(history)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// One optimization step over a mini-batch. Returns the mean sample loss.
fn train_batch(
    network: &mut Network,
    optimizer: &mut Sgd,
    criterion: &Criterion,
    batch: &[&MelSample],
) -> f64 {
    network.zero_grad();

    let mut total_loss = 0.0;
    for sample in batch {
        let logits = network.forward(&sample.mel);
        total_loss += criterion.loss(&logits, sample.label);
        let grad = criterion.derivative(&logits, sample.label);
        network.backward(&grad);
    }

    let n = batch.len() as f64;
    optimizer.step(network.parameters_mut(), 1.0 / n);
    total_loss / n
}

fn progress_bar(len: u64) -> ProgressBar {
    let pbar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len} batch [{elapsed_precise}<{eta_precise}]") {
        pbar.set_style(style.progress_chars("=> "));
    }
    pbar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{dataset::Splits, loader::Loaders};
    use crate::loss::loss_type::LossType;
    use crate::math::feature_map::FeatureMap;
    use crate::network::spec::BackboneSpec;
    use crate::optim::plateau::PlateauConfig;
    use rand::{rngs::StdRng, SeedableRng};

    /// Two trivially separable classes: dark vs. bright spectrograms.
    fn toy_loaders(per_class: usize, batch_size: usize) -> Loaders {
        let make = |n: usize| -> Vec<MelSample> {
            (0..n)
                .map(|i| {
                    let label = i % 2;
                    let level = if label == 0 { 0.1 } else { 0.9 };
                    MelSample { mel: FeatureMap::from_vec(1, 32, 32, vec![level; 32 * 32]), label }
                })
                .collect()
        };
        let splits = Splits { train: make(per_class * 2), validation: make(4), test: make(4) };
        Loaders::from_splits(splits, batch_size, 1)
    }

    fn tiny_network(seed: u64) -> Network {
        let spec = BackboneSpec::lookup("cnn_tiny").unwrap();
        Network::new(&spec, vec!["quiet".into(), "loud".into()], &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn history_lengths_follow_epochs_and_iteration() {
        // 22 samples / batch 2 = 11 batches; iteration 3 → 3 samples per epoch.
        let mut loaders = toy_loaders(11, 2);
        let mut network = tiny_network(0);
        let criterion = Criterion::new(LossType::CrossEntropy, &[11, 11], 2.0);
        let config = TrainConfig { epoch_num: 2, iteration: 3, ..TrainConfig::default() };

        let history = train_loop(&mut network, &mut loaders, &criterion, &config).unwrap();
        assert_eq!(history.tra_acc.len(), 2);
        assert_eq!(history.val_acc.len(), 2);
        assert_eq!(history.lr.len(), 2);
        assert_eq!(history.loss.len(), 2 * (11 / 3));
        assert!(history.tra_acc.iter().chain(&history.val_acc).all(|a| (0.0..=100.0).contains(a)));
    }

    #[test]
    fn fewer_batches_than_iteration_records_no_loss() {
        let mut loaders = toy_loaders(2, 4);
        let mut network = tiny_network(0);
        let criterion = Criterion::new(LossType::Focal, &[2, 2], 2.0);
        let config = TrainConfig { epoch_num: 1, iteration: 10, ..TrainConfig::default() };

        let history = train_loop(&mut network, &mut loaders, &criterion, &config).unwrap();
        assert!(history.loss.is_empty());
        assert_eq!(history.lr, vec![0.001]);
    }

    #[test]
    fn frozen_backbone_keeps_conv_weights() {
        let mut loaders = toy_loaders(4, 4);
        let mut network = tiny_network(3);
        network.set_full_finetune(false);
        let before = network.blocks[0].conv.weights.clone();
        let head_before = network.head[1].weights.clone();

        let criterion = Criterion::new(LossType::CrossEntropy, &[4, 4], 2.0);
        let config = TrainConfig { epoch_num: 1, iteration: 1, learning_rate: 0.05, ..TrainConfig::default() };
        train_loop(&mut network, &mut loaders, &criterion, &config).unwrap();

        assert_eq!(network.blocks[0].conv.weights, before);
        assert_ne!(network.head[1].weights, head_before);
    }

    #[test]
    fn learns_a_separable_problem() {
        let mut loaders = toy_loaders(8, 4);
        let mut network = tiny_network(7);
        let criterion = Criterion::new(LossType::CrossEntropy, &[8, 8], 2.0);
        let config = TrainConfig { epoch_num: 20, iteration: 1, learning_rate: 0.01, ..TrainConfig::default() };

        let history = train_loop(&mut network, &mut loaders, &criterion, &config).unwrap();
        let first = history.loss[..4].iter().sum::<f64>();
        let last = history.loss[history.loss.len() - 4..].iter().sum::<f64>();
        assert!(last < first, "loss did not decrease: {} -> {}", first, last);
    }

    #[test]
    fn invalid_config_fails_before_training() {
        let mut loaders = toy_loaders(2, 2);
        let mut network = tiny_network(0);
        let criterion = Criterion::new(LossType::CrossEntropy, &[2, 2], 2.0);
        let config = TrainConfig { batch_size: 0, ..TrainConfig::default() };
        assert!(train_loop(&mut network, &mut loaders, &criterion, &config).is_err());
    }

    fn plateau_run(epoch_num: usize, plateau: PlateauConfig, plateau_metric: PlateauMetric) -> TrainHistory {
        // 11 batches per epoch, so the last batch loss differs from the epoch mean.
        let mut loaders = toy_loaders(11, 2);
        let mut network = tiny_network(0);
        let criterion = Criterion::new(LossType::CrossEntropy, &[11, 11], 2.0);
        let config = TrainConfig { epoch_num, iteration: 3, plateau, plateau_metric, ..TrainConfig::default() };
        train_loop(&mut network, &mut loaders, &criterion, &config).unwrap()
    }

    fn assert_lr(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-15, "lr {:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn lr_cut_shows_up_in_the_following_epoch() {
        // No loss drops by 99% in one epoch, so every step after the first cuts.
        let plateau = PlateauConfig { patience: 0, threshold: Some(0.99), ..PlateauConfig::default() };
        let history = plateau_run(4, plateau.clone(), PlateauMetric::LastBatch);

        assert_lr(&history.lr, &[0.001, 0.001, 0.0001, 0.00001]);

        // Replaying the scheduler on the last batch losses reproduces the record.
        let mut scheduler = ReduceLrOnPlateau::new(plateau, 0.001);
        let mut lr = 0.001;
        for (stats, recorded) in history.epochs.iter().zip(&history.lr) {
            assert_eq!(stats.learning_rate, *recorded);
            assert_eq!(stats.learning_rate, lr);
            lr = scheduler.step(stats.last_batch_loss, lr);
        }
    }

    #[test]
    fn plateau_metric_selects_the_observed_loss() {
        // The first two epochs never see a cut, so their losses do not depend
        // on the scheduler settings.
        let quiet = PlateauConfig { patience: 100, ..PlateauConfig::default() };
        let base = plateau_run(2, quiet, PlateauMetric::LastBatch);
        let (e1, e2) = (&base.epochs[0], &base.epochs[1]);
        let last_ratio = e2.last_batch_loss / e1.last_batch_loss;
        let mean_ratio = e2.mean_loss / e1.mean_loss;
        assert!((last_ratio - mean_ratio).abs() > 1e-9);

        // Epoch 2 improves by this threshold under one metric but not the other.
        let threshold = 1.0 - (last_ratio + mean_ratio) / 2.0;
        let plateau = PlateauConfig { patience: 0, threshold: Some(threshold), ..PlateauConfig::default() };
        let by_last = plateau_run(3, plateau.clone(), PlateauMetric::LastBatch);
        let by_mean = plateau_run(3, plateau, PlateauMetric::EpochMean);

        assert_eq!(by_last.epochs[1].last_batch_loss, e2.last_batch_loss);
        assert_eq!(by_mean.epochs[1].mean_loss, e2.mean_loss);

        let (cut, kept) = ([0.001, 0.001, 0.0001], [0.001, 0.001, 0.001]);
        if last_ratio > mean_ratio {
            assert_lr(&by_last.lr, &cut);
            assert_lr(&by_mean.lr, &kept);
        } else {
            assert_lr(&by_last.lr, &kept);
            assert_lr(&by_mean.lr, &cut);
        }
    }
}
