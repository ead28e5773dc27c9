use std::path::PathBuf;

use chrono::Local;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn};

use crate::data::{DatasetIndex, Loaders};
use crate::error::Result;
use crate::loss::{Criterion, LossType};
use crate::network::{BackboneSpec, Network};
use crate::report::{save_history, RunArtifacts, RunDir, RunLog};
use crate::train::{evaluate_test, train_loop, TrainConfig, TrainHistory};

/// Settings for one end-to-end training run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Backbone identifier, e.g. `cnn_small`.
    pub model: String,
    pub focal_loss: bool,
    /// `false` freezes the conv blocks and trains only the head.
    pub full_finetune: bool,
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
    /// Optional `save.json` whose conv weights seed the backbone.
    pub backbone_weights: Option<PathBuf>,
    pub config: TrainConfig,
}

/// What a finished run reports back to the caller.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_dir: PathBuf,
    pub history: TrainHistory,
    /// Test accuracy as a fraction.
    pub test_accuracy: f64,
}

/// A frozen backbone that was never loaded from a saved model keeps its
/// random initialization for the whole run.
fn frozen_without_weights(network: &Network, opts: &RunOptions) -> bool {
    network.is_backbone_frozen() && opts.backbone_weights.is_none()
}

/// Prepares data and model, trains, evaluates on the test partition and
/// persists everything under a fresh run directory.
pub fn run(opts: &RunOptions) -> Result<RunSummary> {
    let config = &opts.config;
    config.validate()?;

    // Data
    let index = DatasetIndex::scan(&opts.data_dir)?;
    let class_counts = index.class_counts();
    info!(classes = ?index.classes, counts = ?class_counts, "dataset index");

    // Model
    let spec = BackboneSpec::lookup(&opts.model)?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut network = Network::new(&spec, index.classes.clone(), &mut rng);
    if let Some(path) = &opts.backbone_weights {
        network.load_backbone_from(path)?;
    }
    network.set_full_finetune(opts.full_finetune);
    if frozen_without_weights(&network, opts) {
        warn!(
            backbone = %opts.model,
            "backbone is frozen but no weights were loaded; only the head will learn, on random conv features"
        );
    }

    let loss_type = if opts.focal_loss { LossType::Focal } else { LossType::CrossEntropy };
    let criterion = Criterion::new(loss_type, &class_counts, config.focal_gamma);
    info!(
        backbone = %spec.name,
        classes = network.num_classes(),
        loss = ?criterion.loss_type(),
        full_finetune = opts.full_finetune,
        "model ready"
    );

    let dataset = index.load(network.input_size())?;
    let splits = dataset.split(config.split, config.seed)?;
    info!(
        train = splits.train.len(),
        validation = splits.validation.len(),
        test = splits.test.len(),
        "split dataset"
    );
    let mut loaders = Loaders::from_splits(splits, config.batch_size, config.seed);

    // Train
    let start_time = Local::now();
    let history = train_loop(&mut network, &mut loaders, &criterion, config)?;
    let finish_time = Local::now();
    if let Some(val) = history.final_val_accuracy() {
        info!("final validation acc: {:.2}%", val);
    }

    // Test and save
    let classes = network.metadata.output_labels.clone();
    let (report, confusion) = evaluate_test(&mut network, &loaders.test, &classes);

    // Stamped when saving, after the test pass.
    let run_dir = RunDir::create(&opts.results_dir, &opts.model, &Local::now())?;
    let log = RunLog {
        backbone: opts.model.clone(),
        start_time,
        finish_time,
        full_finetune: opts.full_finetune,
        focal_loss: opts.focal_loss,
    };
    save_history(&run_dir, &RunArtifacts {
        network: &network,
        config,
        history: &history,
        report: &report,
        confusion: &confusion,
        log: &log,
    })?;

    Ok(RunSummary { run_dir: run_dir.path, history, test_accuracy: report.accuracy })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(full_finetune: bool, backbone_weights: Option<PathBuf>) -> RunOptions {
        RunOptions {
            model: "cnn_tiny".into(),
            focal_loss: false,
            full_finetune,
            data_dir: PathBuf::from("data/mel"),
            results_dir: PathBuf::from("results"),
            backbone_weights,
            config: TrainConfig::default(),
        }
    }

    #[test]
    fn frozen_random_backbone_is_flagged() {
        let spec = BackboneSpec::lookup("cnn_tiny").unwrap();
        let mut network = Network::new(&spec, vec!["a".into(), "b".into()], &mut StdRng::seed_from_u64(0));

        let opts = options(true, None);
        network.set_full_finetune(opts.full_finetune);
        assert!(!frozen_without_weights(&network, &opts));

        let opts = options(false, None);
        network.set_full_finetune(opts.full_finetune);
        assert!(frozen_without_weights(&network, &opts));

        let opts = options(false, Some(PathBuf::from("earlier/save.json")));
        assert!(!frozen_without_weights(&network, &opts));
    }
}
