use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ferrite_mel::{run, RunOptions, TrainConfig};

/// Train a convolutional classifier on mel spectrogram images.
#[derive(Parser, Debug)]
#[command(name = "ferrite-mel", version, about)]
struct Cli {
    /// Backbone identifier (cnn_tiny, cnn_small, cnn_wide)
    #[arg(long, default_value = "cnn_small")]
    model: String,

    /// Use focal loss instead of cross-entropy
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    fl: bool,

    /// Train the backbone too; `false` trains only the classifier head
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    fullfinetune: bool,

    /// Dataset root: one sub-directory of mel images per class
    #[arg(long, default_value = "data/mel")]
    data_dir: PathBuf,

    /// Parent directory of run directories
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,

    /// JSON training config; missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// `save.json` of an earlier run to initialise the backbone from
    #[arg(long)]
    backbone_weights: Option<PathBuf>,

    #[arg(long)]
    epochs: Option<usize>,

    /// Record the running loss every N batches
    #[arg(long)]
    iteration: Option<usize>,

    #[arg(long)]
    lr: Option<f64>,

    #[arg(long)]
    batch_size: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// tracing filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn train_config(&self) -> Result<TrainConfig> {
        let mut config = match &self.config {
            Some(path) => TrainConfig::load_json(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => TrainConfig::default(),
        };
        if let Some(v) = self.epochs { config.epoch_num = v; }
        if let Some(v) = self.iteration { config.iteration = v; }
        if let Some(v) = self.lr { config.learning_rate = v; }
        if let Some(v) = self.batch_size { config.batch_size = v; }
        if let Some(v) = self.seed { config.seed = v; }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid --log-level filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let opts = RunOptions {
        model: cli.model.clone(),
        focal_loss: cli.fl,
        full_finetune: cli.fullfinetune,
        data_dir: cli.data_dir.clone(),
        results_dir: cli.results_dir.clone(),
        backbone_weights: cli.backbone_weights.clone(),
        config: cli.train_config()?,
    };
    info!(model = %opts.model, focal_loss = opts.focal_loss, full_finetune = opts.full_finetune, "starting run");

    let summary = run(&opts)
        .with_context(|| format!("training run on {} failed", opts.data_dir.display()))?;
    info!(
        dir = %summary.run_dir.display(),
        test_accuracy = %format!("{:.2}%", 100.0 * summary.test_accuracy),
        "done"
    );
    Ok(())
}
