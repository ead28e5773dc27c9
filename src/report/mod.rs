pub mod csv;
pub mod log;
pub mod plot;
pub mod run_dir;

pub use log::{write_result_log, RunLog};
pub use run_dir::{create_dir, time_stamp, RunDir};

use tracing::info;

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::metrics::ClassificationReport;
use crate::network::network::Network;
use crate::train::{TrainConfig, TrainHistory};

/// Everything a finished run leaves behind.
pub struct RunArtifacts<'a> {
    pub network: &'a Network,
    pub config: &'a TrainConfig,
    pub history: &'a TrainHistory,
    pub report: &'a ClassificationReport,
    pub confusion: &'a Matrix,
    pub log: &'a RunLog,
}

/// Writes every artifact of a run into `run_dir` and echoes the test
/// results through `tracing`.
pub fn save_history(run_dir: &RunDir, artifacts: &RunArtifacts<'_>) -> Result<()> {
    let history = artifacts.history;
    let classes = &artifacts.network.metadata.output_labels;

    artifacts.network.save_json(&run_dir.file("save.json"))?;
    artifacts.config.save_json(&run_dir.file("config.json"))?;

    csv::write_acc_csv(&run_dir.file("acc.csv"), &history.tra_acc, &history.val_acc, &history.lr)?;
    csv::write_loss_csv(&run_dir.file("loss.csv"), &history.loss)?;
    csv::write_matrix_csv(&run_dir.file("mat.csv"), artifacts.confusion)?;

    plot::save_acc(&run_dir.file("acc.svg"), &history.tra_acc, &history.val_acc)?;
    plot::save_loss(&run_dir.file("loss.svg"), &history.loss)?;
    plot::save_confusion_matrix(&run_dir.file("mat.svg"), artifacts.confusion, classes)?;

    write_result_log(&run_dir.file("result.log"), artifacts.report, artifacts.log)?;

    info!("test report\n{}", artifacts.report);
    info!("confusion matrix (normalized over all cells)\n{}", format_matrix(artifacts.confusion));
    info!("{}", artifacts.log);
    info!(dir = %run_dir.path.display(), "run saved");
    Ok(())
}

/// Rows of `m` with three decimals, space separated.
pub fn format_matrix(m: &Matrix) -> String {
    (0..m.rows)
        .map(|r| m.row(r).iter().map(|v| format!("{:.3}", v)).collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_rows_use_three_decimals() {
        let m = Matrix::from_vec(2, 2, vec![0.5, 0.0, 0.125, 0.375]);
        assert_eq!(format_matrix(&m), "0.500 0.000\n0.125 0.375");
    }
}
