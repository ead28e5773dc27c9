use std::fmt;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::error::{MelError, Result};
use crate::metrics::ClassificationReport;

/// Run metadata appended to `result.log` below the classification report.
#[derive(Debug, Clone)]
pub struct RunLog {
    pub backbone: String,
    pub start_time: DateTime<Local>,
    pub finish_time: DateTime<Local>,
    pub full_finetune: bool,
    pub focal_loss: bool,
}

impl RunLog {
    /// Wall-clock duration of the run in whole seconds.
    pub fn time_cost_secs(&self) -> i64 {
        (self.finish_time - self.start_time).num_seconds()
    }
}

impl fmt::Display for RunLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
        writeln!(f, "Backbone     : {}", self.backbone)?;
        writeln!(f, "Start time   : {}", self.start_time.format(FORMAT))?;
        writeln!(f, "Finish time  : {}", self.finish_time.format(FORMAT))?;
        writeln!(f, "Time cost    : {}s", self.time_cost_secs())?;
        writeln!(f, "Full finetune: {}", self.full_finetune)?;
        writeln!(f, "Focal loss   : {}", self.focal_loss)
    }
}

/// Writes `result.log`: the test report, a blank line, then the run log.
pub fn write_result_log(path: &Path, report: &ClassificationReport, log: &RunLog) -> Result<()> {
    let text = format!("{}\n{}", report, log);
    std::fs::write(path, text).map_err(|e| MelError::io(path, e))
}
