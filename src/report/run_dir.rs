use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{MelError, Result};

/// Formats a timestamp the way run directories are named: `2024-05-01_13-37-00`.
pub fn time_stamp(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Creates `path` and any missing parents; an existing directory is fine.
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| MelError::io(path, e))
}

/// Output directory of one run: `<results_dir>/<backbone>__<timestamp>`.
///
/// Every run gets a new directory; an existing one with the same name is an
/// error rather than being written into.
#[derive(Debug, Clone)]
pub struct RunDir {
    pub path: PathBuf,
}

impl RunDir {
    pub fn create(results_dir: &Path, backbone: &str, at: &DateTime<Local>) -> Result<RunDir> {
        create_dir(results_dir)?;
        let path = results_dir.join(format!("{}__{}", backbone, time_stamp(at)));
        fs::create_dir(&path).map_err(|e| MelError::io(&path, e))?;
        Ok(RunDir { path })
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}
