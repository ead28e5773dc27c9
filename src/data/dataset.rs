use std::fs;
use std::path::{Path, PathBuf};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{debug, info};

use crate::data::decode::{is_supported_image, load_mel_image};
use crate::error::{MelError, Result};
use crate::math::feature_map::FeatureMap;

/// One labeled spectrogram.
#[derive(Debug, Clone, PartialEq)]
pub struct MelSample {
    pub mel: FeatureMap,
    pub label: usize,
}

/// Files discovered under a dataset root, before any decoding.
///
/// Layout: `<root>/<class_name>/<clip>.png`. Classes are the sorted
/// subdirectory names and a sample's label is its class's index.
#[derive(Debug, Clone)]
pub struct DatasetIndex {
    pub root: PathBuf,
    pub classes: Vec<String>,
    pub files: Vec<(PathBuf, usize)>,
}

impl DatasetIndex {
    pub fn scan(root: &Path) -> Result<DatasetIndex> {
        if !root.is_dir() {
            return Err(MelError::InvalidDataset(format!(
                "dataset root '{}' is not a directory",
                root.display()
            )));
        }

        let mut class_dirs: Vec<PathBuf> = read_dir_sorted(root)?
            .into_iter()
            .filter(|p| p.is_dir())
            .collect();
        class_dirs.sort();
        if class_dirs.is_empty() {
            return Err(MelError::InvalidDataset(format!(
                "no class directories under '{}'",
                root.display()
            )));
        }

        let mut classes = Vec::with_capacity(class_dirs.len());
        let mut files = Vec::new();
        for (label, dir) in class_dirs.iter().enumerate() {
            let name = dir.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let clips: Vec<PathBuf> = read_dir_sorted(dir)?
                .into_iter()
                .filter(|p| p.is_file() && is_supported_image(p))
                .collect();
            if clips.is_empty() {
                return Err(MelError::InvalidDataset(format!(
                    "class '{}' has no mel images",
                    name
                )));
            }
            debug!(class = %name, clips = clips.len(), "found class");
            files.extend(clips.into_iter().map(|p| (p, label)));
            classes.push(name);
        }

        Ok(DatasetIndex { root: root.to_path_buf(), classes, files })
    }

    /// Number of clips per class, indexed by label.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.classes.len()];
        for (_, label) in &self.files {
            counts[*label] += 1;
        }
        counts
    }

    /// Decodes every clip, resized to the network's `(height, width)`.
    pub fn load(&self, input_size: (usize, usize)) -> Result<MelDataset> {
        let (height, width) = input_size;
        let samples = self.files.iter()
            .map(|(path, label)| {
                load_mel_image(path, height, width).map(|mel| MelSample { mel, label: *label })
            })
            .collect::<Result<Vec<_>>>()?;
        info!(
            root = %self.root.display(),
            classes = self.classes.len(),
            samples = samples.len(),
            "loaded mel dataset"
        );
        MelDataset::new(self.classes.clone(), samples)
    }
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| MelError::io(dir, e))?;
    let mut paths = entries
        .map(|entry| entry.map(|e| e.path()).map_err(|e| MelError::io(dir, e)))
        .collect::<Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}

/// A decoded, labeled dataset.
#[derive(Debug, Clone)]
pub struct MelDataset {
    pub classes: Vec<String>,
    pub samples: Vec<MelSample>,
}

/// Train / validation / test partitions of a [`MelDataset`].
#[derive(Debug, Clone)]
pub struct Splits {
    pub train: Vec<MelSample>,
    pub validation: Vec<MelSample>,
    pub test: Vec<MelSample>,
}

impl MelDataset {
    pub fn new(classes: Vec<String>, samples: Vec<MelSample>) -> Result<MelDataset> {
        if samples.is_empty() {
            return Err(MelError::InvalidDataset("dataset has no samples".into()));
        }
        if let Some(bad) = samples.iter().find(|s| s.label >= classes.len()) {
            return Err(MelError::InvalidDataset(format!(
                "label {} out of range for {} classes",
                bad.label,
                classes.len()
            )));
        }
        let shape = samples[0].mel.shape();
        if samples.iter().any(|s| s.mel.shape() != shape) {
            return Err(MelError::ShapeMismatch(format!(
                "all mel inputs must share shape {:?}",
                shape
            )));
        }
        Ok(MelDataset { classes, samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.classes.len()];
        for s in &self.samples {
            counts[s.label] += 1;
        }
        counts
    }

    /// Stratified split: each class is shuffled with `seed` and cut by
    /// `ratios = [train, validation, test]`.
    pub fn split(self, ratios: [f64; 3], seed: u64) -> Result<Splits> {
        validate_ratios(ratios)?;

        let mut by_class: Vec<Vec<MelSample>> = vec![Vec::new(); self.classes.len()];
        for sample in self.samples {
            by_class[sample.label].push(sample);
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut splits = Splits { train: Vec::new(), validation: Vec::new(), test: Vec::new() };
        for mut group in by_class {
            group.shuffle(&mut rng);
            let n = group.len();
            let n_train = ((n as f64 * ratios[0]).round() as usize).min(n);
            let n_val = ((n as f64 * ratios[1]).round() as usize).min(n - n_train);

            let mut rest = group.split_off(n_train);
            let test = rest.split_off(n_val);
            splits.train.extend(group);
            splits.validation.extend(rest);
            splits.test.extend(test);
        }

        if splits.train.is_empty() {
            return Err(MelError::InvalidDataset("training split is empty".into()));
        }
        Ok(splits)
    }
}

fn validate_ratios(ratios: [f64; 3]) -> Result<()> {
    if ratios.iter().any(|r| !r.is_finite() || *r < 0.0) {
        return Err(MelError::InvalidConfig(format!("split ratios must be non-negative, got {:?}", ratios)));
    }
    if ratios[0] <= 0.0 {
        return Err(MelError::InvalidConfig("train split ratio must be positive".into()));
    }
    let total: f64 = ratios.iter().sum();
    if (total - 1.0).abs() > 1e-6 {
        return Err(MelError::InvalidConfig(format!("split ratios must sum to 1, got {}", total)));
    }
    Ok(())
}
