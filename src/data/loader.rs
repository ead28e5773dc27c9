use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::dataset::{MelSample, Splits};

/// Mini-batch iterator over an owned partition.
///
/// A shuffling loader draws a fresh permutation from its seeded RNG at the
/// start of every epoch, so the batch order is reproducible for a given seed.
#[derive(Debug, Clone)]
pub struct DataLoader {
    samples: Vec<MelSample>,
    batch_size: usize,
    rng: Option<StdRng>,
}

impl DataLoader {
    pub fn new(samples: Vec<MelSample>, batch_size: usize) -> DataLoader {
        assert!(batch_size > 0, "batch_size must be at least 1");
        DataLoader { samples, batch_size, rng: None }
    }

    pub fn shuffled(samples: Vec<MelSample>, batch_size: usize, seed: u64) -> DataLoader {
        let mut loader = DataLoader::new(samples, batch_size);
        loader.rng = Some(StdRng::seed_from_u64(seed));
        loader
    }

    /// Number of batches per epoch, counting the trailing partial batch.
    pub fn len(&self) -> usize {
        (self.samples.len() + self.batch_size - 1) / self.batch_size
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Batches in storage order without touching the shuffle RNG, for
    /// evaluation passes.
    pub fn sequential(&self) -> Batches<'_> {
        Batches {
            samples: &self.samples,
            order: (0..self.samples.len()).collect(),
            batch_size: self.batch_size,
            pos: 0,
        }
    }

    /// Starts a new epoch and returns its batches.
    pub fn epoch(&mut self) -> Batches<'_> {
        let mut order: Vec<usize> = (0..self.samples.len()).collect();
        if let Some(rng) = self.rng.as_mut() {
            order.shuffle(rng);
        }
        Batches { samples: &self.samples, order, batch_size: self.batch_size, pos: 0 }
    }
}

pub struct Batches<'a> {
    samples: &'a [MelSample],
    order: Vec<usize>,
    batch_size: usize,
    pos: usize,
}

impl<'a> Iterator for Batches<'a> {
    type Item = Vec<&'a MelSample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.order.len() {
            return None;
        }
        let end = (self.pos + self.batch_size).min(self.order.len());
        let batch = self.order[self.pos..end].iter().map(|&i| &self.samples[i]).collect();
        self.pos = end;
        Some(batch)
    }
}

/// Loaders for the three partitions; only the training loader shuffles.
#[derive(Debug, Clone)]
pub struct Loaders {
    pub train: DataLoader,
    pub validation: DataLoader,
    pub test: DataLoader,
}

impl Loaders {
    pub fn from_splits(splits: Splits, batch_size: usize, seed: u64) -> Loaders {
        Loaders {
            train: DataLoader::shuffled(splits.train, batch_size, seed),
            validation: DataLoader::new(splits.validation, batch_size),
            test: DataLoader::new(splits.test, batch_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::feature_map::FeatureMap;

    fn samples(n: usize) -> Vec<MelSample> {
        (0..n).map(|i| MelSample { mel: FeatureMap::from_vec(1, 1, 1, vec![i as f64]), label: 0 }).collect()
    }

    #[test]
    fn len_counts_partial_batch() {
        let loader = DataLoader::new(samples(10), 4);
        assert_eq!(loader.len(), 3);
        let mut loader = loader;
        let sizes: Vec<usize> = loader.epoch().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn shuffling_is_seeded_and_changes_per_epoch() {
        let mut a = DataLoader::shuffled(samples(32), 32, 7);
        let mut b = DataLoader::shuffled(samples(32), 32, 7);
        let order = |l: &mut DataLoader| -> Vec<f64> {
            l.epoch().flatten().map(|s| s.mel.data[0]).collect()
        };
        let first = order(&mut a);
        assert_eq!(first, order(&mut b));
        assert_ne!(first, order(&mut a));
    }

    #[test]
    fn sequential_does_not_advance_shuffle() {
        let mut a = DataLoader::shuffled(samples(16), 4, 3);
        let mut b = DataLoader::shuffled(samples(16), 4, 3);
        let in_order: Vec<f64> = a.sequential().flatten().map(|s| s.mel.data[0]).collect();
        assert_eq!(in_order, (0..16).map(|i| i as f64).collect::<Vec<_>>());
        let ea: Vec<f64> = a.epoch().flatten().map(|s| s.mel.data[0]).collect();
        let eb: Vec<f64> = b.epoch().flatten().map(|s| s.mel.data[0]).collect();
        assert_eq!(ea, eb);
    }
}
