use serde::{Serialize, Deserialize};

/// A `channels × height × width` activation volume, stored channel-major.
///
/// Mel spectrograms enter the network as a single-channel feature map with
/// mel bins along `height` and time frames along `width`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMap {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub data: Vec<f64>,
}

impl FeatureMap {
    pub fn zeros(channels: usize, height: usize, width: usize) -> FeatureMap {
        FeatureMap { channels, height, width, data: vec![0.0; channels * height * width] }
    }

    pub fn from_vec(channels: usize, height: usize, width: usize, data: Vec<f64>) -> FeatureMap {
        assert_eq!(
            data.len(),
            channels * height * width,
            "FeatureMap::from_vec: buffer of {} does not fit {}x{}x{}",
            data.len(), channels, height, width
        );
        FeatureMap { channels, height, width, data }
    }

    #[inline]
    pub fn index(&self, c: usize, y: usize, x: usize) -> usize {
        (c * self.height + y) * self.width + x
    }

    #[inline]
    pub fn get(&self, c: usize, y: usize, x: usize) -> f64 {
        self.data[self.index(c, y, x)]
    }

    pub fn plane(&self, c: usize) -> &[f64] {
        let n = self.height * self.width;
        &self.data[c * n..(c + 1) * n]
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.channels, self.height, self.width)
    }
}
