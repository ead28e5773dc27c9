use serde::{Serialize, Deserialize};

use crate::math::feature_map::FeatureMap;

/// 2×2 max pooling with stride 2. Odd trailing rows/columns are dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaxPool2d {
    #[serde(skip)]
    input_shape: (usize, usize, usize),
    #[serde(skip)]
    winners: Vec<usize>, // flat input index chosen for each output cell
}

impl MaxPool2d {
    pub const SIZE: usize = 2;

    pub fn new() -> MaxPool2d {
        MaxPool2d::default()
    }

    pub fn output_size(height: usize, width: usize) -> (usize, usize) {
        (height / Self::SIZE, width / Self::SIZE)
    }

    pub fn forward(&mut self, input: &FeatureMap) -> FeatureMap {
        let (oh, ow) = Self::output_size(input.height, input.width);
        let mut out = FeatureMap::zeros(input.channels, oh, ow);
        self.winners = vec![0; out.data.len()];

        for c in 0..input.channels {
            for y in 0..oh {
                for x in 0..ow {
                    let mut best_idx = input.index(c, y * Self::SIZE, x * Self::SIZE);
                    for dy in 0..Self::SIZE {
                        for dx in 0..Self::SIZE {
                            let idx = input.index(c, y * Self::SIZE + dy, x * Self::SIZE + dx);
                            if input.data[idx] > input.data[best_idx] {
                                best_idx = idx;
                            }
                        }
                    }
                    let o = out.index(c, y, x);
                    out.data[o] = input.data[best_idx];
                    self.winners[o] = best_idx;
                }
            }
        }

        self.input_shape = input.shape();
        out
    }

    /// Routes each output gradient back to the input cell that won the max.
    pub fn backward(&self, grad_out: &FeatureMap) -> FeatureMap {
        let (c, h, w) = self.input_shape;
        let mut grad_in = FeatureMap::zeros(c, h, w);
        for (g, &idx) in grad_out.data.iter().zip(&self.winners) {
            grad_in.data[idx] += g;
        }
        grad_in
    }
}

/// Averages each channel down to a single value, producing the head's input vector.
#[derive(Debug, Clone, Default)]
pub struct GlobalAvgPool {
    input_shape: (usize, usize, usize),
}

impl GlobalAvgPool {
    pub fn forward(&mut self, input: &FeatureMap) -> Vec<f64> {
        self.input_shape = input.shape();
        let area = (input.height * input.width).max(1) as f64;
        (0..input.channels)
            .map(|c| input.plane(c).iter().sum::<f64>() / area)
            .collect()
    }

    pub fn backward(&self, grad_out: &[f64]) -> FeatureMap {
        let (c, h, w) = self.input_shape;
        let area = (h * w).max(1) as f64;
        let mut data = Vec::with_capacity(c * h * w);
        for &g in grad_out.iter().take(c) {
            data.extend(std::iter::repeat(g / area).take(h * w));
        }
        FeatureMap::from_vec(c, h, w, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_pool_routes_gradient_to_winner() {
        let input = FeatureMap::from_vec(1, 2, 4, vec![
            1.0, 5.0, 0.0, 0.0,
            2.0, 3.0, 0.0, 9.0,
        ]);
        let mut pool = MaxPool2d::new();
        let out = pool.forward(&input);
        assert_eq!(out.data, vec![5.0, 9.0]);

        let grad = pool.backward(&FeatureMap::from_vec(1, 1, 2, vec![1.0, 2.0]));
        assert_eq!(grad.data, vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn global_average_spreads_gradient_evenly() {
        let input = FeatureMap::from_vec(2, 1, 2, vec![1.0, 3.0, -2.0, 2.0]);
        let mut gap = GlobalAvgPool::default();
        assert_eq!(gap.forward(&input), vec![2.0, 0.0]);
        assert_eq!(gap.backward(&[1.0, 4.0]).data, vec![0.5, 0.5, 2.0, 2.0]);
    }
}
