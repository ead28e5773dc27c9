use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{
    activation::activation::ActivationFunction,
    layers::ParamMut,
    math::{feature_map::FeatureMap, matrix::Matrix},
};

/// 2-D convolution with stride 1 and "same" zero padding, activation fused.
///
/// Kernels are stored as a `(out_channels, in_channels * k * k)` matrix, each
/// row laid out as `[in_channel][ky][kx]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conv2d {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
    #[serde(skip)]
    input: FeatureMap,
    #[serde(skip)]
    pre_neurons: FeatureMap,
    #[serde(skip)]
    grad_w: Matrix,
    #[serde(skip)]
    grad_b: Matrix,
}

impl Conv2d {
    pub fn new<R: Rng + ?Sized>(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Conv2d {
        assert!(kernel_size % 2 == 1, "Conv2d: 'same' padding needs an odd kernel, got {}", kernel_size);
        let fan_in = in_channels * kernel_size * kernel_size;
        let weights = Matrix::he(out_channels, fan_in, fan_in, rng);
        let biases = Matrix::zeros(1, out_channels);

        Conv2d {
            in_channels,
            out_channels,
            kernel_size,
            grad_w: Matrix::zeros(weights.rows, weights.cols),
            grad_b: Matrix::zeros(1, out_channels),
            weights,
            biases,
            activator: activation,
            input: FeatureMap::default(),
            pre_neurons: FeatureMap::default(),
        }
    }

    #[inline]
    fn kernel_index(&self, i: usize, ky: usize, kx: usize) -> usize {
        (i * self.kernel_size + ky) * self.kernel_size + kx
    }

    pub fn forward(&mut self, input: &FeatureMap) -> FeatureMap {
        assert_eq!(
            input.channels, self.in_channels,
            "Conv2d: expected {} input channels, got {}",
            self.in_channels, input.channels
        );
        let (h, w) = (input.height, input.width);
        let k = self.kernel_size;
        let pad = (k / 2) as isize;

        let mut pre = FeatureMap::zeros(self.out_channels, h, w);
        for o in 0..self.out_channels {
            let kernel = self.weights.row(o);
            let bias = self.biases.data[o];
            for y in 0..h {
                for x in 0..w {
                    let mut s = bias;
                    for i in 0..self.in_channels {
                        for ky in 0..k {
                            let iy = y as isize + ky as isize - pad;
                            if iy < 0 || iy >= h as isize {
                                continue;
                            }
                            for kx in 0..k {
                                let ix = x as isize + kx as isize - pad;
                                if ix < 0 || ix >= w as isize {
                                    continue;
                                }
                                s += kernel[self.kernel_index(i, ky, kx)]
                                    * input.get(i, iy as usize, ix as usize);
                            }
                        }
                    }
                    let idx = pre.index(o, y, x);
                    pre.data[idx] = s;
                }
            }
        }

        let out = FeatureMap {
            channels: pre.channels,
            height: h,
            width: w,
            data: pre.data.iter().map(|&z| self.activator.function(z)).collect(),
        };
        self.input = input.clone();
        self.pre_neurons = pre;
        out
    }

    /// Backpropagates ∂L/∂output, accumulating kernel and bias gradients.
    ///
    /// Returns ∂L/∂input when `want_input_grad` is set; the first block of a
    /// network has no upstream layer and skips that work.
    pub fn backward(&mut self, grad_out: &FeatureMap, want_input_grad: bool) -> Option<FeatureMap> {
        if self.grad_w.shape() != self.weights.shape() {
            self.zero_grad();
        }
        let (h, w) = (self.input.height, self.input.width);
        let k = self.kernel_size;
        let pad = (k / 2) as isize;

        let delta: Vec<f64> = grad_out.data.iter().zip(&self.pre_neurons.data)
            .map(|(g, &z)| g * self.activator.derivative(z))
            .collect();

        let mut grad_in = if want_input_grad {
            Some(FeatureMap::zeros(self.in_channels, h, w))
        } else {
            None
        };

        for o in 0..self.out_channels {
            let plane = &delta[o * h * w..(o + 1) * h * w];
            self.grad_b.data[o] += plane.iter().sum::<f64>();

            for y in 0..h {
                for x in 0..w {
                    let d = plane[y * w + x];
                    if d == 0.0 {
                        continue;
                    }
                    for i in 0..self.in_channels {
                        for ky in 0..k {
                            let iy = y as isize + ky as isize - pad;
                            if iy < 0 || iy >= h as isize {
                                continue;
                            }
                            for kx in 0..k {
                                let ix = x as isize + kx as isize - pad;
                                if ix < 0 || ix >= w as isize {
                                    continue;
                                }
                                let col = self.kernel_index(i, ky, kx);
                                let in_idx = self.input.index(i, iy as usize, ix as usize);
                                let gw = self.grad_w.get(o, col) + d * self.input.data[in_idx];
                                self.grad_w.set(o, col, gw);
                                if let Some(ref mut gi) = grad_in {
                                    gi.data[in_idx] += d * self.weights.get(o, col);
                                }
                            }
                        }
                    }
                }
            }
        }

        grad_in
    }

    pub fn zero_grad(&mut self) {
        self.grad_w.reset_like(&self.weights);
        self.grad_b.reset_like(&self.biases);
    }

    pub fn params_mut(&mut self) -> [ParamMut<'_>; 2] {
        if self.grad_w.shape() != self.weights.shape() {
            self.zero_grad();
        }
        [
            ParamMut { value: &mut self.weights, grad: &self.grad_w },
            ParamMut { value: &mut self.biases, grad: &self.grad_b },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn sum_output(conv: &mut Conv2d, input: &FeatureMap) -> f64 {
        conv.forward(input).data.iter().sum()
    }

    #[test]
    fn same_padding_preserves_spatial_size() {
        let mut conv = Conv2d::new(1, 4, 3, ActivationFunction::ReLU, &mut StdRng::seed_from_u64(1));
        let out = conv.forward(&FeatureMap::zeros(1, 5, 7));
        assert_eq!(out.shape(), (4, 5, 7));
    }

    #[test]
    fn gradients_match_finite_difference() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut conv = Conv2d::new(2, 3, 3, ActivationFunction::Identity, &mut rng);
        let data: Vec<f64> = (0..2 * 4 * 4).map(|i| ((i * 7 % 11) as f64 - 5.0) / 5.0).collect();
        let input = FeatureMap::from_vec(2, 4, 4, data);

        let out = conv.forward(&input);
        conv.zero_grad();
        let ones = FeatureMap::from_vec(out.channels, out.height, out.width, vec![1.0; out.data.len()]);
        let grad_in = conv.backward(&ones, true).unwrap();

        let eps = 1e-6;
        for idx in [0, 5, 17, 31] {
            let mut plus = input.clone();
            plus.data[idx] += eps;
            let mut minus = input.clone();
            minus.data[idx] -= eps;
            let numeric = (sum_output(&mut conv, &plus) - sum_output(&mut conv, &minus)) / (2.0 * eps);
            assert!((numeric - grad_in.data[idx]).abs() < 1e-5, "input grad at {}", idx);
        }

        let analytic = conv.grad_w.get(1, 4);
        let original = conv.weights.get(1, 4);
        conv.weights.set(1, 4, original + eps);
        let lp = sum_output(&mut conv, &input);
        conv.weights.set(1, 4, original - eps);
        let lm = sum_output(&mut conv, &input);
        assert!(((lp - lm) / (2.0 * eps) - analytic).abs() < 1e-5);
        assert!((conv.grad_b.data[2] - 16.0).abs() < 1e-12);
    }
}
