use crate::{layers::ParamMut, math::matrix::Matrix};

/// Stochastic gradient descent with classical momentum.
///
/// Update rule per parameter: `v = μ·v + g`, `p -= lr·v`. Velocity buffers
/// are matched to parameters by position, so callers must pass the same
/// parameter list (in the same order) on every step.
#[derive(Debug, Clone)]
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
    velocity: Vec<Matrix>,
}

impl Sgd {
    pub fn new(learning_rate: f64, momentum: f64) -> Sgd {
        Sgd { learning_rate, momentum, velocity: Vec::new() }
    }

    /// Applies one update using the accumulated gradients scaled by `grad_scale`
    /// (e.g. `1 / batch_size` for mean reduction).
    pub fn step(&mut self, params: Vec<ParamMut<'_>>, grad_scale: f64) {
        if self.velocity.len() != params.len() {
            self.velocity = params.iter()
                .map(|p| Matrix::zeros(p.value.rows, p.value.cols))
                .collect();
        }

        for (param, v) in params.into_iter().zip(self.velocity.iter_mut()) {
            v.scale(self.momentum);
            v.add_scaled(param.grad, grad_scale);
            param.value.add_scaled(v, -self.learning_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn momentum_accumulates_across_steps() {
        let mut sgd = Sgd::new(0.1, 0.9);
        let mut w = Matrix::from_vec(1, 1, vec![1.0]);
        let g = Matrix::from_vec(1, 1, vec![1.0]);

        sgd.step(vec![ParamMut { value: &mut w, grad: &g }], 1.0);
        assert!((w.data[0] - 0.9).abs() < 1e-12);

        // v = 0.9 * 1 + 1 = 1.9
        sgd.step(vec![ParamMut { value: &mut w, grad: &g }], 1.0);
        assert!((w.data[0] - (0.9 - 0.19)).abs() < 1e-12);
    }
}
