use crate::math::softmax;

/// Categorical cross-entropy on raw logits (softmax applied internally).
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

impl CrossEntropyLoss {
    /// L = -log(softmax(logits)[target])
    pub fn loss(&self, logits: &[f64], target: usize) -> f64 {
        let p = softmax(logits);
        -(p[target] + EPS).ln()
    }

    /// ∂L/∂z_i = softmax(z)_i - onehot(target)_i
    pub fn derivative(&self, logits: &[f64], target: usize) -> Vec<f64> {
        let mut grad = softmax(logits);
        grad[target] -= 1.0;
        grad
    }
}
