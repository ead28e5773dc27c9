use crate::math::softmax;

const EPS: f64 = 1e-12;

/// Focal loss: FL = -α_t · (1 - p_t)^γ · log(p_t).
///
/// Down-weights well-classified examples (large p_t) and, through α,
/// majority classes. With γ = 0 and α = 1 it reduces to cross-entropy.
#[derive(Debug, Clone, PartialEq)]
pub struct FocalLoss {
    pub alpha: Vec<f64>,
    pub gamma: f64,
}

impl FocalLoss {
    pub const DEFAULT_GAMMA: f64 = 2.0;

    /// Derives α from per-class sample counts as inverse frequency,
    /// α_c = N / (C · n_c), so every class carries the same total weight and
    /// the per-sample mean of α is 1. Empty classes get α = 1.
    pub fn from_class_counts(counts: &[usize], gamma: f64) -> FocalLoss {
        let total: usize = counts.iter().sum();
        let n_classes = counts.len().max(1) as f64;
        let alpha = counts.iter()
            .map(|&n| if n == 0 { 1.0 } else { total as f64 / (n_classes * n as f64) })
            .collect();
        FocalLoss { alpha, gamma }
    }

    fn alpha_for(&self, target: usize) -> f64 {
        self.alpha.get(target).copied().unwrap_or(1.0)
    }

    pub fn loss(&self, logits: &[f64], target: usize) -> f64 {
        let pt = softmax(logits)[target];
        -self.alpha_for(target) * (1.0 - pt).powf(self.gamma) * (pt + EPS).ln()
    }

    /// ∂FL/∂z_j = α·[γ(1-p_t)^(γ-1)·p_t·log p_t - (1-p_t)^γ]·(δ_tj - p_j)
    pub fn derivative(&self, logits: &[f64], target: usize) -> Vec<f64> {
        let p = softmax(logits);
        let pt = p[target];
        let one_minus = 1.0 - pt;

        let focus = if self.gamma == 0.0 || one_minus <= 0.0 {
            0.0
        } else {
            self.gamma * one_minus.powf(self.gamma - 1.0) * pt * (pt + EPS).ln()
        };
        let coeff = self.alpha_for(target) * (focus - one_minus.powf(self.gamma));

        p.iter().enumerate()
            .map(|(j, &pj)| {
                let indicator = if j == target { 1.0 } else { 0.0 };
                coeff * (indicator - pj)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::cross_entropy::CrossEntropyLoss;

    #[test]
    fn alpha_is_inverse_frequency_with_unit_sample_mean() {
        let fl = FocalLoss::from_class_counts(&[30, 10, 20], 2.0);
        assert!((fl.alpha[1] - 2.0).abs() < 1e-12);
        assert!(fl.alpha[0] < fl.alpha[2] && fl.alpha[2] < fl.alpha[1]);
        let weighted: f64 = [30.0, 10.0, 20.0].iter().zip(&fl.alpha).map(|(n, a)| n * a).sum();
        assert!((weighted - 60.0).abs() < 1e-9);
    }

    #[test]
    fn gamma_zero_unit_alpha_equals_cross_entropy() {
        let fl = FocalLoss { alpha: vec![1.0; 3], gamma: 0.0 };
        let logits = [0.2, -1.0, 0.7];
        let ce = CrossEntropyLoss;
        assert!((fl.loss(&logits, 2) - ce.loss(&logits, 2)).abs() < 1e-12);
        for (a, b) in fl.derivative(&logits, 2).iter().zip(ce.derivative(&logits, 2)) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let fl = FocalLoss { alpha: vec![0.5, 1.5, 1.0], gamma: 2.0 };
        let logits = [0.3, -0.4, 1.2];
        let grad = fl.derivative(&logits, 1);
        let eps = 1e-6;
        for j in 0..3 {
            let mut up = logits;
            up[j] += eps;
            let mut down = logits;
            down[j] -= eps;
            let numeric = (fl.loss(&up, 1) - fl.loss(&down, 1)) / (2.0 * eps);
            assert!((numeric - grad[j]).abs() < 1e-6, "component {}", j);
        }
    }

    #[test]
    fn confident_examples_are_down_weighted() {
        let fl = FocalLoss { alpha: vec![1.0, 1.0], gamma: 2.0 };
        let ce = CrossEntropyLoss;
        let easy = [4.0, -4.0];
        assert!(fl.loss(&easy, 0) < 0.01 * ce.loss(&easy, 0));
    }
}
