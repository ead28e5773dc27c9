use serde::{Serialize, Deserialize};

use crate::loss::{cross_entropy::CrossEntropyLoss, focal::FocalLoss};

/// Selects which loss the training loop optimizes.
///
/// - `CrossEntropy` — standard softmax cross-entropy.
/// - `Focal`        — class-imbalance aware focal loss; α comes from the
///   per-class sample counts of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    CrossEntropy,
    Focal,
}

/// A configured loss, evaluated one sample at a time on raw logits.
#[derive(Debug, Clone)]
pub enum Criterion {
    CrossEntropy(CrossEntropyLoss),
    Focal(FocalLoss),
}

impl Criterion {
    pub fn new(loss_type: LossType, class_counts: &[usize], gamma: f64) -> Criterion {
        match loss_type {
            LossType::CrossEntropy => Criterion::CrossEntropy(CrossEntropyLoss),
            LossType::Focal => Criterion::Focal(FocalLoss::from_class_counts(class_counts, gamma)),
        }
    }

    pub fn loss_type(&self) -> LossType {
        match self {
            Criterion::CrossEntropy(_) => LossType::CrossEntropy,
            Criterion::Focal(_) => LossType::Focal,
        }
    }

    pub fn loss(&self, logits: &[f64], target: usize) -> f64 {
        match self {
            Criterion::CrossEntropy(ce) => ce.loss(logits, target),
            Criterion::Focal(fl) => fl.loss(logits, target),
        }
    }

    pub fn derivative(&self, logits: &[f64], target: usize) -> Vec<f64> {
        match self {
            Criterion::CrossEntropy(ce) => ce.derivative(logits, target),
            Criterion::Focal(fl) => fl.derivative(logits, target),
        }
    }
}
