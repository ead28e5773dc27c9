pub mod classification;
pub mod confusion;

pub use classification::{ClassScores, ClassificationReport};
pub use confusion::{confusion_matrix, Normalize};

/// Fraction of positions where `y_true` and `y_pred` agree; 0 when empty.
pub fn accuracy_score(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}
