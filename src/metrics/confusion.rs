use crate::math::matrix::Matrix;

/// How [`confusion_matrix`] normalizes counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    /// Raw counts.
    None,
    /// Each row (true class) sums to 1.
    True,
    /// Each column (predicted class) sums to 1.
    Pred,
    /// The whole matrix sums to 1.
    All,
}

/// Rows are true classes, columns are predicted classes.
///
/// Rows/columns with no samples stay zero under normalization, as does an
/// empty matrix.
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], n_classes: usize, normalize: Normalize) -> Matrix {
    let mut cm = Matrix::zeros(n_classes, n_classes);
    for (&t, &p) in y_true.iter().zip(y_pred) {
        if t < n_classes && p < n_classes {
            cm.set(t, p, cm.get(t, p) + 1.0);
        }
    }

    match normalize {
        Normalize::None => {}
        Normalize::All => {
            let total = cm.sum();
            if total > 0.0 {
                cm.scale(1.0 / total);
            }
        }
        Normalize::True => {
            for r in 0..n_classes {
                let row = cm.row_mut(r);
                let total: f64 = row.iter().sum();
                if total > 0.0 {
                    row.iter_mut().for_each(|x| *x /= total);
                }
            }
        }
        Normalize::Pred => {
            for c in 0..n_classes {
                let total: f64 = (0..n_classes).map(|r| cm.get(r, c)).sum();
                if total > 0.0 {
                    for r in 0..n_classes {
                        cm.set(r, c, cm.get(r, c) / total);
                    }
                }
            }
        }
    }
    cm
}
