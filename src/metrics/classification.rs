use std::fmt;

/// Per-class precision / recall / F1 scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Precision, recall and F1 for every class plus accuracy and the macro and
/// support-weighted averages. Undefined ratios (0/0) are reported as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub labels: Vec<String>,
    pub per_class: Vec<ClassScores>,
    pub accuracy: f64,
    pub macro_avg: ClassScores,
    pub weighted_avg: ClassScores,
    pub digits: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Weighted mean of the per-class scores; all zeros when the weights sum to 0.
fn weighted_scores(per_class: &[ClassScores], weights: &[f64], support: usize) -> ClassScores {
    let norm: f64 = weights.iter().sum();
    let mean = |f: fn(&ClassScores) -> f64| {
        if norm == 0.0 {
            return 0.0;
        }
        per_class.iter().zip(weights).map(|(s, w)| w * f(s)).sum::<f64>() / norm
    };
    ClassScores {
        precision: mean(|s| s.precision),
        recall: mean(|s| s.recall),
        f1: mean(|s| s.f1),
        support,
    }
}

impl ClassificationReport {
    pub fn new(y_true: &[usize], y_pred: &[usize], labels: &[String]) -> ClassificationReport {
        let n = labels.len();
        let mut tp = vec![0usize; n];
        let mut predicted = vec![0usize; n];
        let mut actual = vec![0usize; n];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            if t < n {
                actual[t] += 1;
            }
            if p < n {
                predicted[p] += 1;
            }
            if t == p && t < n {
                tp[t] += 1;
            }
        }

        let per_class: Vec<ClassScores> = (0..n)
            .map(|c| {
                let precision = ratio(tp[c], predicted[c]);
                let recall = ratio(tp[c], actual[c]);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassScores { precision, recall, f1, support: actual[c] }
            })
            .collect();

        let total: usize = actual.iter().sum();
        let uniform = vec![1.0; n];
        let supports: Vec<f64> = actual.iter().map(|&a| a as f64).collect();
        let macro_avg = weighted_scores(&per_class, &uniform, total);
        let weighted_avg = weighted_scores(&per_class, &supports, total);

        ClassificationReport {
            labels: labels.to_vec(),
            accuracy: ratio(tp.iter().sum(), y_true.len()),
            per_class,
            macro_avg,
            weighted_avg,
            digits: 3,
        }
    }
}

fn write_row(
    f: &mut fmt::Formatter<'_>,
    width: usize,
    d: usize,
    name: &str,
    s: &ClassScores,
) -> fmt::Result {
    writeln!(
        f,
        "{:>width$}  {:>9.d$} {:>9.d$} {:>9.d$} {:>9}",
        name, s.precision, s.recall, s.f1, s.support,
        width = width, d = d
    )
}

impl fmt::Display for ClassificationReport {
    /// Fixed-width table: one row per class, then accuracy, macro avg and
    /// weighted avg.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const WEIGHTED: &str = "weighted avg";
        let d = self.digits;
        let width = self.labels.iter()
            .map(|l| l.chars().count())
            .chain(std::iter::once(WEIGHTED.len()))
            .max()
            .unwrap_or(0)
            .max(d);

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support",
            width = width
        )?;
        writeln!(f)?;

        for (label, scores) in self.labels.iter().zip(&self.per_class) {
            write_row(f, width, d, label, scores)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.d$} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support,
            width = width, d = d
        )?;
        write_row(f, width, d, "macro avg", &self.macro_avg)?;
        write_row(f, width, d, WEIGHTED, &self.weighted_avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["cat".into(), "dog".into()]
    }

    #[test]
    fn scores_match_hand_computation() {
        // cat: tp=2 fp=1 fn=1, dog: tp=1 fp=1 fn=1
        let report = ClassificationReport::new(&[0, 0, 0, 1, 1], &[0, 0, 1, 1, 0], &labels());
        let cat = &report.per_class[0];
        assert!((cat.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((cat.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(cat.support, 3);
        assert!((report.accuracy - 0.6).abs() < 1e-12);
        assert!((report.macro_avg.recall - (2.0 / 3.0 + 0.5) / 2.0).abs() < 1e-12);
        assert!((report.weighted_avg.recall - 0.6).abs() < 1e-12);
    }

    #[test]
    fn never_predicted_class_scores_zero() {
        let report = ClassificationReport::new(&[0, 1], &[0, 0], &labels());
        assert_eq!(report.per_class[1].precision, 0.0);
        assert_eq!(report.per_class[1].f1, 0.0);
    }

    #[test]
    fn rendered_table_lists_every_row() {
        let report = ClassificationReport::new(&[0, 1], &[0, 1], &labels());
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("         cat      1.000     1.000     1.000         1"));
        assert!(text.contains("weighted avg      1.000"));
        assert!(text.lines().any(|l| l.trim_start().starts_with("accuracy")));
    }
}
