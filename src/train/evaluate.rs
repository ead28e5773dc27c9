use crate::data::loader::DataLoader;
use crate::math::{argmax, matrix::Matrix};
use crate::metrics::{accuracy_score, confusion_matrix, ClassificationReport, Normalize};
use crate::network::network::Network;

/// Runs inference over every sample of `loader` in storage order.
///
/// Returns `(y_true, y_pred)` where predictions are the argmax logit.
pub fn predict(network: &mut Network, loader: &DataLoader) -> (Vec<usize>, Vec<usize>) {
    let mut y_true = Vec::with_capacity(loader.num_samples());
    let mut y_pred = Vec::with_capacity(loader.num_samples());
    for batch in loader.sequential() {
        for sample in batch {
            let logits = network.forward(&sample.mel);
            y_true.push(sample.label);
            y_pred.push(argmax(&logits));
        }
    }
    (y_true, y_pred)
}

/// Accuracy over the whole partition, in percent. An empty partition scores 0.
pub fn evaluate_accuracy(network: &mut Network, loader: &DataLoader) -> f64 {
    let (y_true, y_pred) = predict(network, loader);
    100.0 * accuracy_score(&y_true, &y_pred)
}

/// Final test pass: per-class report plus the confusion matrix normalized
/// over all cells.
pub fn evaluate_test(
    network: &mut Network,
    loader: &DataLoader,
    classes: &[String],
) -> (ClassificationReport, Matrix) {
    let (y_true, y_pred) = predict(network, loader);
    let report = ClassificationReport::new(&y_true, &y_pred, classes);
    let cm = confusion_matrix(&y_true, &y_pred, classes.len(), Normalize::All);
    (report, cm)
}
