//! Evaluation metrics for the binary churn classifier.

use serde::{Deserialize, Serialize};

use super::forest::RandomForestModel;

/// Confusion matrix for a `K`-class classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub fn rows(&self) -> Vec<Vec<u32>> {
        self.counts
            .chunks(self.n_classes.max(1))
            .map(<[u32]>::to_vec)
            .collect()
    }
}

/// Held-out evaluation of a classifier, scored for one positive class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Number of evaluated rows.
    pub rows: usize,
    pub accuracy: f32,
    /// `TP / (TP + FP)` for the positive class.
    pub precision: f32,
    /// `TP / (TP + FN)` for the positive class.
    pub recall: f32,
    pub f1: f32,
    /// Rows = truth, columns = prediction.
    pub confusion: Vec<Vec<u32>>,
}

/// Score `model` on `(x, y)`, treating class `positive` as the event of interest.
pub fn evaluate(
    model: &RandomForestModel,
    x: &[Vec<f32>],
    y: &[usize],
    positive: usize,
) -> EvaluationReport {
    let mut cm = ConfusionMatrix::new(model.classes.len());
    for (row, &truth) in x.iter().zip(y) {
        cm.add(truth, model.predict_class_index(row));
    }
    report_from_confusion(&cm, positive)
}

pub fn report_from_confusion(cm: &ConfusionMatrix, positive: usize) -> EvaluationReport {
    let k = cm.n_classes;
    let tp = cm.get(positive, positive) as f32;
    let fp: f32 = (0..k)
        .filter(|&truth| truth != positive)
        .map(|truth| cm.get(truth, positive) as f32)
        .sum();
    let fn_: f32 = (0..k)
        .filter(|&pred| pred != positive)
        .map(|pred| cm.get(positive, pred) as f32)
        .sum();
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = ratio(2.0 * precision * recall, precision + recall);
    EvaluationReport {
        rows: cm.total() as usize,
        accuracy: accuracy(cm),
        precision,
        recall,
        f1,
        confusion: cm.rows(),
    }
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f32 {
    let correct: u64 = (0..cm.n_classes).map(|i| cm.get(i, i) as u64).sum();
    ratio(correct as f32, cm.total() as f32)
}

fn ratio(num: f32, den: f32) -> f32 {
    if den == 0.0 { 0.0 } else { num / den }
}
