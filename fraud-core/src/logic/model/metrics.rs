//! Evaluation metrics for the offline trainer

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::threshold::DecisionThreshold;

const EPSILON: f64 = 1e-7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub loss: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    /// ROC AUC; `None` when only one class is present
    pub auc: Option<f64>,
    pub threshold: f64,
    pub samples: usize,
}

/// Mean binary cross-entropy with clipped probabilities
pub fn binary_cross_entropy(probs: &Array1<f64>, labels: &Array1<f64>) -> f64 {
    if probs.is_empty() {
        return 0.0;
    }

    let total: f64 = probs
        .iter()
        .zip(labels.iter())
        .map(|(&p, &y)| {
            let p = p.clamp(EPSILON, 1.0 - EPSILON);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();

    total / probs.len() as f64
}

pub fn evaluate(probs: &Array1<f64>, labels: &Array1<f64>, threshold: DecisionThreshold) -> EvaluationMetrics {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut tn = 0usize;
    let mut fn_ = 0usize;

    for (&p, &y) in probs.iter().zip(labels.iter()) {
        match (threshold.is_fraud(p), y >= 0.5) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fn_ += 1,
        }
    }

    let n = probs.len();
    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

    EvaluationMetrics {
        loss: binary_cross_entropy(probs, labels),
        accuracy: ratio(tp + tn, n),
        precision: ratio(tp, tp + fp),
        recall: ratio(tp, tp + fn_),
        auc: roc_auc(probs, labels),
        threshold: threshold.value(),
        samples: n,
    }
}

/// Mann-Whitney formulation with average ranks for ties
pub fn roc_auc(probs: &Array1<f64>, labels: &Array1<f64>) -> Option<f64> {
    let mut scored: Vec<(f64, bool)> = probs
        .iter()
        .zip(labels.iter())
        .map(|(&p, &y)| (p, y >= 0.5))
        .collect();

    let positives = scored.iter().filter(|(_, pos)| *pos).count();
    let negatives = scored.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < scored.len() {
        let mut j = i;
        while j + 1 < scored.len() && scored[j + 1].0 == scored[i].0 {
            j += 1;
        }
        // ranks are 1-based; tied block i..=j shares the average rank
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        let tied_positives = scored[i..=j].iter().filter(|(_, pos)| *pos).count();
        rank_sum += avg_rank * tied_positives as f64;
        i = j + 1;
    }

    let p = positives as f64;
    Some((rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64))
}
