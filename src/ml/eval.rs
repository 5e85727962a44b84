// ============================================================
// Layer 5 — Evaluation Metrics
// ============================================================
// Accumulates per-batch results from Evaluate specs on the
// host and reduces them to the standard binary metrics once
// the evaluation input is exhausted.
//
// Ratios with an empty denominator (no predicted positives,
// no actual positives, single-class labels for ROC AUC) are 0.0.
// The precision-recall AUC is 0.0 when there are no positives.

use anyhow::{anyhow, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ml::head::{EstimatorSpec, CLASS_THRESHOLD};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub global_step:          usize,
    pub num_examples:         usize,
    /// Mean of the per-batch training loss
    pub loss:                 f64,
    /// Mean per-example loss over every evaluated example
    pub average_loss:         f64,
    pub accuracy:             f64,
    pub precision:            f64,
    pub recall:               f64,
    pub auc:                  f64,
    /// Area under the precision-recall curve (average precision)
    pub auc_precision_recall: f64,
    pub prediction_mean:      f64,
    pub label_mean:           f64,
    pub accuracy_baseline:    f64,
}

#[derive(Debug, Default)]
pub struct MetricsAccumulator {
    logistic:         Vec<f32>,
    labels:           Vec<f32>,
    example_loss_sum: f64,
    batch_loss_sum:   f64,
    batches:          usize,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull one Evaluate spec back to the host and record it.
    pub fn update<B: Backend>(&mut self, spec: EstimatorSpec<B>) -> Result<()> {
        let (loss, per_example_loss, predictions, labels) = match spec {
            EstimatorSpec::Evaluate { loss, per_example_loss, predictions, labels } => {
                (loss, per_example_loss, predictions, labels)
            }
            other => return Err(anyhow!("expected an evaluate spec, got {}", other.mode())),
        };

        let batch_loss: f64 = loss.into_scalar().elem::<f64>();
        let example_loss    = host_vec(per_example_loss)?;
        self.record(
            batch_loss,
            &example_loss,
            &host_vec(predictions.logistic)?,
            &host_vec(labels)?,
        );
        Ok(())
    }

    /// Record one batch from host values.
    pub fn record(&mut self, batch_loss: f64, example_loss: &[f32], logistic: &[f32], labels: &[f32]) {
        self.batch_loss_sum   += batch_loss;
        self.batches          += 1;
        self.example_loss_sum += example_loss.iter().map(|v| *v as f64).sum::<f64>();
        self.logistic.extend_from_slice(logistic);
        self.labels.extend_from_slice(labels);
    }

    pub fn finish(self, global_step: usize) -> EvalMetrics {
        let n = self.labels.len();
        let ratio = |num: usize, den: usize| if den > 0 { num as f64 / den as f64 } else { 0.0 };

        let mut tp = 0;
        let mut fp = 0;
        let mut fn_ = 0;
        let mut correct = 0;
        for (&p, &y) in self.logistic.iter().zip(&self.labels) {
            let predicted = p as f64 > CLASS_THRESHOLD;
            let actual    = y > 0.5;
            match (predicted, actual) {
                (true, true)   => { tp += 1; correct += 1; }
                (true, false)  => fp += 1,
                (false, true)  => fn_ += 1,
                (false, false) => correct += 1,
            }
        }

        let mean = |xs: &[f32]| {
            if xs.is_empty() { 0.0 } else { xs.iter().map(|v| *v as f64).sum::<f64>() / xs.len() as f64 }
        };
        let label_mean = mean(&self.labels);

        EvalMetrics {
            global_step,
            num_examples:         n,
            loss:                 if self.batches > 0 { self.batch_loss_sum / self.batches as f64 } else { f64::NAN },
            average_loss:         if n > 0 { self.example_loss_sum / n as f64 } else { f64::NAN },
            accuracy:             ratio(correct, n),
            precision:            ratio(tp, tp + fp),
            recall:               ratio(tp, tp + fn_),
            auc:                  roc_auc(&self.logistic, &self.labels),
            auc_precision_recall: average_precision(&self.logistic, &self.labels),
            prediction_mean:      mean(&self.logistic),
            label_mean,
            accuracy_baseline:    if n > 0 { label_mean.max(1.0 - label_mean) } else { 0.0 },
        }
    }
}

fn host_vec<B: Backend, const D: usize>(t: Tensor<B, D>) -> Result<Vec<f32>> {
    t.into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("cannot read tensor back to host: {e:?}"))
}

/// Exact ROC AUC via the Mann–Whitney rank statistic (ties get average rank).
pub fn roc_auc(scores: &[f32], labels: &[f32]) -> f64 {
    let positives = labels.iter().filter(|y| **y > 0.5).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.0;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0f64;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1..=j+1 share their average
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            if labels[k] > 0.5 {
                positive_rank_sum += avg_rank;
            }
        }
        i = j + 1;
    }

    let p = positives as f64;
    (positive_rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64)
}

/// Exact area under the precision-recall curve as average precision:
/// walking scores from high to low, each block of tied scores adds its
/// share of recall times the precision reached after the block.
pub fn average_precision(scores: &[f32], labels: &[f32]) -> f64 {
    let positives = labels.iter().filter(|y| **y > 0.5).count();
    if positives == 0 {
        return 0.0;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut ap = 0.0f64;
    let mut tp = 0usize;
    let mut seen = 0usize;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let block_tp = order[i..=j].iter().filter(|&&k| labels[k] > 0.5).count();
        tp   += block_tp;
        seen += j - i + 1;
        if block_tp > 0 {
            ap += (block_tp as f64 / positives as f64) * (tp as f64 / seen as f64);
        }
        i = j + 1;
    }
    ap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auc_perfect_and_inverted() {
        assert_eq!(roc_auc(&[0.1, 0.2, 0.8, 0.9], &[0.0, 0.0, 1.0, 1.0]), 1.0);
        assert_eq!(roc_auc(&[0.9, 0.8, 0.2, 0.1], &[0.0, 0.0, 1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_auc_ties_count_half() {
        assert_eq!(roc_auc(&[0.5, 0.5], &[0.0, 1.0]), 0.5);
    }

    #[test]
    fn test_auc_single_class_is_zero() {
        assert_eq!(roc_auc(&[0.3, 0.7], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_average_precision() {
        assert_eq!(average_precision(&[0.1, 0.2, 0.8, 0.9], &[0.0, 0.0, 1.0, 1.0]), 1.0);
        // positives ranked 2nd and 4th: (1/2 + 2/4) / 2
        assert!((average_precision(&[0.9, 0.8, 0.2, 0.1], &[0.0, 1.0, 0.0, 1.0]) - 0.5).abs() < 1e-12);
        assert_eq!(average_precision(&[0.5, 0.5], &[0.0, 1.0]), 0.5);
        assert_eq!(average_precision(&[0.3, 0.7], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_metrics_from_two_batches() {
        let mut acc = MetricsAccumulator::new();
        acc.record(1.0, &[1.0, 1.0], &[0.9, 0.2], &[1.0, 0.0]);
        acc.record(3.0, &[4.0, 2.0], &[0.7, 0.4], &[0.0, 1.0]);
        let m = acc.finish(42);

        assert_eq!(m.global_step, 42);
        assert_eq!(m.num_examples, 4);
        assert_eq!(m.loss, 2.0);
        assert_eq!(m.average_loss, 2.0);
        // tp=1 (0.9), tn=1 (0.2), fp=1 (0.7), fn=1 (0.4)
        assert_eq!(m.accuracy, 0.5);
        assert_eq!(m.precision, 0.5);
        assert_eq!(m.recall, 0.5);
        assert_eq!(m.label_mean, 0.5);
        assert_eq!(m.accuracy_baseline, 0.5);
        assert!((m.prediction_mean - 0.55).abs() < 1e-6);
        // positives {0.9, 0.4} vs negatives {0.2, 0.7}: 3 of 4 pairs ordered
        assert!((m.auc - 0.75).abs() < 1e-12);
        // ranking 0.9+, 0.7-, 0.4+, 0.2-: (1/1 + 2/3) / 2
        assert!((m.auc_precision_recall - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_accumulator() {
        let m = MetricsAccumulator::new().finish(0);
        assert_eq!(m.num_examples, 0);
        assert!(m.loss.is_nan());
        assert_eq!(m.accuracy, 0.0);
    }
}
