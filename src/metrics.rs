//! Binary-classifier evaluation: proper scores, ROC AUC and reliability
//! bins, plus the seeded split used to hold out a test set.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BinaryMetrics {
    pub samples: usize,
    pub accuracy: f64,
    pub brier: f64,
    pub log_loss: f64,
    pub roc_auc: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ReliabilityBin {
    pub bucket_start: f64,
    pub bucket_end: f64,
    pub count: usize,
    pub avg_pred: f64,
    pub actual_rate: f64,
}

pub fn evaluate_binary(probs: &[f64], labels: &[bool]) -> BinaryMetrics {
    if probs.is_empty() || probs.len() != labels.len() {
        return BinaryMetrics {
            samples: 0,
            accuracy: 0.0,
            brier: 0.0,
            log_loss: 0.0,
            roc_auc: 0.5,
        };
    }

    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut correct = 0usize;

    for (p, y) in probs.iter().zip(labels) {
        let target = if *y { 1.0 } else { 0.0 };
        brier_sum += (p - target).powi(2);
        let p_actual = if *y { *p } else { 1.0 - *p }.clamp(1e-12, 1.0);
        log_loss_sum += -p_actual.ln();
        if (*p >= 0.5) == *y {
            correct += 1;
        }
    }

    let n = probs.len() as f64;
    BinaryMetrics {
        samples: probs.len(),
        accuracy: correct as f64 / n,
        brier: brier_sum / n,
        log_loss: log_loss_sum / n,
        roc_auc: roc_auc(probs, labels),
    }
}

/// Rank-based AUC (Mann-Whitney), ties resolved with average ranks.
/// Degenerate label sets score 0.5.
pub fn roc_auc(probs: &[f64], labels: &[bool]) -> f64 {
    let n_pos = labels.iter().filter(|y| **y).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| probs[a].partial_cmp(&probs[b]).unwrap_or(std::cmp::Ordering::Equal));

    let mut rank_sum_pos = 0.0_f64;
    let mut idx = 0usize;
    while idx < order.len() {
        let mut tie_end = idx;
        while tie_end + 1 < order.len() && probs[order[tie_end + 1]] == probs[order[idx]] {
            tie_end += 1;
        }
        // 1-based average rank across the tie run.
        let avg_rank = (idx + tie_end) as f64 / 2.0 + 1.0;
        for &sample in &order[idx..=tie_end] {
            if labels[sample] {
                rank_sum_pos += avg_rank;
            }
        }
        idx = tie_end + 1;
    }

    let n_pos_f = n_pos as f64;
    let n_neg_f = n_neg as f64;
    (rank_sum_pos - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg_f)
}

pub fn reliability_bins(probs: &[f64], labels: &[bool], bins: usize) -> Vec<ReliabilityBin> {
    let bins = bins.max(2);
    let mut counts = vec![0usize; bins];
    let mut pred_sum = vec![0.0_f64; bins];
    let mut actual_sum = vec![0.0_f64; bins];

    for (p, y) in probs.iter().zip(labels) {
        let p = p.clamp(0.0, 1.0);
        let idx = ((p * bins as f64).floor() as usize).min(bins - 1);
        counts[idx] += 1;
        pred_sum[idx] += p;
        if *y {
            actual_sum[idx] += 1.0;
        }
    }

    let mut out = Vec::with_capacity(bins);
    for i in 0..bins {
        let count = counts[i];
        let (avg_pred, actual_rate) = if count > 0 {
            (pred_sum[i] / count as f64, actual_sum[i] / count as f64)
        } else {
            (0.0, 0.0)
        };
        out.push(ReliabilityBin {
            bucket_start: i as f64 / bins as f64,
            bucket_end: (i + 1) as f64 / bins as f64,
            count,
            avg_pred,
            actual_rate,
        });
    }
    out
}

/// Seeded shuffled split; returns (train, test) index sets.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_size = ((n as f64) * test_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let test_size = test_size.min(n);
    let test = indices[..test_size].to_vec();
    let train = indices[test_size..].to_vec();
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions_score_perfectly() {
        let probs = vec![0.95, 0.9, 0.1, 0.05];
        let labels = vec![true, true, false, false];
        let m = evaluate_binary(&probs, &labels);
        assert_eq!(m.samples, 4);
        assert_eq!(m.accuracy, 1.0);
        assert!(m.brier < 0.02);
        assert_eq!(m.roc_auc, 1.0);
    }

    #[test]
    fn auc_handles_ties_with_average_ranks() {
        let probs = vec![0.5, 0.5, 0.5, 0.5];
        let labels = vec![true, false, true, false];
        assert!((roc_auc(&probs, &labels) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn auc_is_half_for_single_class() {
        assert_eq!(roc_auc(&[0.2, 0.8], &[true, true]), 0.5);
    }

    #[test]
    fn reversed_ranking_scores_zero_auc() {
        let probs = vec![0.1, 0.9];
        let labels = vec![true, false];
        assert_eq!(roc_auc(&probs, &labels), 0.0);
    }

    #[test]
    fn split_is_deterministic_and_disjoint() {
        let (train_a, test_a) = train_test_split(100, 0.3, 1234);
        let (train_b, test_b) = train_test_split(100, 0.3, 1234);
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
        assert_eq!(test_a.len(), 30);
        assert_eq!(train_a.len(), 70);

        let mut all: Vec<usize> = train_a.iter().chain(test_a.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());

        let (train_c, _) = train_test_split(100, 0.3, 99);
        assert_ne!(train_a, train_c);
    }

    #[test]
    fn reliability_bins_track_observed_rates() {
        let probs = vec![0.05, 0.05, 0.95, 0.95];
        let labels = vec![false, false, true, true];
        let bins = reliability_bins(&probs, &labels, 10);
        assert_eq!(bins.len(), 10);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[0].actual_rate, 0.0);
        assert_eq!(bins[9].count, 2);
        assert_eq!(bins[9].actual_rate, 1.0);
    }
}
