//! Classification metrics and their summary statistics.
//!
//! Per-label precision/recall/F1 follow the usual convention that an undefined ratio
//! (zero denominator) scores 0. Weighted F1 averages per-label F1 by true-label support.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::dataset::{Label, LabeledPair};
use crate::partition::Partition;
use crate::report::format_value;

#[derive(Error, Debug, PartialEq)]
pub enum MetricsError {
    #[error("No labeled pairs to score")]
    NoPairs,
    #[error("No evaluation groups (need at least one instrumental track and as many songs)")]
    NoGroups,
    #[error("No samples to summarize")]
    NoSamples,
}

pub type Result<T> = std::result::Result<T, MetricsError>;

fn index(label: Label) -> usize {
    match label {
        Label::Instrumental => 0,
        Label::Song => 1,
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

/// 2×2 confusion counts, indexed `[truth][predicted]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    counts: [[usize; 2]; 2],
}

impl ConfusionCounts {
    pub fn from_pairs(pairs: &[LabeledPair]) -> Self {
        let mut cm = Self::default();
        for p in pairs {
            cm.counts[index(p.truth)][index(p.predicted)] += 1;
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        self.counts[0][0] + self.counts[1][1]
    }

    /// Number of pairs whose truth is `label`.
    pub fn support(&self, label: Label) -> usize {
        self.counts[index(label)].iter().sum()
    }

    /// Number of pairs predicted as `label`.
    pub fn predicted(&self, label: Label) -> usize {
        let i = index(label);
        self.counts[0][i] + self.counts[1][i]
    }

    fn true_positives(&self, label: Label) -> usize {
        let i = index(label);
        self.counts[i][i]
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    pub fn precision(&self, label: Label) -> f64 {
        ratio(self.true_positives(label), self.predicted(label))
    }

    pub fn recall(&self, label: Label) -> f64 {
        ratio(self.true_positives(label), self.support(label))
    }

    pub fn f1(&self, label: Label) -> f64 {
        let p = self.precision(label);
        let r = self.recall(label);
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Per-label F1 averaged with true-label support as weights.
    pub fn weighted_f1(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        Label::ALL
            .iter()
            .map(|&l| self.f1(l) * self.support(l) as f64)
            .sum::<f64>()
            / total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScores {
    pub label: Label,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Single-pass metrics over a whole pair sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub weighted_f1: f64,
    /// Labels seen in the truth or the predictions, instrumental first.
    pub per_label: Vec<LabelScores>,
    pub support: usize,
}

impl ClassificationReport {
    pub fn from_pairs(pairs: &[LabeledPair]) -> Result<Self> {
        if pairs.is_empty() {
            return Err(MetricsError::NoPairs);
        }
        let cm = ConfusionCounts::from_pairs(pairs);
        Ok(Self {
            accuracy: cm.accuracy(),
            weighted_f1: cm.weighted_f1(),
            per_label: Label::ALL
                .iter()
                .filter(|&&label| cm.support(label) > 0 || cm.predicted(label) > 0)
                .map(|&label| LabelScores {
                    label,
                    precision: cm.precision(label),
                    recall: cm.recall(label),
                    f1: cm.f1(label),
                    support: cm.support(label),
                })
                .collect(),
            support: cm.total(),
        })
    }
}

/// Sample standard deviation, or why there isn't one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispersion {
    Sample(f64),
    /// Fewer than two samples.
    Insufficient,
}

impl fmt::Display for Dispersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispersion::Sample(sd) => f.write_str(&format_value(*sd)),
            Dispersion::Insufficient => f.write_str("n/a (insufficient data for dispersion)"),
        }
    }
}

/// Mean and sample standard deviation of a metric across groups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: Dispersion,
}

impl Summary {
    pub fn of(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(MetricsError::NoSamples);
        }
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let std_dev = if n < 2 {
            Dispersion::Insufficient
        } else {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            Dispersion::Sample((ss / (n - 1) as f64).sqrt())
        };
        Ok(Self {
            count: n,
            mean,
            std_dev,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ± {}", format_value(self.mean), self.std_dev)
    }
}

/// Accuracy and weighted F1 of every group, in group order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedMetrics {
    pub accuracy: Vec<f64>,
    pub f1: Vec<f64>,
}

impl GroupedMetrics {
    pub fn from_partition(partition: &Partition) -> Result<Self> {
        if partition.group_count() == 0 {
            return Err(MetricsError::NoGroups);
        }
        let (accuracy, f1) = partition
            .groups()
            .map(|group| {
                let cm = ConfusionCounts::from_pairs(&group);
                (cm.accuracy(), cm.weighted_f1())
            })
            .unzip();
        Ok(Self { accuracy, f1 })
    }

    pub fn group_count(&self) -> usize {
        self.accuracy.len()
    }

    pub fn accuracy_summary(&self) -> Result<Summary> {
        Summary::of(&self.accuracy)
    }

    pub fn f1_summary(&self) -> Result<Summary> {
        Summary::of(&self.f1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Label::{Instrumental as I, Song as S};
    use crate::partition::{FinalizePolicy, partition};

    fn pairs(rows: &[(Label, Label)]) -> Vec<LabeledPair> {
        rows.iter().map(|&(t, p)| LabeledPair::new(t, p)).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn perfect_predictions_score_exactly_one() {
        let group = pairs(&[(I, I), (I, I), (S, S), (S, S)]);
        let cm = ConfusionCounts::from_pairs(&group);
        assert_eq!(cm.accuracy(), 1.0);
        assert_eq!(cm.weighted_f1(), 1.0);
    }

    #[test]
    fn canonical_group_scores_half() {
        let group = pairs(&[(I, S), (I, I), (S, S), (S, I)]);
        let cm = ConfusionCounts::from_pairs(&group);
        assert_eq!(cm.accuracy(), 0.5);
        assert!(approx(cm.weighted_f1(), 0.5));
        assert_eq!(cm.precision(I), 0.5);
        assert_eq!(cm.recall(S), 0.5);
    }

    #[test]
    fn weighted_f1_uses_support() {
        // truth: 1 i, 3 s; all predicted s
        let cm = ConfusionCounts::from_pairs(&pairs(&[(I, S), (S, S), (S, S), (S, S)]));
        // F1(i) = 0 (never predicted), F1(s): p = 3/4, r = 1 -> 6/7
        assert_eq!(cm.f1(I), 0.0);
        assert!(approx(cm.f1(S), 6.0 / 7.0));
        assert!(approx(cm.weighted_f1(), 0.75 * 6.0 / 7.0));
    }

    #[test]
    fn label_absent_from_truth_gets_zero_weight() {
        let cm = ConfusionCounts::from_pairs(&pairs(&[(S, S), (S, I)]));
        assert_eq!(cm.support(I), 0);
        assert_eq!(cm.recall(I), 0.0);
        // Only the song F1 (p = 1, r = 1/2) contributes
        assert!(approx(cm.weighted_f1(), 2.0 / 3.0));
    }

    #[test]
    fn report_lists_both_labels() {
        let report = ClassificationReport::from_pairs(&pairs(&[(I, S), (I, I), (S, S), (S, I)]))
            .unwrap();
        assert_eq!(report.support, 4);
        assert_eq!(report.per_label.len(), 2);
        assert_eq!(report.per_label[0].label, I);
        assert_eq!(report.per_label[1].label, S);
        assert_eq!(report.per_label[1].support, 2);
    }

    #[test]
    fn report_omits_label_neither_seen_nor_predicted() {
        let report = ClassificationReport::from_pairs(&pairs(&[(S, S), (S, S)])).unwrap();
        assert_eq!(report.per_label.len(), 1);
        assert_eq!(report.per_label[0].label, S);
        assert_eq!(report.weighted_f1, 1.0);

        // Predicted but absent from the truth still counts as seen
        let report = ClassificationReport::from_pairs(&pairs(&[(S, S), (S, I)])).unwrap();
        assert_eq!(report.per_label.len(), 2);
        assert_eq!(report.per_label[0].support, 0);
    }

    #[test]
    fn empty_report_is_an_error() {
        assert_eq!(ClassificationReport::from_pairs(&[]), Err(MetricsError::NoPairs));
    }

    #[test]
    fn summary_uses_sample_std_dev() {
        let s = Summary::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.count, 8);
        assert!(approx(s.mean, 5.0));
        match s.std_dev {
            Dispersion::Sample(sd) => assert!(approx(sd, (32.0f64 / 7.0).sqrt())),
            Dispersion::Insufficient => panic!("expected a dispersion"),
        }
    }

    #[test]
    fn single_sample_has_no_dispersion() {
        let s = Summary::of(&[0.5]).unwrap();
        assert_eq!(s.mean, 0.5);
        assert_eq!(s.std_dev, Dispersion::Insufficient);
        assert_eq!(s.to_string(), "0.5 ± n/a (insufficient data for dispersion)");
    }

    #[test]
    fn no_samples_is_an_error() {
        assert_eq!(Summary::of(&[]), Err(MetricsError::NoSamples));
    }

    #[test]
    fn grouped_metrics_follow_group_order() {
        // 1 instrumental (correct); chunks [s->s] closed by a dropped song, then [s->i] closed
        let seq = pairs(&[(I, I), (S, S), (S, S), (S, I), (S, S)]);
        let p = partition(&seq, FinalizePolicy::DiscardTrigger);
        let m = GroupedMetrics::from_partition(&p).unwrap();
        assert_eq!(m.group_count(), 2);
        assert_eq!(m.accuracy, vec![1.0, 0.5]);
        assert_eq!(m.f1[0], 1.0);
    }

    #[test]
    fn zero_groups_is_an_error() {
        let p = partition(&pairs(&[(S, S), (S, I)]), FinalizePolicy::DiscardTrigger);
        assert_eq!(GroupedMetrics::from_partition(&p), Err(MetricsError::NoGroups));
    }
}
