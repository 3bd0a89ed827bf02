//! Experiment drivers.
//!
//! Every prediction file in the predictions directory is scored in name order, then the
//! random baseline is scored the same way under the name [`BASELINE_NAME`].

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::baseline::{BASELINE_NAME, BaselineReference, random_baseline};
use crate::dataset::groundtruth::GroundTruth;
use crate::dataset::predictions::{AlgorithmFile, list_algorithms, read_predictions};
use crate::dataset::{ClassCounts, LabeledPair};
use crate::metrics::{ClassificationReport, GroupedMetrics, Summary};
use crate::partition::{FinalizePolicy, partition};
use crate::report::Reporter;
use crate::threshold::ThresholdPolicy;

/// Inputs shared by every algorithm in a run.
pub struct Evaluation {
    pub ground_truth: GroundTruth,
    pub algorithms: Vec<AlgorithmFile>,
    pub thresholds: ThresholdPolicy,
}

/// Grouped (balanced) result for one algorithm.
#[derive(Debug, Clone)]
pub struct GroupedOutcome {
    pub name: String,
    pub metrics: GroupedMetrics,
    pub accuracy: Summary,
    pub f1: Summary,
}

/// Single-pass result for one algorithm.
#[derive(Debug, Clone, Serialize)]
pub struct UngroupedOutcome {
    pub name: String,
    #[serde(flatten)]
    pub report: ClassificationReport,
}

impl Evaluation {
    pub fn load(
        groundtruth: &Path,
        predictions_dir: &Path,
        instrumental_marker: &str,
        thresholds: ThresholdPolicy,
    ) -> Result<Self> {
        let ground_truth = GroundTruth::load(groundtruth, instrumental_marker)
            .context("Failed to load ground truth")?;
        if ground_truth.is_empty() {
            log::warn!("Ground truth {} has no rows", groundtruth.display());
        }
        let algorithms = list_algorithms(predictions_dir)
            .context("Failed to list prediction files")?;
        log::info!(
            "{} prediction files in {}",
            algorithms.len(),
            predictions_dir.display()
        );
        Ok(Self {
            ground_truth,
            algorithms,
            thresholds,
        })
    }

    /// Binarized pairs for one algorithm, thresholded by its name.
    pub fn read(&self, algorithm: &AlgorithmFile) -> Result<Vec<LabeledPair>> {
        let threshold = self.thresholds.threshold(&algorithm.name);
        let pairs = read_predictions(&algorithm.path, &self.ground_truth, threshold)
            .with_context(|| format!("Failed to read predictions of {}", algorithm.name))?;
        log::info!(
            "{}: {} tracks with ground truth (threshold {})",
            algorithm.name,
            pairs.len(),
            threshold
        );
        Ok(pairs)
    }

    /// Fail early if the baseline names an algorithm that isn't in this run.
    fn check_reference(&self, reference: &BaselineReference) -> Result<()> {
        if let BaselineReference::Algorithm(name) = reference {
            if !self.algorithms.iter().any(|a| &a.name == name) {
                anyhow::bail!(
                    "Baseline reference {:?} is not among the prediction files ({})",
                    name,
                    self.algorithms
                        .iter()
                        .map(|a| a.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }
        Ok(())
    }

    /// Walk every algorithm, handing its pairs to `score`, then score the random baseline.
    fn for_each_with_baseline<T, F>(
        &self,
        reference: &BaselineReference,
        mut score: F,
    ) -> Result<Vec<T>>
    where
        F: FnMut(&str, &[LabeledPair]) -> Result<T>,
    {
        self.check_reference(reference)?;

        let mut reference_counts = match reference {
            BaselineReference::GroundTruth => Some(self.ground_truth.class_counts()),
            BaselineReference::Algorithm(_) => None,
        };

        let pb = ProgressBar::new(self.algorithms.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut outcomes = with_progress(pb, |pb| {
            let mut outcomes = Vec::with_capacity(self.algorithms.len() + 1);
            for algorithm in &self.algorithms {
                pb.set_message(algorithm.name.clone());
                let pairs = self.read(algorithm)?;
                if matches!(reference, BaselineReference::Algorithm(n) if *n == algorithm.name) {
                    reference_counts = Some(ClassCounts::from_pairs(&pairs));
                }
                outcomes.push(score(algorithm.name.as_str(), &pairs)?);
                pb.inc(1);
            }
            Ok(outcomes)
        })?;

        let counts = reference_counts
            .with_context(|| format!("No class distribution for baseline ({reference})"))?;
        log::info!(
            "{}: {} songs, {} instrumentals from {}",
            BASELINE_NAME,
            counts.song,
            counts.instrumental,
            reference
        );
        outcomes.push(score(BASELINE_NAME, &random_baseline(counts))?);

        Ok(outcomes)
    }

    /// Balanced-group evaluation. Every algorithm and the baseline are scored first; one row
    /// each is appended to the reporter's tables only once the whole run has succeeded.
    pub fn run_grouped(
        &self,
        policy: FinalizePolicy,
        reference: &BaselineReference,
        reporter: &mut Reporter,
    ) -> Result<Vec<GroupedOutcome>> {
        let outcomes = self.for_each_with_baseline(reference, |name, pairs| {
            evaluate_grouped(name, pairs, policy)
        })?;
        for o in &outcomes {
            reporter
                .append(&o.name, &o.metrics.accuracy, &o.metrics.f1)
                .with_context(|| format!("Failed to write results of {}", o.name))?;
        }
        Ok(outcomes)
    }

    /// Whole-sequence evaluation, nothing persisted.
    pub fn run_ungrouped(&self, reference: &BaselineReference) -> Result<Vec<UngroupedOutcome>> {
        self.for_each_with_baseline(reference, |name, pairs| {
            let report = ClassificationReport::from_pairs(pairs)
                .with_context(|| format!("Cannot evaluate {name}"))?;
            Ok(UngroupedOutcome {
                name: name.to_string(),
                report,
            })
        })
    }
}

/// Run `body` under `pb`; the bar is cleared whether or not `body` succeeds.
fn with_progress<T>(pb: ProgressBar, body: impl FnOnce(&ProgressBar) -> Result<T>) -> Result<T> {
    let result = body(&pb);
    pb.finish_and_clear();
    result
}

/// Partition and score each group.
pub fn evaluate_grouped(
    name: &str,
    pairs: &[LabeledPair],
    policy: FinalizePolicy,
) -> Result<GroupedOutcome> {
    let partition = partition(pairs, policy);
    log::debug!(
        "{}: {} instrumentals, {} groups",
        name,
        partition.count_instrumental(),
        partition.group_count()
    );

    let metrics = GroupedMetrics::from_partition(&partition)
        .with_context(|| format!("Cannot evaluate {name}"))?;
    let accuracy = metrics.accuracy_summary()?;
    let f1 = metrics.f1_summary()?;

    Ok(GroupedOutcome {
        name: name.to_string(),
        metrics,
        accuracy,
        f1,
    })
}
