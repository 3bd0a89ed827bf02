use std::fmt;

use crate::dataset::{ClassCounts, Label, LabeledPair};

/// Name the baseline is reported under.
pub const BASELINE_NAME: &str = "Random";

/// Which class distribution the random baseline is matched to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BaselineReference {
    /// Every track in the ground-truth table.
    #[default]
    GroundTruth,
    /// The tracks one algorithm's prediction file shares with the ground truth.
    Algorithm(String),
}

impl fmt::Display for BaselineReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineReference::GroundTruth => f.write_str("ground truth"),
            BaselineReference::Algorithm(name) => write!(f, "tracks scored by {name}"),
        }
    }
}

/// Chance-level predictor matched to a class distribution.
///
/// Truth is every song followed by every instrumental. Predictions alternate song,
/// instrumental, ... over the same number of positions, so an odd total ends on a song.
pub fn random_baseline(counts: ClassCounts) -> Vec<LabeledPair> {
    let truth = std::iter::repeat_n(Label::Song, counts.song)
        .chain(std::iter::repeat_n(Label::Instrumental, counts.instrumental));
    let predicted = [Label::Song, Label::Instrumental].into_iter().cycle();

    truth
        .zip(predicted)
        .map(|(truth, predicted)| LabeledPair::new(truth, predicted))
        .collect()
}
