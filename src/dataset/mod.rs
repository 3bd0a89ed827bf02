pub mod groundtruth;
pub mod predictions;

use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// Marker that flags a ground-truth token as instrumental ("i", "instru", ...).
pub const DEFAULT_INSTRUMENTAL_MARKER: &str = "i";

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Cannot open {path}: {source}")]
    Open { path: String, source: csv::Error },
    #[error("Read error in {path}: {source}")]
    Read { path: String, source: csv::Error },
    #[error("Malformed row in {path} at line {line}: expected 2 columns, found {found} ({row:?})")]
    MalformedRow {
        path: String,
        line: u64,
        found: usize,
        row: String,
    },
    #[error("Unparseable score in {path} at line {line}: {row:?} ({source})")]
    BadScore {
        path: String,
        line: u64,
        row: String,
        source: std::num::ParseFloatError,
    },
    #[error("Cannot list predictions in {path}: {source}")]
    Scan { path: String, source: walkdir::Error },
}

pub type Result<T> = std::result::Result<T, DatasetError>;

/// The two classes the evaluated classifiers separate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Instrumental,
    Song,
}

impl Label {
    pub const ALL: [Label; 2] = [Label::Instrumental, Label::Song];

    /// Any token containing `marker` is instrumental, everything else is a song.
    pub fn from_token(token: &str, marker: &str) -> Self {
        if token.contains(marker) {
            Label::Instrumental
        } else {
            Label::Song
        }
    }

    /// Short token used in the published tables.
    pub fn token(self) -> &'static str {
        match self {
            Label::Instrumental => "i",
            Label::Song => "s",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Ground-truth label of one track next to the classifier's binarized prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabeledPair {
    pub truth: Label,
    pub predicted: Label,
}

impl LabeledPair {
    pub fn new(truth: Label, predicted: Label) -> Self {
        Self { truth, predicted }
    }
}

/// Class distribution of a set of ground-truth labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub song: usize,
    pub instrumental: usize,
}

impl ClassCounts {
    pub fn from_labels<I: IntoIterator<Item = Label>>(labels: I) -> Self {
        let mut counts = Self::default();
        for label in labels {
            match label {
                Label::Song => counts.song += 1,
                Label::Instrumental => counts.instrumental += 1,
            }
        }
        counts
    }

    pub fn from_pairs(pairs: &[LabeledPair]) -> Self {
        Self::from_labels(pairs.iter().map(|p| p.truth))
    }

    pub fn total(&self) -> usize {
        self.song + self.instrumental
    }
}

/// Open a headerless `id,value` table. Blank lines are skipped by the reader.
fn open_table(path: &Path) -> Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| DatasetError::Open {
            path: path.display().to_string(),
            source,
        })
}

/// Split a record into its first two columns; extra trailing columns are ignored.
fn two_columns<'r>(
    record: &'r csv::StringRecord,
    path: &Path,
) -> Result<(&'r str, &'r str)> {
    match (record.get(0), record.get(1)) {
        (Some(id), Some(value)) => Ok((id, value)),
        _ => Err(DatasetError::MalformedRow {
            path: path.display().to_string(),
            line: record_line(record),
            found: record.len(),
            row: record_text(record),
        }),
    }
}

fn record_line(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn record_text(record: &csv::StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_with_marker_is_instrumental() {
        assert_eq!(Label::from_token("i", "i"), Label::Instrumental);
        assert_eq!(Label::from_token("instrumental", "i"), Label::Instrumental);
        assert_eq!(Label::from_token("s", "i"), Label::Song);
        assert_eq!(Label::from_token("", "i"), Label::Song);
    }

    #[test]
    fn custom_marker() {
        assert_eq!(Label::from_token("instru", "instru"), Label::Instrumental);
        // "i" alone no longer qualifies
        assert_eq!(Label::from_token("i", "instru"), Label::Song);
    }

    #[test]
    fn class_counts_from_pairs() {
        let pairs = vec![
            LabeledPair::new(Label::Instrumental, Label::Song),
            LabeledPair::new(Label::Song, Label::Song),
            LabeledPair::new(Label::Song, Label::Instrumental),
        ];
        let counts = ClassCounts::from_pairs(&pairs);
        assert_eq!(counts, ClassCounts { song: 2, instrumental: 1 });
        assert_eq!(counts.total(), 3);
    }
}
