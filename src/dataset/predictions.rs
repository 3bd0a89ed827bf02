use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::groundtruth::GroundTruth;
use super::{DatasetError, Label, LabeledPair, Result, open_table, record_line, record_text, two_columns};

/// One algorithm's raw prediction file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmFile {
    /// File stem, used as the algorithm name in every report.
    pub name: String,
    pub path: PathBuf,
}

/// List the prediction files sitting directly in `dir`, sorted by algorithm name.
/// Hidden files and subdirectories are ignored.
pub fn list_algorithms(dir: &Path) -> Result<Vec<AlgorithmFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| DatasetError::Scan {
            path: dir.display().to_string(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if file_name.starts_with('.') {
            continue;
        }
        let name = entry
            .path()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.to_string());
        files.push(AlgorithmFile {
            name,
            path: entry.into_path(),
        });
    }

    Ok(files)
}

/// Scores strictly above the threshold are songs; a tie goes to instrumental.
pub fn binarize(score: f64, threshold: f64) -> Label {
    if score > threshold {
        Label::Song
    } else {
        Label::Instrumental
    }
}

/// Read an `id,score` file and pair each known track's truth with its binarized score.
///
/// Ids absent from the ground truth are dropped. Pairs keep the file's line order.
pub fn read_predictions(
    path: &Path,
    ground_truth: &GroundTruth,
    threshold: f64,
) -> Result<Vec<LabeledPair>> {
    let mut reader = open_table(path)?;
    let mut pairs = Vec::new();
    let mut unknown = 0usize;

    for record in reader.records() {
        let record = record.map_err(|source| DatasetError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let (id, raw_score) = two_columns(&record, path)?;
        let Some(truth) = ground_truth.get(id) else {
            unknown += 1;
            continue;
        };
        let score: f64 = raw_score.parse().map_err(|source| DatasetError::BadScore {
            path: path.display().to_string(),
            line: record_line(&record),
            row: record_text(&record),
            source,
        })?;
        pairs.push(LabeledPair::new(truth, binarize(score, threshold)));
    }

    if unknown > 0 {
        log::debug!(
            "{}: skipped {} ids without ground truth",
            path.display(),
            unknown
        );
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Label::{Instrumental as I, Song as S};

    fn fixture_ground_truth() -> GroundTruth {
        [("t1", I), ("t2", I), ("t3", S), ("t4", S), ("t5", S), ("t6", S)]
            .into_iter()
            .collect()
    }

    #[test]
    fn tie_goes_to_instrumental() {
        assert_eq!(binarize(0.5, 0.5), I);
        assert_eq!(binarize(0.5000001, 0.5), S);
        assert_eq!(binarize(0.0, 0.0), I);
        assert_eq!(binarize(-3.2, 0.0), I);
        assert_eq!(binarize(1e-9, 0.0), S);
    }

    #[test]
    fn reads_fixture_in_line_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Algo.csv");
        std::fs::write(&path, "t1,0.9\nt2,0.1\nt3,0.6\nt4,0.4\nt5,0.8\nt6,0.2\n").unwrap();

        let pairs = read_predictions(&path, &fixture_ground_truth(), 0.5).unwrap();
        let predicted: Vec<Label> = pairs.iter().map(|p| p.predicted).collect();
        let truth: Vec<Label> = pairs.iter().map(|p| p.truth).collect();
        assert_eq!(predicted, vec![S, I, S, I, S, I]);
        assert_eq!(truth, vec![I, I, S, S, S, S]);
    }

    #[test]
    fn unknown_ids_are_dropped_silently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Algo.csv");
        // The unknown id's score is never parsed
        std::fs::write(&path, "zz,garbage\nt3,0.7\n").unwrap();

        let pairs = read_predictions(&path, &fixture_ground_truth(), 0.5).unwrap();
        assert_eq!(pairs, vec![LabeledPair::new(S, S)]);
    }

    #[test]
    fn unparseable_score_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Algo.csv");
        std::fs::write(&path, "t1,0.9\nt2,abc\n").unwrap();

        let err = read_predictions(&path, &fixture_ground_truth(), 0.5).unwrap_err();
        match err {
            DatasetError::BadScore { line, row, .. } => {
                assert_eq!(line, 2);
                assert_eq!(row, "t2,abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lists_algorithms_sorted_without_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("VQMM.csv"), "").unwrap();
        std::fs::write(dir.path().join("Ghosal.csv"), "").unwrap();
        std::fs::write(dir.path().join(".DS_Store"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("Inner.csv"), "").unwrap();

        let names: Vec<String> = list_algorithms(dir.path())
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Ghosal", "VQMM"]);
    }
}
