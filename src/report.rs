//! Result persistence and console output.
//!
//! Grouped results go to two append-only tables (one row per algorithm, one column per
//! group). Ungrouped results are only printed.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::metrics::{ClassificationReport, LabelScores, Summary};

pub const ACCURACY_TABLE: &str = "table2_accuracy.csv";
pub const F1_TABLE: &str = "table2_f1.csv";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Cannot create stats directory {path}: {source}")]
    CreateDir { path: String, source: io::Error },
    #[error("Cannot open {path}: {source}")]
    Open { path: String, source: io::Error },
    #[error("Cannot write to {path}: {source}")]
    Write { path: String, source: io::Error },
    #[error("Cannot remove {path}: {source}")]
    Remove { path: String, source: io::Error },
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Shortest round-trip text, always with a fractional part (`1.0`, `0.8333333333333334`).
///
/// Outside `[1e-4, 1e16)` the exponent is signed and at least two digits wide (`1e-05`,
/// `1.5e+16`), matching the existing published tables.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let text = format!("{value:?}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

/// `name,v1,v2,...` without the line terminator.
pub fn format_row(name: &str, values: &[f64]) -> String {
    let mut row = name.to_string();
    for v in values {
        row.push(',');
        row.push_str(&format_value(*v));
    }
    row
}

struct Table {
    path: PathBuf,
    file: File,
}

impl Table {
    fn open(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ReportError::Open {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self { path, file })
    }

    fn append(&mut self, name: &str, values: &[f64]) -> Result<()> {
        let line = format!("{}\n", format_row(name, values));
        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|source| ReportError::Write {
                path: self.path.display().to_string(),
                source,
            })
    }
}

/// The accuracy and F1 tables of one run, held open in append mode until dropped.
pub struct Reporter {
    accuracy: Table,
    f1: Table,
    rows: usize,
}

impl Reporter {
    /// Open (creating if needed) both tables under `dir`. Existing rows are kept.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|source| ReportError::CreateDir {
            path: dir.display().to_string(),
            source,
        })?;
        let reporter = Self {
            accuracy: Table::open(dir.join(ACCURACY_TABLE))?,
            f1: Table::open(dir.join(F1_TABLE))?,
            rows: 0,
        };
        log::debug!(
            "Appending results to {} and {}",
            reporter.accuracy.path.display(),
            reporter.f1.path.display()
        );
        Ok(reporter)
    }

    /// Append one algorithm's per-group values to both tables.
    pub fn append(&mut self, name: &str, accuracy: &[f64], f1: &[f64]) -> Result<()> {
        self.accuracy.append(name, accuracy)?;
        self.f1.append(name, f1)?;
        self.rows += 1;
        Ok(())
    }

    /// Rows appended by this reporter (not counting earlier runs).
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn accuracy_path(&self) -> &Path {
        &self.accuracy.path
    }

    pub fn f1_path(&self) -> &Path {
        &self.f1.path
    }
}

/// Remove both tables from `dir`. Returns the files that were actually removed.
pub fn clean(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for name in [ACCURACY_TABLE, F1_TABLE] {
        let path = dir.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ReportError::Remove {
                    path: path.display().to_string(),
                    source,
                });
            }
        }
    }
    Ok(removed)
}

/// Mean ± dispersion of the grouped metrics.
pub fn write_grouped_summary<W: Write>(
    out: &mut W,
    name: &str,
    groups: usize,
    accuracy: &Summary,
    f1: &Summary,
) -> io::Result<()> {
    writeln!(out, "{name} ({groups} groups)")?;
    writeln!(out, "Accuracy {accuracy}")?;
    writeln!(out, "F-Measure {f1}")?;
    Ok(())
}

fn per_label<F: Fn(&LabelScores) -> f64>(
    report: &ClassificationReport,
    value: F,
) -> String {
    let cells: Vec<String> = report
        .per_label
        .iter()
        .map(|s| format!("{}: {}", s.label, format_value(value(s))))
        .collect();
    format!("[{}]", cells.join(", "))
}

/// Single-pass metrics in the layout of the published experiment logs.
pub fn write_classification_report<W: Write>(
    out: &mut W,
    name: &str,
    report: &ClassificationReport,
) -> io::Result<()> {
    writeln!(out, "{name}")?;
    writeln!(out, "Accuracy : {}", format_value(report.accuracy))?;
    writeln!(out, "F-score  : {}", format_value(report.weighted_f1))?;
    writeln!(out, "Precision: {}", per_label(report, |s| s.precision))?;
    writeln!(out, "Recall   : {}", per_label(report, |s| s.recall))?;
    writeln!(out, "F-Measure {}", per_label(report, |s| s.f1))?;
    Ok(())
}
