use std::collections::HashMap;
use std::path::Path;

use super::{ClassCounts, Label, Result, open_table, two_columns};

/// Track id → ground-truth label, loaded once per run.
#[derive(Debug, Default, Clone)]
pub struct GroundTruth {
    labels: HashMap<String, Label>,
}

impl GroundTruth {
    /// Load an `id,label` table. A token containing `marker` is instrumental.
    ///
    /// A repeated id keeps the label of its last row.
    pub fn load(path: &Path, marker: &str) -> Result<Self> {
        let mut reader = open_table(path)?;
        let mut labels = HashMap::new();

        for record in reader.records() {
            let record = record.map_err(|source| super::DatasetError::Read {
                path: path.display().to_string(),
                source,
            })?;
            let (id, token) = two_columns(&record, path)?;
            let label = Label::from_token(token, marker);
            if let Some(previous) = labels.insert(id.to_string(), label) {
                log::debug!(
                    "Duplicate ground-truth id {} in {} ({} replaced by {})",
                    id,
                    path.display(),
                    previous,
                    label
                );
            }
        }

        log::info!("Loaded {} ground-truth labels from {}", labels.len(), path.display());
        Ok(Self { labels })
    }

    pub fn get(&self, id: &str) -> Option<Label> {
        self.labels.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Class distribution over the whole table.
    pub fn class_counts(&self) -> ClassCounts {
        ClassCounts::from_labels(self.labels.values().copied())
    }
}

impl<S: Into<String>> FromIterator<(S, Label)> for GroundTruth {
    fn from_iter<T: IntoIterator<Item = (S, Label)>>(iter: T) -> Self {
        Self {
            labels: iter.into_iter().map(|(id, label)| (id.into(), label)).collect(),
        }
    }
}
