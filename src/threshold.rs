//! Binarization thresholds per algorithm.
//!
//! An ordered table of `name pattern → threshold`; the first pattern that matches the
//! algorithm name wins, otherwise the default applies. Patterns are regular expressions,
//! so a plain name matches as a substring.

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Threshold for classifiers whose scores are probabilities in [0, 1].
pub const DEFAULT_THRESHOLD: f64 = 0.5;

#[derive(Error, Debug)]
pub enum ThresholdError {
    #[error("Invalid threshold pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Config file threshold override (deserialized from TOML).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ThresholdOverride {
    pub pattern: String,
    pub threshold: f64,
}

/// Built-in overrides.
fn builtin_overrides() -> Vec<ThresholdOverride> {
    vec![
        // Ghosal et al. rank with RANSAC, whose output is not bounded to [0, 1]
        ThresholdOverride {
            pattern: "Ghosal".to_string(),
            threshold: 0.0,
        },
    ]
}

#[derive(Debug)]
struct ThresholdEntry {
    pattern: String,
    regex: Regex,
    threshold: f64,
}

#[derive(Debug)]
pub struct ThresholdPolicy {
    entries: Vec<ThresholdEntry>,
    default: f64,
}

impl ThresholdPolicy {
    /// Built-in table merged with config overrides.
    ///
    /// An override whose pattern already exists replaces that entry's threshold in place;
    /// new patterns are appended after the built-ins.
    pub fn new(default: f64, overrides: &[ThresholdOverride]) -> Result<Self, ThresholdError> {
        let mut table = builtin_overrides();

        for custom in overrides {
            match table.iter_mut().find(|e| e.pattern == custom.pattern) {
                Some(existing) => existing.threshold = custom.threshold,
                None => table.push(custom.clone()),
            }
        }

        let entries = table
            .into_iter()
            .map(|o| -> Result<ThresholdEntry, ThresholdError> {
                let regex = Regex::new(&o.pattern).map_err(|source| ThresholdError::Pattern {
                    pattern: o.pattern.clone(),
                    source,
                })?;
                Ok(ThresholdEntry {
                    pattern: o.pattern,
                    regex,
                    threshold: o.threshold,
                })
            })
            .collect::<Result<Vec<_>, ThresholdError>>()?;

        Ok(Self { entries, default })
    }

    pub fn threshold(&self, algorithm: &str) -> f64 {
        self.entries
            .iter()
            .find(|e| e.regex.is_match(algorithm))
            .map(|e| e.threshold)
            .unwrap_or(self.default)
    }

    pub fn default_threshold(&self) -> f64 {
        self.default
    }

    /// `(pattern, threshold)` in lookup order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|e| (e.pattern.as_str(), e.threshold))
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, &[]).expect("built-in threshold patterns are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ghosal_uses_zero() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.threshold("Ghosal_v1"), 0.0);
        assert_eq!(policy.threshold("Ghosal"), 0.0);
        assert_eq!(policy.threshold("AnyOtherAlgo"), 0.5);
        assert_eq!(policy.threshold("SVMBFF"), 0.5);
    }

    #[test]
    fn pattern_is_case_sensitive_substring() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.threshold("new_Ghosal_rerun"), 0.0);
        assert_eq!(policy.threshold("ghosal"), 0.5);
    }

    #[test]
    fn override_replaces_builtin_in_place() {
        let policy = ThresholdPolicy::new(
            0.5,
            &[ThresholdOverride { pattern: "Ghosal".into(), threshold: -0.25 }],
        )
        .unwrap();
        assert_eq!(policy.threshold("Ghosal"), -0.25);
        assert_eq!(policy.entries().count(), 1);
    }

    #[test]
    fn new_override_is_appended() {
        let policy = ThresholdPolicy::new(
            0.4,
            &[ThresholdOverride { pattern: "^VQMM".into(), threshold: 0.7 }],
        )
        .unwrap();
        assert_eq!(policy.threshold("VQMM"), 0.7);
        assert_eq!(policy.threshold("old_VQMM"), 0.4);
        assert_eq!(policy.threshold("Ghosal"), 0.0);
        let patterns: Vec<&str> = policy.entries().map(|(p, _)| p).collect();
        assert_eq!(patterns, vec!["Ghosal", "^VQMM"]);
    }

    #[test]
    fn first_match_wins() {
        let policy = ThresholdPolicy::new(
            0.5,
            &[ThresholdOverride { pattern: "Ghosal_v2".into(), threshold: 0.3 }],
        )
        .unwrap();
        // Built-in "Ghosal" comes first in the table
        assert_eq!(policy.threshold("Ghosal_v2"), 0.0);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = ThresholdPolicy::new(
            0.5,
            &[ThresholdOverride { pattern: "(".into(), threshold: 0.1 }],
        )
        .unwrap_err();
        assert!(err.to_string().contains("\"(\""));
    }
}
