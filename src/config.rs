use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::dataset::DEFAULT_INSTRUMENTAL_MARKER;
use crate::threshold::{DEFAULT_THRESHOLD, ThresholdOverride};

/// Application configuration loaded from TOML config file.
/// Every field has a default, so the config file is optional.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Ground-truth table (`id,label`).
    pub groundtruth: PathBuf,
    /// Directory holding one `id,score` file per algorithm.
    pub predictions_dir: PathBuf,
    /// Where the grouped accuracy/F1 tables are appended.
    pub stats_dir: PathBuf,
    /// Ground-truth tokens containing this are instrumental.
    pub instrumental_marker: String,
    /// Threshold for algorithms no override matches.
    pub default_threshold: f64,
    /// Extra threshold overrides (merged with the built-in table).
    pub thresholds: Vec<ThresholdOverride>,
    pub partition: PartitionConfig,
    pub baseline: BaselineConfig,
}

/// Group partitioning settings.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PartitionConfig {
    /// Keep the song that closes a full chunk as the start of the next one.
    pub carry_trigger: bool,
}

/// Random baseline settings.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct BaselineConfig {
    /// Algorithm whose scored tracks define the class distribution.
    /// Unset: the whole ground-truth table.
    pub reference: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            groundtruth: PathBuf::from("groundtruths/database2.csv"),
            predictions_dir: PathBuf::from("predictions"),
            stats_dir: PathBuf::from("stats"),
            instrumental_marker: DEFAULT_INSTRUMENTAL_MARKER.to_string(),
            default_threshold: DEFAULT_THRESHOLD,
            thresholds: Vec::new(),
            partition: PartitionConfig::default(),
            baseline: BaselineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/vocaleval/config.toml`.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load a specific config file.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse {}: {}. Using defaults.",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!(
                    "Failed to read {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
