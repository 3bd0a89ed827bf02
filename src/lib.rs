pub mod baseline;
pub mod config;
pub mod dataset;
pub mod metrics;
pub mod partition;
pub mod pipeline;
pub mod report;
pub mod threshold;

/// Application name for XDG paths
pub const APP_NAME: &str = "vocaleval";
