use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use vocaleval::baseline::BaselineReference;
use vocaleval::config::AppConfig;
use vocaleval::partition::FinalizePolicy;
use vocaleval::pipeline::Evaluation;
use vocaleval::report::{self, Reporter};
use vocaleval::threshold::ThresholdPolicy;

#[derive(Parser)]
#[command(name = "vocaleval", version, about = "Instrumental vs. song classifier comparison")]
struct Cli {
    /// Ground-truth table (id,label)
    #[arg(long, global = true)]
    groundtruth: Option<PathBuf>,

    /// Directory with one id,score prediction file per algorithm
    #[arg(long, global = true)]
    predictions: Option<PathBuf>,

    /// Config file (defaults to the XDG config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Balanced-group evaluation; appends per-group accuracy and F1 rows to the stats tables
    Grouped {
        /// Directory holding the accuracy/F1 tables
        #[arg(long)]
        stats_dir: Option<PathBuf>,

        /// Start the next chunk with the song that closes a full one instead of dropping it
        #[arg(long)]
        carry_trigger: bool,

        /// Match the random baseline to this algorithm's scored tracks
        #[arg(long)]
        baseline_reference: Option<String>,
    },

    /// Whole-dataset evaluation printed to the console
    Ungrouped {
        /// One JSON object per algorithm instead of the text report
        #[arg(long)]
        json: bool,

        /// Match the random baseline to this algorithm's scored tracks
        #[arg(long)]
        baseline_reference: Option<String>,
    },

    /// Remove the stats tables left by previous runs
    Clean {
        /// Directory holding the accuracy/F1 tables
        #[arg(long)]
        stats_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    // Resolve input paths: CLI > config > built-in default
    let groundtruth = cli.groundtruth.unwrap_or_else(|| config.groundtruth.clone());
    let predictions = cli.predictions.unwrap_or_else(|| config.predictions_dir.clone());

    let baseline_reference = |cli_value: Option<String>| {
        match cli_value.or_else(|| config.baseline.reference.clone()) {
            Some(name) => BaselineReference::Algorithm(name),
            None => BaselineReference::GroundTruth,
        }
    };

    match cli.command {
        Commands::Grouped { stats_dir, carry_trigger, baseline_reference: reference } => {
            let stats_dir = stats_dir.unwrap_or_else(|| config.stats_dir.clone());
            let policy = if carry_trigger || config.partition.carry_trigger {
                FinalizePolicy::CarryTrigger
            } else {
                FinalizePolicy::DiscardTrigger
            };

            let evaluation = load_evaluation(&config, &groundtruth, &predictions)?;
            let mut reporter = Reporter::open(&stats_dir)
                .context("Failed to open stats tables")?;
            let outcomes = evaluation
                .run_grouped(policy, &baseline_reference(reference), &mut reporter)
                .context("Grouped evaluation failed")?;

            let mut out = std::io::stdout().lock();
            for o in &outcomes {
                report::write_grouped_summary(
                    &mut out,
                    &o.name,
                    o.metrics.group_count(),
                    &o.accuracy,
                    &o.f1,
                )?;
            }
            writeln!(out)?;
            writeln!(
                out,
                "{} rows appended to {} and {}",
                reporter.rows_written(),
                reporter.accuracy_path().display(),
                reporter.f1_path().display()
            )?;
        }

        Commands::Ungrouped { json, baseline_reference: reference } => {
            let evaluation = load_evaluation(&config, &groundtruth, &predictions)?;
            let outcomes = evaluation
                .run_ungrouped(&baseline_reference(reference))
                .context("Ungrouped evaluation failed")?;

            let mut out = std::io::stdout().lock();
            for o in &outcomes {
                if json {
                    writeln!(out, "{}", serde_json::to_string(o)?)?;
                } else {
                    report::write_classification_report(&mut out, &o.name, &o.report)?;
                }
            }
        }

        Commands::Clean { stats_dir } => {
            let stats_dir = stats_dir.unwrap_or_else(|| config.stats_dir.clone());
            let removed = report::clean(&stats_dir).context("Clean failed")?;
            if removed.is_empty() {
                println!("Nothing to clean in {}", stats_dir.display());
            } else {
                for path in &removed {
                    println!("Removed {}", path.display());
                }
            }
        }
    }

    Ok(())
}

fn load_evaluation(
    config: &AppConfig,
    groundtruth: &std::path::Path,
    predictions: &std::path::Path,
) -> Result<Evaluation> {
    let thresholds = ThresholdPolicy::new(config.default_threshold, &config.thresholds)
        .context("Invalid threshold configuration")?;
    log::debug!("Default threshold {}", thresholds.default_threshold());
    for (pattern, threshold) in thresholds.entries() {
        log::debug!("Threshold {} for algorithms matching {:?}", threshold, pattern);
    }
    Evaluation::load(groundtruth, predictions, &config.instrumental_marker, thresholds)
}
