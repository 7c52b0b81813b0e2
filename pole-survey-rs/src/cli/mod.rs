//! Command-line interface for the pole survey pipeline.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Instant;

use crate::detection::RedPoleDetector;
use crate::processors::{BatchAggregator, ConsoleReporter, ProgressBarReporter, RunReporter};
use crate::SurveyConfig;

#[derive(Parser)]
#[command(name = "pole-survey")]
#[command(about = "Locate survey poles in photographs and measure their endpoints", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    batch: BatchArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by both jobs.
#[derive(Args)]
struct BatchArgs {
    /// Directory containing input photographs
    #[arg(long, global = true)]
    data_path: Option<PathBuf>,

    /// Number of worker threads (1 = sequential)
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    /// Abort on the first image that cannot be decoded
    #[arg(long, global = true)]
    fail_fast: bool,

    /// Show a progress bar instead of per-file percentage lines
    #[arg(long, global = true)]
    progress_bar: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an annotated copy of every photograph
    Annotate {
        /// Output directory for annotated images
        #[arg(long)]
        save_path: Option<PathBuf>,
        /// Prefix for output file names
        #[arg(long)]
        save_prefix: Option<String>,
        /// Image format extension for output files
        #[arg(long)]
        extension: Option<String>,
    },

    /// Measure pole endpoints and write a CSV results table
    Points {
        /// Output directory for the results table
        #[arg(long)]
        save_path: Option<PathBuf>,
        /// Prefix for the results file name
        #[arg(long)]
        save_prefix: Option<String>,
        /// Append an error column describing failed files
        #[arg(long)]
        error_column: bool,
    },

    /// Print the effective configuration as YAML
    ShowConfig,
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            let head: String = value.chars().take(36).collect();
            format!("{}...", head)
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let mut config = match &cli.config {
        Some(path) => match SurveyConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config: {}, using defaults", e);
                SurveyConfig::default()
            }
        },
        None => SurveyConfig::default(),
    };
    apply_batch_args(&mut config, &cli.batch);

    let reporter: Box<dyn RunReporter> = if cli.batch.progress_bar {
        Box::new(ProgressBarReporter::new())
    } else {
        Box::new(ConsoleReporter)
    };

    // Dispatch to subcommands
    let result = match cli.command {
        Commands::Annotate {
            save_path,
            save_prefix,
            extension,
        } => {
            if let Some(path) = save_path {
                config.annotate.save_path = path;
            }
            if let Some(prefix) = save_prefix {
                config.annotate.save_prefix = prefix;
            }
            if let Some(ext) = extension {
                config.annotate.image_extension = ext;
            }
            cmd_annotate(&config, reporter.as_ref())
        }
        Commands::Points {
            save_path,
            save_prefix,
            error_column,
        } => {
            if let Some(path) = save_path {
                config.points.save_path = path;
            }
            if let Some(prefix) = save_prefix {
                config.points.save_prefix = prefix;
            }
            config.batch.error_column |= error_column;
            cmd_points(&config, reporter.as_ref())
        }
        Commands::ShowConfig => cmd_show_config(&config),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_batch_args(config: &mut SurveyConfig, args: &BatchArgs) {
    if let Some(path) = &args.data_path {
        config.paths.data_path = path.clone();
    }
    if let Some(jobs) = args.jobs {
        config.batch.jobs = jobs.max(1);
    }
    config.batch.fail_fast |= args.fail_fast;
}

fn cmd_annotate(config: &SurveyConfig, reporter: &dyn RunReporter) -> Result<()> {
    let start = Instant::now();
    let detector = RedPoleDetector::new(config.detection.clone());
    let aggregator = BatchAggregator::new(config, &detector, reporter);

    let spinner = create_spinner("Scanning for photographs...");
    let files = aggregator.enumerate();
    spinner.finish_and_clear();
    let files = files.context("Cannot start annotation run")?;

    let report = aggregator
        .annotate(&files)
        .context("Annotation run failed")?;

    for (path, reason) in &report.failures {
        warn!("Not annotated: {} ({})", path.display(), reason);
    }

    print_summary(
        "Annotation Complete",
        &[
            ("Input directory", config.paths.data_path.display().to_string()),
            ("Output directory", config.annotate.save_path.display().to_string()),
            ("Images written", report.saved.len().to_string()),
            ("Files failed", report.failures.len().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}

fn cmd_points(config: &SurveyConfig, reporter: &dyn RunReporter) -> Result<()> {
    let start = Instant::now();
    let detector = RedPoleDetector::new(config.detection.clone());
    let aggregator = BatchAggregator::new(config, &detector, reporter);

    let spinner = create_spinner("Scanning for photographs...");
    let files = aggregator.enumerate();
    spinner.finish_and_clear();
    let files = files.context("Cannot start measurement run")?;

    let report = aggregator
        .measure(&files)
        .context("Measurement run failed")?;

    let measured = report
        .table
        .rows()
        .iter()
        .filter(|r| r.pole_length.is_some())
        .count();

    println!();
    println!("Saved {}", report.output_path.display());
    if let Some(path) = &report.failures_path {
        println!("Failed files listed in {}", path.display());
    }

    print_summary(
        "Measurement Complete",
        &[
            ("Input directory", config.paths.data_path.display().to_string()),
            ("Results table", report.output_path.display().to_string()),
            ("Rows", report.table.len().to_string()),
            ("Poles measured", measured.to_string()),
            ("Files failed", report.table.failed().count().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}

fn cmd_show_config(config: &SurveyConfig) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    print!("{}", yaml);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_points_command() {
        let cli = Cli::try_parse_from([
            "pole-survey",
            "points",
            "--save-prefix",
            "run_",
            "--data-path",
            "photos",
            "--jobs",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.batch.data_path, Some(PathBuf::from("photos")));
        assert_eq!(cli.batch.jobs, Some(3));
        match cli.command {
            Commands::Points { save_prefix, .. } => {
                assert_eq!(save_prefix.as_deref(), Some("run_"))
            }
            _ => panic!("Expected points command"),
        }
    }

    #[test]
    fn test_apply_batch_args() {
        let mut config = SurveyConfig::default();
        let args = BatchArgs {
            data_path: Some(PathBuf::from("elsewhere")),
            jobs: Some(0),
            fail_fast: true,
            progress_bar: false,
        };

        apply_batch_args(&mut config, &args);

        assert_eq!(config.paths.data_path, PathBuf::from("elsewhere"));
        assert_eq!(config.batch.jobs, 1);
        assert!(config.batch.fail_fast);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
