//! Command-line front end: read a GPS CSV, derive kinematics, filter slow
//! fixes, and write `<input>_processed.csv` and `<input>_processed.kml`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use track_processor::config::{DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_YAML};
use track_processor::{
    find_single_file, read_samples, write_outputs, Config, MotionFilter, PipelineOutput,
    ProcessingSummary, Sample,
};

/// Fallback input when none is given and none can be discovered.
const DEFAULT_INPUT: &str = "sample.csv";

#[derive(Parser, Debug)]
#[command(name = "track-processor", version)]
#[command(about = "Process GPS trajectory data: per-device kinematics, speed filtering, CSV/KML output")]
#[command(after_help = "\
Input CSV needs a header with ID, latitude, longitude and timestamp columns
(names configurable); timestamps must be RFC 3339, e.g. 2023-03-01T12:00:00Z.

Examples:
  track-processor                                  Auto-detect CSV and YAML files
  track-processor gps_data.csv 3.5                 Speed threshold 3.5 km/h
  track-processor tracking.csv my_config.yaml      Custom configuration file
  track-processor data.csv 2.0 custom_config.yaml  Threshold and config file")]
struct Cli {
    /// Input CSV file (auto-detected in the current directory when omitted)
    input: Option<PathBuf>,

    /// Minimum speed in km/h, or a configuration file path
    #[arg(allow_negative_numbers = true)]
    speed_or_config: Option<String>,

    /// Configuration file, when the second argument is a speed
    config: Option<PathBuf>,

    /// Minimum speed in km/h (overrides positional and config values)
    #[arg(long, value_name = "KPH", allow_negative_numbers = true)]
    threshold: Option<f64>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Config path and threshold recovered from the positional arguments.
#[derive(Debug, Default, PartialEq)]
struct Positionals {
    config: Option<PathBuf>,
    threshold: Option<f64>,
}

impl Cli {
    /// A numeric second argument is the threshold; anything else is the
    /// config path. The third argument is the config only after a threshold.
    fn positionals(&self) -> Positionals {
        let mut resolved = Positionals::default();
        if let Some(second) = &self.speed_or_config {
            match second.parse::<f64>() {
                Ok(kph) => resolved.threshold = Some(kph),
                Err(_) => resolved.config = Some(PathBuf::from(second)),
            }
        }
        if resolved.config.is_none() {
            resolved.config = self.config.clone();
        }
        resolved
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let positionals = cli.positionals();
    let Some(mut config) = resolve_config(positionals.config.as_deref())? else {
        return Ok(());
    };
    if let Some(kph) = cli.threshold.or(positionals.threshold) {
        config.parameters.filter_above_kph = kph;
    }

    let input = resolve_input(cli.input)?;
    let filter = MotionFilter::new(config.threshold_kmh());

    info!("=== GPS Data Processor ===");
    info!("Input file: {}", input.display());
    info!("Column mappings: {}", config.columns.describe());
    info!("Speed filter threshold: {:.1} km/h", filter.min_speed_kmh);

    let started = Instant::now();

    info!("Step 1: Reading input CSV file...");
    let samples = read_samples(&input, &config.columns)
        .with_context(|| format!("reading {}", input.display()))?;

    info!("Step 2-4: Grouping, deriving kinematics and filtering...");
    let output = run_pipeline(samples, filter.min_speed_kmh);

    info!("Step 5: Writing output CSV and KML files...");
    let paths = write_outputs(&input, &output.filtered.kept)
        .with_context(|| format!("writing outputs for {}", input.display()))?;

    let summary = output.summary(&filter, started.elapsed());
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, &config, &paths.csv, &paths.kml);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

#[cfg(feature = "parallel")]
fn run_pipeline(samples: Vec<Sample>, threshold_kmh: f64) -> PipelineOutput {
    track_processor::process_parallel(samples, threshold_kmh)
}

#[cfg(not(feature = "parallel"))]
fn run_pipeline(samples: Vec<Sample>, threshold_kmh: f64) -> PipelineOutput {
    track_processor::process(samples, threshold_kmh)
}

/// Load the configuration to use, or `None` after creating a fresh template
/// that the user should review before processing.
///
/// An explicitly named file that fails to load is reported and the defaults
/// are used instead.
fn resolve_config(explicit: Option<&Path>) -> Result<Option<Config>> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config()?,
    };

    let Some(path) = path else {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        info!("No configuration file found. Creating default {}...", DEFAULT_CONFIG_FILE);
        match Config::write_default(default_path) {
            Ok(()) => {
                println!("A new {} has been created:\n", DEFAULT_CONFIG_FILE);
                println!("{}", DEFAULT_CONFIG_YAML);
                println!("Please review the configuration, then run the tool again.");
                return Ok(None);
            }
            Err(e) => {
                warn!("Failed to create default config file: {}", e);
                return Ok(Some(Config::default()));
            }
        }
    };

    match Config::load(&path) {
        Ok(config) => {
            info!("Configuration loaded from: {}", path.display());
            Ok(Some(config))
        }
        Err(e) => {
            warn!("Error loading {}: {}", path.display(), e);
            warn!("Using default or command line configuration.");
            Ok(Some(Config::default()))
        }
    }
}

fn discover_config() -> Result<Option<PathBuf>> {
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.is_file() {
        return Ok(Some(default_path.to_path_buf()));
    }
    for ext in ["yaml", "yml"] {
        if let Some(found) = find_single_file(Path::new("."), ext)? {
            info!("Found single {} file: {}", ext.to_uppercase(), found.display());
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn resolve_input(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    match find_single_file(Path::new("."), "csv")? {
        Some(found) => {
            info!("Found single CSV file: {} (using as input)", found.display());
            Ok(found)
        }
        None => Ok(PathBuf::from(DEFAULT_INPUT)),
    }
}

fn print_summary(summary: &ProcessingSummary, config: &Config, csv_path: &Path, kml_path: &Path) {
    println!("=== Processing Summary ===");
    println!("Total input records: {}", summary.input_records);
    println!("Unique device IDs: {}", summary.unique_devices);
    println!("Records after filtering: {}", summary.output_records);
    println!("  dropped (first of group): {}", summary.dropped_first_of_group);
    println!("  dropped (below threshold): {}", summary.dropped_below_threshold);
    println!("Column mappings: {}", config.columns.describe());
    println!("Speed filter threshold: {:.1} km/h", summary.threshold_kmh);
    println!("Processing time: {:.2} seconds", summary.processing_seconds);
    println!("CSV output file: {}", csv_path.display());
    println!("KML output file: {}", kml_path.display());
    println!("==========================");
}
