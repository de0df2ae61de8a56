//! spikecount - per-condition spike counts from voltage recordings
//!
//! Command-line interface for the epoch-spikes pipeline.

use clap::{Parser, Subcommand, ValueEnum};
use epoch_spikes::benchmark::{generate_recording, RecordingConfig};
use epoch_spikes::data::{SpikeCounts, TraceTable};
use epoch_spikes::detect::{DetectorConfig, SpikeDetector};
use epoch_spikes::error::{Result, SpikeError};
use epoch_spikes::pipeline::Pipeline;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Output format for condition counts.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// JSON object keyed by condition
    Json,
    /// Tab-separated condition/count table
    Tsv,
    /// Aligned human-readable table
    Text,
}

/// Per-condition spike counting
#[derive(Parser)]
#[command(name = "spikecount")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count spikes per epoch condition
    Run {
        /// Path to trace table CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Path to parameters JSON
        #[arg(short, long)]
        params: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Write results here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a synthetic recording
    Generate {
        /// Directory for data.csv and parameters.json
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Samples per trace
        #[arg(long, default_value = "100000")]
        samples: usize,

        /// Number of neurons
        #[arg(long, default_value = "7")]
        neurons: usize,

        /// Sampling rate written to the parameters file
        #[arg(long, default_value = "10000.0")]
        sample_rate: f64,

        /// Threshold written to the parameters file
        #[arg(long, default_value = "0.0")]
        threshold: f64,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Print detected spike indices for one neuron column
    Detect {
        /// Path to trace table CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Neuron column name
        #[arg(short, long)]
        column: String,

        /// Sampling rate in Hz
        #[arg(long, default_value = "10000.0")]
        sample_rate: f64,

        /// Amplitude threshold
        #[arg(long, default_value = "10.0")]
        threshold: f64,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: could not install logger: {}", e);
    }

    let result = match cli.command {
        Commands::Run {
            data,
            params,
            format,
            output,
        } => cmd_run(&data, &params, format, output.as_ref()),

        Commands::Generate {
            output_dir,
            samples,
            neurons,
            sample_rate,
            threshold,
            seed,
        } => cmd_generate(&output_dir, samples, neurons, sample_rate, threshold, seed),

        Commands::Detect {
            data,
            column,
            sample_rate,
            threshold,
        } => cmd_detect(&data, &column, sample_rate, threshold),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Run the pipeline on a data/parameters file pair
fn cmd_run(
    data_path: &PathBuf,
    params_path: &PathBuf,
    format: OutputFormat,
    output_path: Option<&PathBuf>,
) -> Result<()> {
    let run = Pipeline::new().execute_files(data_path, params_path)?;

    if let Some(reason) = &run.rejection {
        eprintln!("Input rejected: {}", reason);
    } else {
        info!("{} spikes detected", run.total_spikes());
    }

    match (format, output_path) {
        (OutputFormat::Tsv, Some(path)) => run.counts.to_tsv(path)?,
        (format, Some(path)) => std::fs::write(path, render(&run.counts, format)?)?,
        (format, None) => println!("{}", render(&run.counts, format)?),
    }

    Ok(())
}

fn render(counts: &SpikeCounts, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => counts.to_json_string(),
        OutputFormat::Tsv => {
            let mut lines = vec!["condition\tspike_count".to_string()];
            lines.extend(counts.iter().map(|(c, n)| format!("{}\t{}", c, n)));
            Ok(lines.join("\n"))
        }
        OutputFormat::Text => Ok(counts.to_string()),
    }
}

/// Write a synthetic recording
fn cmd_generate(
    output_dir: &PathBuf,
    samples: usize,
    neurons: usize,
    sample_rate: f64,
    threshold: f64,
    seed: u64,
) -> Result<()> {
    let config = RecordingConfig::default()
        .with_dimensions(samples, neurons)
        .with_parameters(sample_rate, threshold)
        .with_seed(seed);

    eprintln!("Generating {} neurons x {} samples...", neurons, samples);
    let recording = generate_recording(&config)?;
    let (data_path, params_path) = recording.to_files(output_dir)?;

    eprintln!("Wrote {:?} and {:?}", data_path, params_path);
    for (name, spikes) in &recording.spike_times {
        eprintln!("  {}: {} injected spikes", name, spikes.len());
    }

    Ok(())
}

/// Detect spikes in a single column
fn cmd_detect(data_path: &PathBuf, column: &str, sample_rate: f64, threshold: f64) -> Result<()> {
    let table = TraceTable::from_csv(data_path)?;
    let values = table
        .column(column)
        .ok_or_else(|| SpikeError::InvalidParameter(format!("No column named '{}'", column)))?;

    let trace = values
        .iter()
        .enumerate()
        .map(|(row, v)| {
            v.as_f64().filter(|x| x.is_finite()).ok_or_else(|| {
                SpikeError::InvalidParameter(format!(
                    "Column '{}' row {}: expected a finite number, found {}",
                    column, row, v
                ))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    let detector = SpikeDetector::new(DetectorConfig::new(sample_rate, threshold))?;
    let spikes = detector.detect(&trace)?;

    eprintln!(
        "{}: {} spikes (window {}, distance {})",
        column,
        spikes.len(),
        detector.window(),
        detector.distance()
    );
    for index in spikes {
        println!("{}", index);
    }

    Ok(())
}
