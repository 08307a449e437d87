//! Cilia Spectral CLI
//!
//! Batch front end for the spectral engine: analyzes raw grayscale
//! volumes, generates synthetic test volumes, and re-resolves summaries
//! from previously written maps.

use cilia_spectral::{
    capture::{collect_volume, RawVolumeSource, SourceError, SyntheticSource},
    config::{ConfigError, FileConfig},
    metrics::{MetricsError, MetricsRegistry},
    output::OutputPaths,
    pipeline::{self, PipelineError},
};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "cilia-spectral", version, about = "Per-pixel PSD and beat frequency maps")]
struct Cli {
    /// TOML configuration file; flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze raw grayscale volumes.
    Analyze(AnalyzeArgs),
    /// Write a synthetic beating volume.
    Synth(SynthArgs),
    /// Rebuild the CBF/FFCA summary from existing maps.
    Resolve(ResolveArgs),
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Raw volume files: consecutive `width * height` byte frames.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Frame width in pixels.
    #[arg(long)]
    width: u32,
    /// Frame height in pixels.
    #[arg(long)]
    height: u32,
    /// Sampling rate in frames per second.
    #[arg(long)]
    rate: Option<f64>,
    /// Worker threads (0 = all cores).
    #[arg(long)]
    threads: Option<usize>,
    /// FFCA power threshold.
    #[arg(long)]
    threshold: Option<f64>,
    /// Output directory (defaults to each input's directory).
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Write Prometheus text metrics to this file.
    #[arg(long)]
    metrics_file: Option<PathBuf>,
    /// Reprocess inputs that already have a summary.
    #[arg(long)]
    overwrite: bool,
    /// Delete map files once the summary is written.
    #[arg(long)]
    discard_maps: bool,
    /// Suppress periodic progress lines.
    #[arg(long)]
    no_progress: bool,
}

#[derive(Debug, Args)]
struct SynthArgs {
    /// Destination raw volume file.
    output: PathBuf,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    frames: Option<u32>,
    #[arg(long)]
    rate: Option<f64>,
    /// Beat frequency in Hz.
    #[arg(long)]
    beat: Option<f64>,
    /// Fraction of columns that beat.
    #[arg(long)]
    ciliated_fraction: Option<f64>,
}

#[derive(Debug, Args)]
struct ResolveArgs {
    /// Directory holding the map files.
    dir: PathBuf,
    /// Shared file-name stem of the maps.
    stem: String,
    #[arg(long)]
    rate: Option<f64>,
    #[arg(long)]
    threshold: Option<f64>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("input has no file name: {0}")]
    BadInput(PathBuf),
    #[error("{failed} of {total} inputs failed")]
    BatchFailed { failed: usize, total: usize },
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Cilia Spectral v{}", cilia_spectral::VERSION);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    match cli.command {
        Command::Analyze(args) => analyze(args, config),
        Command::Synth(args) => synth(args, config),
        Command::Resolve(args) => resolve(args, config),
    }
}

fn analyze(args: AnalyzeArgs, mut config: FileConfig) -> Result<(), CliError> {
    if let Some(rate) = args.rate {
        config.analysis.sampling_rate = rate;
    }
    if let Some(threads) = args.threads {
        config.analysis.threads = threads;
    }
    if let Some(threshold) = args.threshold {
        config.resolve.power_threshold = threshold;
    }
    if let Some(path) = &args.metrics_file {
        config.output.metrics_file = Some(path.clone());
    }
    if args.overwrite {
        config.output.skip_existing = false;
    }
    if args.discard_maps {
        config.output.keep_maps = false;
    }
    if args.no_progress {
        config.analysis.progress = false;
    }
    config.validate()?;

    info!(
        inputs = args.inputs.len(),
        sampling_rate = config.analysis.sampling_rate,
        power_threshold = config.resolve.power_threshold,
        "Starting batch"
    );

    let metrics = MetricsRegistry::new()?;
    let total = args.inputs.len();
    let mut failed = 0;

    for (index, input) in args.inputs.iter().enumerate() {
        info!("Starting input {} of {}: {}", index + 1, total, input.display());

        match analyze_one(input, &args, &config) {
            Ok(None) => metrics.record_skipped(),
            Ok(Some(report)) => {
                info!(
                    cbf = report.summary.cbf,
                    ffca = report.summary.ffca,
                    seconds = report.engine_seconds,
                    "Finished {}",
                    input.display()
                );
                metrics.record_run(&report.snapshot());
            }
            Err(e) => {
                error!("{}: {}", input.display(), e);
                metrics.record_failure();
                failed += 1;
            }
        }
    }

    if let Some(path) = &config.output.metrics_file {
        metrics.write_textfile(path)?;
    }

    if failed > 0 {
        return Err(CliError::BatchFailed { failed, total });
    }
    Ok(())
}

/// Runs one batch input. Returns `None` if it was skipped.
fn analyze_one(
    input: &Path,
    args: &AnalyzeArgs,
    config: &FileConfig,
) -> Result<Option<pipeline::RunReport>, CliError> {
    let paths = output_paths(input, args.out_dir.as_deref())?;
    if pipeline::should_skip(&paths, config) {
        warn!(summary = %paths.summary.display(), "Summary already exists, skipping");
        return Ok(None);
    }

    let mut source = RawVolumeSource::open(input, args.width, args.height)?;
    let volume = collect_volume(&mut source)?;
    Ok(Some(pipeline::process_volume(&volume, &paths, config)?))
}

fn output_paths(input: &Path, out_dir: Option<&Path>) -> Result<OutputPaths, CliError> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| CliError::BadInput(input.to_path_buf()))?;
    let dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Ok(OutputPaths::for_stem(dir, stem))
}

fn synth(args: SynthArgs, mut config: FileConfig) -> Result<(), CliError> {
    let synthetic = &mut config.synthetic;
    if let Some(width) = args.width {
        synthetic.width = width;
    }
    if let Some(height) = args.height {
        synthetic.height = height;
    }
    if let Some(frames) = args.frames {
        synthetic.num_frames = frames;
    }
    if let Some(rate) = args.rate {
        synthetic.sampling_rate = rate;
    }
    if let Some(beat) = args.beat {
        synthetic.beat_frequency = beat;
    }
    if let Some(fraction) = args.ciliated_fraction {
        synthetic.ciliated_fraction = fraction;
    }

    let mut source = SyntheticSource::new(config.synthetic.clone())?;
    let volume = collect_volume(&mut source)?;

    File::create(&args.output)
        .map(BufWriter::new)
        .and_then(|mut writer| {
            writer.write_all(volume.as_bytes())?;
            writer.flush()
        })
        .map_err(|source| CliError::Write {
            path: args.output.clone(),
            source,
        })?;

    info!(
        path = %args.output.display(),
        frames = volume.num_frames(),
        width = volume.width(),
        height = volume.height(),
        beat_hz = config.synthetic.beat_frequency,
        "Wrote synthetic volume"
    );
    Ok(())
}

fn resolve(args: ResolveArgs, mut config: FileConfig) -> Result<(), CliError> {
    if let Some(rate) = args.rate {
        config.analysis.sampling_rate = rate;
    }
    if let Some(threshold) = args.threshold {
        config.resolve.power_threshold = threshold;
    }
    config.validate()?;

    let paths = OutputPaths::for_stem(&args.dir, &args.stem);
    let summary = pipeline::resolve_existing(&paths, &config)?;

    println!("cbf,ffca");
    println!("{},{}", summary.cbf, summary.ffca);
    Ok(())
}
