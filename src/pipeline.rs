//! End-to-end processing of one input volume.
//!
//! ```text
//! volume → spectral engine → map files → CBF/FFCA summary
//! ```

use crate::analysis::{self, BeatSummary, SummaryError};
use crate::capture::FrameVolume;
use crate::config::FileConfig;
use crate::error::EngineError;
use crate::metrics::RunSnapshot;
use crate::output::{self, OutputError, OutputPaths};
use crate::spectral::{self, Metadata};
use std::time::Instant;
use thiserror::Error;

/// Failure while processing one input.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Engine run or map file I/O failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Summary could not be written or read.
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

impl From<OutputError> for PipelineError {
    fn from(err: OutputError) -> Self {
        PipelineError::Engine(err.into())
    }
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Dimensions of the analyzed volume.
    pub metadata: Metadata,
    /// CBF/FFCA summary written for this input.
    pub summary: BeatSummary,
    /// Wall time spent in the engine.
    pub engine_seconds: f64,
    /// Whether the map files were left on disk.
    pub maps_kept: bool,
}

impl RunReport {
    /// Converts the report into a metrics snapshot.
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            frames: self.metadata.num_frames,
            rows: self.metadata.height,
            pixels: self.metadata.pixel_count(),
            engine_seconds: self.engine_seconds,
            cbf: Some(self.summary.cbf),
            ffca: Some(self.summary.ffca),
        }
    }
}

/// Returns true if `paths` already has a summary and the config says to skip.
pub fn should_skip(paths: &OutputPaths, config: &FileConfig) -> bool {
    config.output.skip_existing && paths.summary.exists()
}

/// Analyzes `volume`, writes its maps and summary under `paths`.
pub fn process_volume(
    volume: &FrameVolume,
    paths: &OutputPaths,
    config: &FileConfig,
) -> Result<RunReport, PipelineError> {
    let start = Instant::now();
    let maps = spectral::analyze(volume, &config.analysis)?;
    let engine_seconds = start.elapsed().as_secs_f64();

    output::write_maps(&maps, paths)?;

    let summary = analysis::resolve(
        &maps,
        config.analysis.sampling_rate,
        config.resolve.power_threshold,
    );
    summary.write(&paths.summary)?;

    if !config.output.keep_maps {
        paths.remove_maps();
    }

    Ok(RunReport {
        metadata: maps.metadata(),
        summary,
        engine_seconds,
        maps_kept: config.output.keep_maps,
    })
}

/// Rebuilds the summary from map files written by an earlier run.
pub fn resolve_existing(
    paths: &OutputPaths,
    config: &FileConfig,
) -> Result<BeatSummary, PipelineError> {
    let maps = output::read_maps(paths)?;
    let summary = analysis::resolve(
        &maps,
        config.analysis.sampling_rate,
        config.resolve.power_threshold,
    );
    summary.write(&paths.summary)?;
    Ok(summary)
}
