//! Row-parallel driver for the per-pixel pipeline.
//!
//! Each rayon task owns whole output rows, so the PSD and frequency maps
//! are written without locks. The only shared mutable state is the
//! [`RowProgress`] counter, which nothing reads back for computation.

use super::maps::{Metadata, SpectralMaps};
use super::psd::PsdReducer;
use super::series;
use super::transform::{RustFftTransform, Transform, TransformError};
use crate::capture::FrameVolume;
use crate::config::AnalysisConfig;
use crate::error::{EngineError, InputError};
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Completed-row counter shared by all workers.
#[derive(Debug)]
pub struct RowProgress {
    rows_done: AtomicUsize,
    total_rows: usize,
    width: usize,
    log_every: usize,
    report: bool,
}

impl RowProgress {
    /// Tracks `total_rows` rows of `width` pixels.
    pub fn new(total_rows: usize, width: usize) -> Self {
        Self {
            rows_done: AtomicUsize::new(0),
            total_rows,
            width,
            log_every: (total_rows / 10).max(1),
            report: true,
        }
    }

    /// Same counter without the periodic `info` lines.
    pub fn silent(total_rows: usize, width: usize) -> Self {
        Self {
            report: false,
            ..Self::new(total_rows, width)
        }
    }

    /// Records a finished row and returns how many rows are done.
    pub fn complete_row(&self) -> usize {
        let done = self.rows_done.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(rows_done = done, total_rows = self.total_rows, "Row complete");

        if self.report && (done % self.log_every == 0 || done == self.total_rows) {
            tracing::info!(
                pixels_done = done * self.width,
                total_pixels = self.total_rows * self.width,
                "Processed pixels"
            );
        }
        done
    }

    /// Rows finished so far.
    pub fn rows_done(&self) -> usize {
        self.rows_done.load(Ordering::Relaxed)
    }

    /// Pixels finished so far.
    pub fn pixels_done(&self) -> usize {
        self.rows_done() * self.width
    }

    /// Rows in the volume.
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }
}

/// Runs extraction, transform and PSD reduction for every pixel.
#[derive(Debug, Clone)]
pub struct SpectralEngine<T = RustFftTransform> {
    transform: T,
    reducer: PsdReducer,
    threads: usize,
}

impl SpectralEngine<RustFftTransform> {
    /// Plans an FFT engine for volumes of `num_frames` frames.
    pub fn new(num_frames: usize, config: &AnalysisConfig) -> Result<Self, EngineError> {
        validate_sampling_rate(config.sampling_rate)?;
        let transform = RustFftTransform::new(num_frames)?;
        Self::with_transform(transform, config.sampling_rate, config.threads)
    }
}

impl<T: Transform> SpectralEngine<T> {
    /// Builds an engine around any transform implementation.
    ///
    /// `threads == 0` lets rayon pick the worker count.
    pub fn with_transform(transform: T, sampling_rate: f64, threads: usize) -> Result<Self, EngineError> {
        validate_sampling_rate(sampling_rate)?;
        let reducer = PsdReducer::new(transform.len(), sampling_rate);
        Ok(Self {
            transform,
            reducer,
            threads,
        })
    }

    /// PSD reducer used for every pixel.
    pub fn reducer(&self) -> &PsdReducer {
        &self.reducer
    }

    /// Processes every pixel of `volume` and returns the filled maps.
    ///
    /// Any transform failure aborts the whole run; no partial maps are
    /// returned.
    pub fn run(&self, volume: &FrameVolume, progress: &RowProgress) -> Result<SpectralMaps, EngineError> {
        if volume.num_frames() != self.transform.len() {
            return Err(TransformError::LengthMismatch {
                expected: self.transform.len(),
                found: volume.num_frames(),
            }
            .into());
        }

        let metadata = Metadata {
            num_frames: volume.num_frames(),
            height: volume.height(),
            width: volume.width(),
        };
        let width = metadata.width;
        let fft_len = metadata.fft_length();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()?;

        tracing::info!(
            frames = metadata.num_frames,
            height = metadata.height,
            width,
            fft_length = fft_len,
            threads = pool.current_num_threads(),
            sampling_rate = self.reducer.sampling_rate(),
            "Starting spectral analysis"
        );
        let start = Instant::now();

        let mut maps = SpectralMaps::zeroed(metadata);
        let (psd, frequency) = maps.buffers_mut();

        pool.install(|| {
            psd.par_chunks_mut(width * fft_len)
                .zip(frequency.par_chunks_mut(width))
                .enumerate()
                .try_for_each_init(
                    || self.transform.make_scratch(),
                    |scratch, (row, (psd_row, freq_row))| {
                        self.process_row(volume, row, psd_row, freq_row, scratch)?;
                        progress.complete_row();
                        Ok::<(), TransformError>(())
                    },
                )
        })?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            pixels = metadata.pixel_count(),
            "Finished spectral analysis"
        );
        Ok(maps)
    }

    fn process_row(
        &self,
        volume: &FrameVolume,
        row: usize,
        psd_row: &mut [f32],
        freq_row: &mut [f32],
        scratch: &mut [Complex<f64>],
    ) -> Result<(), TransformError> {
        let fft_len = self.reducer.fft_length();

        for (col, (bins, freq)) in psd_row
            .chunks_exact_mut(fft_len)
            .zip(freq_row.iter_mut())
            .enumerate()
        {
            let mut signal = series::extract(volume, row, col);
            self.transform.forward(signal.samples_mut(), scratch)?;
            *freq = self.reducer.reduce_into(signal.samples(), bins).frequency;
        }
        Ok(())
    }
}

fn validate_sampling_rate(rate: f64) -> Result<(), InputError> {
    if !(rate.is_finite() && rate > 0.0) {
        return Err(InputError::SamplingRate(rate));
    }
    Ok(())
}
