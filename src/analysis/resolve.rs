//! Ciliary beat frequency (CBF) and functional ciliated area (FFCA).
//!
//! CBF is read off the mean PSD of the whole field of view; FFCA is the
//! fraction of pixels whose own PSD peak clears a power threshold.

use crate::spectral::{PsdReducer, SpectralMaps};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from writing or reading a summary file.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// The summary could not be rendered as TOML.
    #[error("failed to serialize summary: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A summary file is not valid TOML for [`BeatSummary`].
    #[error("failed to parse summary {path}: {source}")]
    Parse {
        /// Summary file.
        path: PathBuf,
        /// TOML decode error.
        #[source]
        source: toml::de::Error,
    },
    /// Reading or writing the summary file failed.
    #[error("failed to access summary {path}: {source}")]
    Io {
        /// Summary file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Per-video beat summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatSummary {
    /// Frequency of the mean-PSD peak, in Hz.
    pub cbf: f64,
    /// Fraction of pixels whose PSD peak exceeds `power_threshold`.
    pub ffca: f64,
    /// Peak value of the mean PSD.
    pub mean_psd_peak: f64,
    /// Pixels counted as ciliated.
    pub ciliated_pixels: usize,
    /// Pixels in the field of view.
    pub total_pixels: usize,
    /// Mean dominant frequency over ciliated pixels (0 when there are none).
    pub ciliated_mean_frequency: f64,
    /// Frames in the analyzed volume.
    pub num_frames: usize,
    /// Sampling rate the frequencies were computed with.
    pub sampling_rate: f64,
    /// Threshold applied for FFCA.
    pub power_threshold: f64,
    /// When the summary was produced.
    pub generated_at: DateTime<Utc>,
}

impl BeatSummary {
    /// Writes the summary as TOML.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), SummaryError> {
        let path = path.as_ref();
        let text = toml::to_string(self)?;
        std::fs::write(path, text).map_err(|source| SummaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), cbf = self.cbf, ffca = self.ffca, "Wrote summary");
        Ok(())
    }

    /// Reads a summary written by [`BeatSummary::write`].
    pub fn read(path: impl AsRef<Path>) -> Result<Self, SummaryError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SummaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| SummaryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Mean PSD across all pixels, accumulated in `f64`.
pub fn mean_psd(maps: &SpectralMaps) -> Vec<f64> {
    let metadata = maps.metadata();
    let bins = metadata.fft_length();
    let mut sum = vec![0.0f64; bins];

    for pixel in maps.psd().chunks_exact(bins) {
        for (acc, &p) in sum.iter_mut().zip(pixel) {
            *acc += p as f64;
        }
    }

    let pixels = metadata.pixel_count() as f64;
    sum.iter_mut().for_each(|s| *s /= pixels);
    sum
}

/// Resolves CBF and FFCA from a finished run.
pub fn resolve(maps: &SpectralMaps, sampling_rate: f64, power_threshold: f64) -> BeatSummary {
    let metadata = maps.metadata();
    let bins = metadata.fft_length();
    let reducer = PsdReducer::new(metadata.num_frames, sampling_rate);

    let mean = mean_psd(maps);
    let (peak_bin, mean_psd_peak) = mean
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_value), (i, &v)| {
            if v > best_value {
                (i, v)
            } else {
                (best, best_value)
            }
        });

    let mut ciliated_pixels = 0;
    let mut frequency_sum = 0.0;
    for (pixel, &frequency) in maps.psd().chunks_exact(bins).zip(maps.frequency()) {
        let peak = pixel.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
        if peak > power_threshold {
            ciliated_pixels += 1;
            frequency_sum += frequency as f64;
        }
    }

    let total_pixels = metadata.pixel_count();
    let summary = BeatSummary {
        // Same `i * rate / N` grid as the frequency map, so CBF and per-pixel
        // frequencies compare exactly for odd frame counts too.
        cbf: reducer.bin_frequency(peak_bin) as f64,
        ffca: ciliated_pixels as f64 / total_pixels as f64,
        mean_psd_peak,
        ciliated_pixels,
        total_pixels,
        ciliated_mean_frequency: if ciliated_pixels > 0 {
            frequency_sum / ciliated_pixels as f64
        } else {
            0.0
        },
        num_frames: metadata.num_frames,
        sampling_rate,
        power_threshold,
        generated_at: Utc::now(),
    };

    tracing::debug!(
        cbf = summary.cbf,
        ffca = summary.ffca,
        ciliated = ciliated_pixels,
        total = total_pixels,
        "Resolved beat summary"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::Metadata;

    /// Two pixels, 40 frames at 40 fps (1 Hz per bin, 21 bins).
    fn two_pixel_maps(first_peak: (usize, f32), second_peak: (usize, f32)) -> SpectralMaps {
        let metadata = Metadata {
            num_frames: 40,
            height: 1,
            width: 2,
        };
        let bins = metadata.fft_length();
        let mut psd = vec![0.0f32; metadata.psd_len()];
        psd[first_peak.0] = first_peak.1;
        psd[bins + second_peak.0] = second_peak.1;
        let frequency = vec![first_peak.0 as f32, second_peak.0 as f32];
        SpectralMaps::from_parts(metadata, psd, frequency).unwrap()
    }

    #[test]
    fn test_cbf_from_mean_psd() {
        let maps = two_pixel_maps((18, 10.0), (18, 4.0));
        let summary = resolve(&maps, 40.0, 5.0);

        assert_eq!(summary.cbf, 18.0);
        assert_eq!(summary.mean_psd_peak, 7.0);
        assert_eq!(summary.ffca, 0.5);
        assert_eq!(summary.ciliated_pixels, 1);
        assert_eq!(summary.ciliated_mean_frequency, 18.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let maps = two_pixel_maps((16, 5.0), (20, 6.0));
        let summary = resolve(&maps, 40.0, 5.0);

        assert_eq!(summary.ciliated_pixels, 1);
        assert_eq!(summary.ciliated_mean_frequency, 20.0);
        // Mean PSD: 2.5 at bin 16, 3.0 at bin 20
        assert_eq!(summary.cbf, 20.0);
    }

    #[test]
    fn test_cbf_uses_frequency_map_grid_for_odd_frame_counts() {
        // 33 frames: 17 bins, bin 16 sits at 16 * 33 / 33 = 16 Hz, not the
        // 16.5 Hz an evenly spaced 0..Nyquist grid would give
        let metadata = Metadata {
            num_frames: 33,
            height: 1,
            width: 1,
        };
        let mut psd = vec![0.0f32; 17];
        psd[16] = 9.0;
        let maps = SpectralMaps::from_parts(metadata, psd, vec![16.0]).unwrap();

        let summary = resolve(&maps, 33.0, 5.0);
        assert_eq!(summary.cbf, 16.0);
        assert_eq!(summary.cbf, maps.pixel_frequency(0, 0) as f64);
    }

    #[test]
    fn test_silent_field() {
        let maps = SpectralMaps::zeroed(Metadata {
            num_frames: 64,
            height: 3,
            width: 3,
        });
        let summary = resolve(&maps, 60.0, 1.0);

        assert_eq!(summary.cbf, 0.0);
        assert_eq!(summary.ffca, 0.0);
        assert_eq!(summary.ciliated_mean_frequency, 0.0);
        assert_eq!(summary.total_pixels, 9);
    }

    #[test]
    fn test_summary_toml_round_trip() {
        let path = std::env::temp_dir().join(format!("cilia-summary-{}.toml", std::process::id()));
        let summary = resolve(&two_pixel_maps((18, 10.0), (30, 9.0)), 40.0, 5.0);

        summary.write(&path).unwrap();
        let restored = BeatSummary::read(&path).unwrap();
        assert_eq!(restored.cbf, summary.cbf);
        assert_eq!(restored.ffca, 1.0);
        assert_eq!(restored.generated_at.timestamp(), summary.generated_at.timestamp());

        std::fs::remove_file(path).unwrap();
    }
}
