//! Spectral analysis engine.
//!
//! For every pixel of a [`FrameVolume`] the engine runs
//!
//! ```text
//! series (detrend) → transform (forward DFT) → psd (one-sided, peak)
//! ```
//!
//! with rows spread across a rayon pool by [`scheduler`]. Results land in
//! a PSD map and a dominant-frequency map.

mod maps;
pub mod psd;
pub mod scheduler;
pub mod series;
pub mod transform;

pub use maps::{Metadata, SpectralMaps};
pub use psd::{fft_length, Peak, PsdReducer, SUPPRESSED_BINS};
pub use scheduler::{RowProgress, SpectralEngine};
pub use series::DetrendedSignal;
pub use transform::{DirectDft, RustFftTransform, Transform, TransformError};

use crate::capture::FrameVolume;
use crate::config::AnalysisConfig;
use crate::error::EngineError;

/// Analyzes `volume` with an FFT engine configured from `config`.
pub fn analyze(volume: &FrameVolume, config: &AnalysisConfig) -> Result<SpectralMaps, EngineError> {
    let engine = SpectralEngine::new(volume.num_frames(), config)?;
    let progress = if config.progress {
        RowProgress::new(volume.height(), volume.width())
    } else {
        RowProgress::silent(volume.height(), volume.width())
    };
    engine.run(volume, &progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_pure_dc_pixel() {
        let volume = FrameVolume::from_fn(64, 1, 1, |_, _, _| 93).unwrap();
        let maps = analyze(&volume, &AnalysisConfig::default()).unwrap();

        assert_eq!(maps.metadata().fft_length(), 33);
        assert!(maps.psd().iter().all(|&p| p == 0.0));
        assert_eq!(maps.frequency(), &[0.0f32]);
    }

    #[test]
    fn test_analyze_small_beating_scene() {
        // 32 frames at 32 fps, 4 Hz beat: the beat falls inside the
        // suppressed band, so only quantization residue above bin 14 remains.
        let volume = FrameVolume::from_fn(32, 1, 1, |t, _, _| {
            let angle = 2.0 * std::f64::consts::PI * 4.0 * t as f64 / 32.0;
            (100.0 + 10.0 * angle.sin()).round() as u8
        })
        .unwrap();
        let config = AnalysisConfig {
            sampling_rate: 32.0,
            ..Default::default()
        };

        let maps = analyze(&volume, &config).unwrap();
        let psd = maps.pixel_psd(0, 0);
        assert_eq!(psd.len(), 17);
        assert!(psd[..SUPPRESSED_BINS].iter().all(|&p| p == 0.0));
        assert!(psd.iter().all(|&p| p >= 0.0));

        let resolution = 32.0f32 / 32.0;
        let freq = maps.pixel_frequency(0, 0);
        assert_eq!(freq % resolution, 0.0);
        assert!(freq == 0.0 || freq >= SUPPRESSED_BINS as f32 * resolution);
    }
}
