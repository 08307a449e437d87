//! Per-pixel time-series extraction and mean removal.

use crate::capture::FrameVolume;
use rustfft::num_complex::Complex;

/// A pixel's time series with its mean removed, ready for the transform.
///
/// Samples are stored as complex values with a zero imaginary part so the
/// forward transform can run in place on the same buffer.
#[derive(Debug, Clone)]
pub struct DetrendedSignal {
    samples: Vec<Complex<f64>>,
    mean: f64,
}

impl DetrendedSignal {
    /// Subtracts the arithmetic mean from every sample.
    ///
    /// The mean is accumulated in `f64`. An empty input yields an empty
    /// signal with a mean of zero; volumes never produce one.
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut buffer: Vec<Complex<f64>> = samples
            .into_iter()
            .map(|v| Complex::new(v, 0.0))
            .collect();

        if buffer.is_empty() {
            return Self {
                samples: buffer,
                mean: 0.0,
            };
        }

        let mean = buffer.iter().map(|c| c.re).sum::<f64>() / buffer.len() as f64;
        for sample in &mut buffer {
            sample.re -= mean;
        }

        Self {
            samples: buffer,
            mean,
        }
    }

    /// Mean that was removed.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True for a zero-length series.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Detrended samples, or the spectrum once transformed in place.
    pub fn samples(&self) -> &[Complex<f64>] {
        &self.samples
    }

    /// Mutable buffer handed to [`super::Transform::forward`].
    pub fn samples_mut(&mut self) -> &mut [Complex<f64>] {
        &mut self.samples
    }
}

/// Reads pixel `(row, col)` across all frames and removes its mean.
pub fn extract(volume: &FrameVolume, row: usize, col: usize) -> DetrendedSignal {
    DetrendedSignal::from_samples(volume.pixel_series(row, col).map(f64::from))
}
