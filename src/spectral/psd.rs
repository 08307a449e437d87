//! One-sided power spectral density and peak extraction.
//!
//! For a signal of `N` samples at rate `fs`, bin `i` of the one-sided PSD is
//!
//! ```text
//! P[i] = |X[i]|² / (N * fs)          (i = 0 or Nyquist)
//! P[i] = 2 * |X[i]|² / (N * fs)      (0 < i < fft_length - 1)
//! ```
//!
//! with `fft_length = N / 2 + 1`. The lowest [`SUPPRESSED_BINS`] bins are
//! then forced to zero to drop slow drift and DC leakage, and the peak is
//! the first bin with the largest remaining power.

use rustfft::num_complex::Complex;

/// Number of low-frequency bins zeroed in every PSD.
pub const SUPPRESSED_BINS: usize = 15;

/// Number of bins in the one-sided spectrum of `num_frames` samples.
#[inline]
pub fn fft_length(num_frames: usize) -> usize {
    num_frames / 2 + 1
}

/// Location and value of a PSD maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Bin index of the maximum.
    pub index: usize,
    /// Power at that bin.
    pub power: f64,
    /// Frequency of that bin in Hz.
    pub frequency: f32,
}

/// Reduces full-length transform output to a one-sided PSD.
#[derive(Debug, Clone, Copy)]
pub struct PsdReducer {
    num_frames: usize,
    sampling_rate: f64,
    fft_length: usize,
}

impl PsdReducer {
    /// Creates a reducer for `num_frames`-point spectra sampled at `sampling_rate`.
    ///
    /// Callers validate that `num_frames >= 1` and `sampling_rate > 0`.
    pub fn new(num_frames: usize, sampling_rate: f64) -> Self {
        Self {
            num_frames,
            sampling_rate,
            fft_length: fft_length(num_frames),
        }
    }

    /// Bins per one-sided PSD curve.
    #[inline]
    pub fn fft_length(&self) -> usize {
        self.fft_length
    }

    /// Signal length `N`.
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Sampling rate in frames per second.
    #[inline]
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Frequency in Hz of bin `index`.
    #[inline]
    pub fn bin_frequency(&self, index: usize) -> f32 {
        (index as f64 * self.sampling_rate / self.num_frames as f64) as f32
    }

    /// Scaled, one-sided power of bin `index` before suppression.
    #[inline]
    fn one_sided_power(&self, index: usize, value: Complex<f64>) -> f64 {
        let mut power = value.norm_sqr() / (self.num_frames as f64 * self.sampling_rate);
        if index > 0 && index < self.fft_length - 1 {
            power *= 2.0;
        }
        power
    }

    /// One-sided PSD without low-bin suppression.
    ///
    /// Useful for inspecting what the suppression removes; the maps are
    /// always produced by [`PsdReducer::reduce_into`].
    pub fn unsuppressed(&self, spectrum: &[Complex<f64>]) -> Vec<f64> {
        spectrum
            .iter()
            .take(self.fft_length)
            .enumerate()
            .map(|(i, &x)| self.one_sided_power(i, x))
            .collect()
    }

    /// Writes the PSD of `spectrum` into `out` and returns its peak.
    ///
    /// `spectrum` must hold at least `fft_length` values and `out` exactly
    /// `fft_length`. Ties resolve to the lowest bin.
    pub fn reduce_into(&self, spectrum: &[Complex<f64>], out: &mut [f32]) -> Peak {
        debug_assert!(spectrum.len() >= self.fft_length);
        debug_assert_eq!(out.len(), self.fft_length);

        let mut max_power = 0.0;
        let mut max_index = 0;

        for (i, (slot, &x)) in out.iter_mut().zip(spectrum).enumerate() {
            let power = if i < SUPPRESSED_BINS {
                0.0
            } else {
                self.one_sided_power(i, x)
            };

            *slot = power as f32;

            if power > max_power {
                max_power = power;
                max_index = i;
            }
        }

        Peak {
            index: max_index,
            power: max_power,
            frequency: self.bin_frequency(max_index),
        }
    }

    /// Allocating variant of [`PsdReducer::reduce_into`].
    pub fn reduce(&self, spectrum: &[Complex<f64>]) -> (Vec<f32>, Peak) {
        let mut psd = vec![0.0f32; self.fft_length];
        let peak = self.reduce_into(spectrum, &mut psd);
        (psd, peak)
    }
}
