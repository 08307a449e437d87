//! Dense PSD and dominant-frequency maps.

use super::psd::fft_length;

/// Dimensions needed to reinterpret the binary maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    /// Frames in the analyzed volume; fixes the PSD bin count.
    pub num_frames: usize,
    /// Rows per frame.
    pub height: usize,
    /// Columns per frame.
    pub width: usize,
}

impl Metadata {
    /// Bins per pixel in the PSD map.
    #[inline]
    pub fn fft_length(&self) -> usize {
        fft_length(self.num_frames)
    }

    /// Pixels per frame.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.height * self.width
    }

    /// Number of `f32` values in the PSD map.
    #[inline]
    pub fn psd_len(&self) -> usize {
        self.pixel_count() * self.fft_length()
    }

    /// [`Metadata::psd_len`], or `None` if it does not fit in `usize`.
    ///
    /// Use this for dimensions read from untrusted files.
    pub fn checked_psd_len(&self) -> Option<usize> {
        self.height
            .checked_mul(self.width)?
            .checked_mul(self.fft_length())
    }
}

/// Result of a spectral run.
///
/// `psd` is row-major `(row, col, bin)`; `frequency` is row-major `(row, col)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralMaps {
    metadata: Metadata,
    psd: Vec<f32>,
    frequency: Vec<f32>,
}

impl SpectralMaps {
    /// Allocates zeroed maps for the given dimensions.
    pub fn zeroed(metadata: Metadata) -> Self {
        Self {
            psd: vec![0.0; metadata.psd_len()],
            frequency: vec![0.0; metadata.pixel_count()],
            metadata,
        }
    }

    /// Wraps existing buffers. Returns `None` if their lengths disagree
    /// with `metadata`.
    pub fn from_parts(metadata: Metadata, psd: Vec<f32>, frequency: Vec<f32>) -> Option<Self> {
        if psd.len() != metadata.psd_len() || frequency.len() != metadata.pixel_count() {
            return None;
        }
        Some(Self {
            metadata,
            psd,
            frequency,
        })
    }

    /// Dimensions of the analyzed volume.
    pub fn metadata(&self) -> Metadata {
        self.metadata
    }

    /// Whole PSD map, `(row, col, bin)` order.
    pub fn psd(&self) -> &[f32] {
        &self.psd
    }

    /// Whole dominant-frequency map, `(row, col)` order.
    pub fn frequency(&self) -> &[f32] {
        &self.frequency
    }

    /// PSD curve of pixel `(row, col)`.
    pub fn pixel_psd(&self, row: usize, col: usize) -> &[f32] {
        let bins = self.metadata.fft_length();
        let start = (row * self.metadata.width + col) * bins;
        &self.psd[start..start + bins]
    }

    /// Dominant frequency of pixel `(row, col)`.
    pub fn pixel_frequency(&self, row: usize, col: usize) -> f32 {
        self.frequency[row * self.metadata.width + col]
    }

    /// Mutable views of both maps, for the scheduler.
    pub(crate) fn buffers_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.psd, &mut self.frequency)
    }
}
