//! Forward discrete Fourier transform adapter.
//!
//! Both implementations compute the unnormalized forward transform
//! `X[k] = sum_n x[n] * exp(-2πi kn / N)`; the `1/N` factor belongs to the
//! inverse and is never applied here. The PSD scaling in
//! [`super::psd`] depends on this convention.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by a transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The buffer length differs from the planned length.
    #[error("signal has {found} samples, transform was planned for {expected}")]
    LengthMismatch {
        /// Planned length.
        expected: usize,
        /// Supplied length.
        found: usize,
    },
    /// The caller's scratch buffer is too short.
    #[error("scratch buffer has {found} elements, transform needs {expected}")]
    ScratchTooSmall {
        /// Required scratch length.
        expected: usize,
        /// Supplied scratch length.
        found: usize,
    },
    /// A zero-length transform was requested.
    #[error("cannot plan a transform of length zero")]
    ZeroLength,
}

/// A forward complex-to-complex transform of fixed length.
///
/// Implementations are shared by every worker thread, so they must not
/// keep per-call state; anything mutable lives in the caller's scratch.
pub trait Transform: Send + Sync {
    /// Signal length the transform was planned for.
    fn len(&self) -> usize;

    /// Scratch elements [`Transform::forward`] needs.
    fn scratch_len(&self) -> usize {
        0
    }

    /// Transforms `buffer` in place.
    fn forward(
        &self,
        buffer: &mut [Complex<f64>],
        scratch: &mut [Complex<f64>],
    ) -> Result<(), TransformError>;

    /// Allocates a scratch buffer sized for this transform.
    fn make_scratch(&self) -> Vec<Complex<f64>> {
        vec![Complex::new(0.0, 0.0); self.scratch_len()]
    }
}

fn check_length(expected: usize, found: usize) -> Result<(), TransformError> {
    if expected != found {
        return Err(TransformError::LengthMismatch { expected, found });
    }
    Ok(())
}

/// Mixed-radix FFT backed by `rustfft`, planned once per signal length.
#[derive(Clone)]
pub struct RustFftTransform {
    fft: Arc<dyn Fft<f64>>,
    len: usize,
    scratch_len: usize,
}

impl RustFftTransform {
    /// Plans a forward FFT of `len` points. Any length is supported.
    pub fn new(len: usize) -> Result<Self, TransformError> {
        if len == 0 {
            return Err(TransformError::ZeroLength);
        }
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(len);
        let scratch_len = fft.get_inplace_scratch_len();
        tracing::debug!(len, scratch_len, "Planned forward FFT");
        Ok(Self {
            fft,
            len,
            scratch_len,
        })
    }
}

impl Transform for RustFftTransform {
    fn len(&self) -> usize {
        self.len
    }

    fn scratch_len(&self) -> usize {
        self.scratch_len
    }

    fn forward(
        &self,
        buffer: &mut [Complex<f64>],
        scratch: &mut [Complex<f64>],
    ) -> Result<(), TransformError> {
        check_length(self.len, buffer.len())?;
        if scratch.len() < self.scratch_len {
            return Err(TransformError::ScratchTooSmall {
                expected: self.scratch_len,
                found: scratch.len(),
            });
        }
        self.fft
            .process_with_scratch(buffer, &mut scratch[..self.scratch_len]);
        Ok(())
    }
}

impl std::fmt::Debug for RustFftTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustFftTransform")
            .field("len", &self.len)
            .field("scratch_len", &self.scratch_len)
            .finish()
    }
}

/// O(N²) direct evaluation of the DFT sum.
///
/// Only sensible for short signals; serves as a reference for the FFT.
#[derive(Debug, Clone)]
pub struct DirectDft {
    twiddles: Vec<Complex<f64>>,
}

impl DirectDft {
    /// Precomputes the `len` twiddle factors.
    pub fn new(len: usize) -> Result<Self, TransformError> {
        if len == 0 {
            return Err(TransformError::ZeroLength);
        }
        let twiddles = (0..len)
            .map(|k| {
                let angle = -2.0 * std::f64::consts::PI * k as f64 / len as f64;
                Complex::new(angle.cos(), angle.sin())
            })
            .collect();
        Ok(Self { twiddles })
    }
}

impl Transform for DirectDft {
    fn len(&self) -> usize {
        self.twiddles.len()
    }

    fn scratch_len(&self) -> usize {
        self.twiddles.len()
    }

    fn forward(
        &self,
        buffer: &mut [Complex<f64>],
        scratch: &mut [Complex<f64>],
    ) -> Result<(), TransformError> {
        let n = self.twiddles.len();
        check_length(n, buffer.len())?;
        if scratch.len() < n {
            return Err(TransformError::ScratchTooSmall {
                expected: n,
                found: scratch.len(),
            });
        }

        for (k, out) in scratch[..n].iter_mut().enumerate() {
            *out = buffer
                .iter()
                .enumerate()
                .map(|(j, &x)| x * self.twiddles[(k * j) % n])
                .sum();
        }
        buffer.copy_from_slice(&scratch[..n]);
        Ok(())
    }
}
