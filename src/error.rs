//! Crate-level error taxonomy.
//!
//! Each stage reports its own error type; [`EngineError`] groups them by
//! kind so callers can decide whether to log and exit or propagate.

use crate::capture::VolumeError;
use crate::output::OutputError;
use crate::spectral::TransformError;
use thiserror::Error;

/// Input rejected before any pixel is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Sampling rate is zero, negative, or not finite.
    #[error("sampling rate must be positive and finite, got {0}")]
    SamplingRate(f64),
    /// The volume is empty or malformed.
    #[error(transparent)]
    Volume(#[from] VolumeError),
}

/// Failure of a spectral run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected before processing started.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
    /// A pixel's transform failed; the run was aborted.
    #[error("transform failed: {0}")]
    TransformFailure(#[from] TransformError),
    /// Map files could not be written or read.
    #[error(transparent)]
    IoFailure(#[from] OutputError),
    /// The rayon pool could not be built.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<VolumeError> for EngineError {
    fn from(err: VolumeError) -> Self {
        EngineError::InvalidInput(err.into())
    }
}
