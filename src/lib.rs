//! Cilia Spectral Analysis Library
//!
//! Converts a time-ordered stack of grayscale frames into per-pixel power
//! spectral density (PSD) curves and dominant-frequency values, used to
//! characterize periodic motion such as ciliary beating.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! capture → spectral → output → analysis
//!    ↓          ↓
//!  volume   row-parallel per-pixel FFT
//! ```
//!
//! # Design Principles
//!
//! - **Independent pixels**: each pixel's spectrum depends only on its own
//!   time series, so results are identical for any worker count
//! - **Fixed layout**: maps are headerless little-endian `f32`, described by
//!   a three-line metadata file
//! - **Fail whole**: a failed pixel aborts the run instead of leaving holes
//!
//! # Example
//!
//! ```no_run
//! use cilia_spectral::{
//!     capture::{collect_volume, SyntheticSource},
//!     config::{AnalysisConfig, SyntheticConfig},
//!     output::{write_maps, OutputPaths},
//!     spectral,
//! };
//!
//! let mut source = SyntheticSource::new(SyntheticConfig::default()).unwrap();
//! let volume = collect_volume(&mut source).unwrap();
//!
//! let maps = spectral::analyze(&volume, &AnalysisConfig::default()).unwrap();
//! write_maps(&maps, &OutputPaths::for_stem(".", "synthetic")).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod capture;
pub mod config;
pub mod error;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod spectral;

// Re-export commonly used types at crate root
pub use analysis::BeatSummary;
pub use capture::{Frame, FrameSource, FrameVolume, RawVolumeSource, SyntheticSource};
pub use config::{AnalysisConfig, FileConfig};
pub use error::{EngineError, InputError};
pub use output::OutputPaths;
pub use spectral::{SpectralEngine, SpectralMaps};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
