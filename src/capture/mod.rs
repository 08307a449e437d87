//! Frame input and volume assembly.
//!
//! This module turns a stream of grayscale frames into the dense
//! `[time][row][col]` volume consumed by the spectral engine. Video
//! decoding itself is left to whatever implements [`FrameSource`].

mod frame;
mod source;
mod volume;

pub use frame::Frame;
pub use source::{collect_volume, FrameSource, RawVolumeSource, SourceError, SyntheticSource};
pub use volume::{FrameVolume, VolumeBuilder, VolumeError};
