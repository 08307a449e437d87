//! Frame source abstraction.
//!
//! Decoding real footage happens outside this crate; a source only has to
//! hand over grayscale frames one at a time. Two implementations ship
//! here: a reader for headerless raw `u8` volumes and a deterministic
//! synthetic generator for tests and demos.

use super::{Frame, FrameVolume, VolumeBuilder, VolumeError};
use crate::config::SyntheticConfig;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while pulling frames from a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing file could not be opened or inspected.
    #[error("failed to open {path}: {source}")]
    Open {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Reading a frame's bytes failed.
    #[error("failed to read frame {sequence}: {source}")]
    Read {
        /// Index of the frame being read.
        sequence: u64,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The stream ended partway through a frame.
    #[error("frame {sequence} is truncated: got {found} of {expected} bytes")]
    TruncatedFrame {
        /// Index of the partial frame.
        sequence: u64,
        /// Bytes in a whole frame.
        expected: usize,
        /// Bytes actually available.
        found: usize,
    },
    /// Source parameters failed validation.
    #[error("invalid source configuration: {0}")]
    Config(String),
    /// Frames could not be assembled into a volume.
    #[error(transparent)]
    Volume(#[from] VolumeError),
}

/// Trait for anything that yields grayscale frames in time order.
pub trait FrameSource {
    /// Returns `(width, height)` of every frame this source produces.
    fn dimensions(&self) -> (u32, u32);

    /// Returns the next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Expected number of frames, if the source knows it up front.
    fn frame_count_hint(&self) -> Option<usize> {
        None
    }
}

/// Drains a source into an immutable [`FrameVolume`].
pub fn collect_volume<S: FrameSource + ?Sized>(source: &mut S) -> Result<FrameVolume, SourceError> {
    let (width, height) = source.dimensions();
    let mut builder = match source.frame_count_hint() {
        Some(frames) => VolumeBuilder::with_capacity(width as usize, height as usize, frames),
        None => VolumeBuilder::new(),
    };

    while let Some(frame) = source.next_frame()? {
        builder.push(&frame)?;
    }

    tracing::debug!(
        frames = builder.len(),
        width,
        height,
        hint = ?source.frame_count_hint(),
        "Frame source drained"
    );

    Ok(builder.freeze()?)
}

/// Reads consecutive `width * height` byte frames from a headerless stream.
pub struct RawVolumeSource<R> {
    reader: R,
    width: u32,
    height: u32,
    sequence: u64,
    frame_count_hint: Option<usize>,
}

impl RawVolumeSource<BufReader<File>> {
    /// Opens a raw volume file of frames with the given dimensions.
    pub fn open(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let open_err = |source: io::Error| SourceError::Open {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(open_err)?;
        let bytes = file.metadata().map_err(open_err)?.len() as usize;

        let mut source = Self::new(BufReader::new(file), width, height)?;
        source.frame_count_hint = Some(bytes / source.frame_bytes());
        tracing::info!(path = %path.display(), width, height, bytes, "Opened raw volume");
        Ok(source)
    }
}

impl<R: Read> RawVolumeSource<R> {
    /// Wraps an arbitrary reader.
    pub fn new(reader: R, width: u32, height: u32) -> Result<Self, SourceError> {
        if width == 0 || height == 0 {
            return Err(VolumeError::InvalidDimensions {
                width: width as usize,
                height: height as usize,
            }
            .into());
        }
        Ok(Self {
            reader,
            width,
            height,
            sequence: 0,
            frame_count_hint: None,
        })
    }

    fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl<R: Read> FrameSource for RawVolumeSource<R> {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let expected = self.frame_bytes();
        let mut pixels = vec![0u8; expected];
        let mut filled = 0;

        while filled < expected {
            match self.reader.read(&mut pixels[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(SourceError::Read {
                        sequence: self.sequence,
                        source,
                    })
                }
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < expected {
            return Err(SourceError::TruncatedFrame {
                sequence: self.sequence,
                expected,
                found: filled,
            });
        }

        let frame = Frame::new(pixels, self.width, self.height, self.sequence);
        self.sequence += 1;
        Ok(Some(frame))
    }

    fn frame_count_hint(&self) -> Option<usize> {
        self.frame_count_hint
    }
}

/// Generates a deterministic beating pattern.
///
/// Columns left of `ciliated_fraction * width` oscillate at the configured
/// beat frequency with a per-column phase offset; the remaining columns
/// hold the baseline intensity.
#[derive(Debug)]
pub struct SyntheticSource {
    config: SyntheticConfig,
    sequence: u64,
}

impl SyntheticSource {
    /// Validates `config` and starts at frame 0.
    pub fn new(config: SyntheticConfig) -> Result<Self, SourceError> {
        config
            .validate()
            .map_err(|e| SourceError::Config(e.to_string()))?;
        Ok(Self {
            config,
            sequence: 0,
        })
    }

    /// Intensity of pixel `(row, col)` at frame `t`.
    pub fn intensity(&self, t: u64, _row: u32, col: u32) -> u8 {
        let c = &self.config;
        let ciliated_cols = (c.ciliated_fraction * c.width as f64).round() as u32;
        let value = if col < ciliated_cols {
            let phase = std::f64::consts::PI * col as f64 / c.width as f64;
            let angle = 2.0 * std::f64::consts::PI * c.beat_frequency * t as f64 / c.sampling_rate;
            c.baseline + c.amplitude * (angle + phase).sin()
        } else {
            c.baseline
        };
        value.round().clamp(0.0, 255.0) as u8
    }
}

impl FrameSource for SyntheticSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        if self.sequence >= self.config.num_frames as u64 {
            return Ok(None);
        }

        let (width, height) = self.dimensions();
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height {
            for col in 0..width {
                pixels.push(self.intensity(self.sequence, row, col));
            }
        }

        let frame = Frame::new(pixels, width, height, self.sequence);
        self.sequence += 1;
        Ok(Some(frame))
    }

    fn frame_count_hint(&self) -> Option<usize> {
        Some(self.config.num_frames as usize)
    }
}
