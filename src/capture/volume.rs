//! Dense `[time][row][col]` grayscale volume.
//!
//! Frames are accumulated into a [`VolumeBuilder`] while decoding, since
//! the real frame count is only known once the source is exhausted. The
//! builder is then frozen into an immutable [`FrameVolume`] that the
//! spectral engine reads from many threads at once.

use super::Frame;
use thiserror::Error;

/// Errors raised while building or validating a frame volume.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VolumeError {
    /// No frame was supplied.
    #[error("frame volume contains no frames")]
    Empty,
    /// A frame dimension is zero.
    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions {
        /// Offending width.
        width: usize,
        /// Offending height.
        height: usize,
    },
    /// A frame differs in size from the first frame.
    #[error(
        "frame {sequence} is {found_width}x{found_height}, expected {expected_width}x{expected_height}"
    )]
    DimensionMismatch {
        /// Sequence number of the rejected frame.
        sequence: u64,
        /// Width fixed by the first frame.
        expected_width: usize,
        /// Height fixed by the first frame.
        expected_height: usize,
        /// Width of the rejected frame.
        found_width: usize,
        /// Height of the rejected frame.
        found_height: usize,
    },
    /// A frame's pixel buffer disagrees with its own dimensions.
    #[error("frame {sequence} holds {found} bytes, expected {expected}")]
    FrameSize {
        /// Sequence number of the rejected frame.
        sequence: u64,
        /// `width * height` of the frame.
        expected: usize,
        /// Actual buffer length.
        found: usize,
    },
    /// A raw buffer does not hold `frames * height * width` samples.
    #[error("volume buffer holds {found} bytes, expected {expected}")]
    BufferSize {
        /// Required sample count.
        expected: usize,
        /// Actual buffer length.
        found: usize,
    },
}

/// Immutable stack of equally sized grayscale frames.
///
/// Samples are laid out time-major: all pixels of frame 0, then frame 1,
/// and so on. Invariant: at least one frame, and both dimensions are
/// non-zero.
#[derive(Clone)]
pub struct FrameVolume {
    data: Box<[u8]>,
    num_frames: usize,
    height: usize,
    width: usize,
}

impl FrameVolume {
    /// Wraps a time-major sample buffer of `num_frames * height * width` bytes.
    pub fn from_raw(
        data: Vec<u8>,
        num_frames: usize,
        height: usize,
        width: usize,
    ) -> Result<Self, VolumeError> {
        if width == 0 || height == 0 {
            return Err(VolumeError::InvalidDimensions { width, height });
        }
        if num_frames == 0 {
            return Err(VolumeError::Empty);
        }
        let expected = num_frames * height * width;
        if data.len() != expected {
            return Err(VolumeError::BufferSize {
                expected,
                found: data.len(),
            });
        }

        Ok(Self {
            data: data.into_boxed_slice(),
            num_frames,
            height,
            width,
        })
    }

    /// Builds a volume by evaluating `sample(t, row, col)` for every position.
    pub fn from_fn(
        num_frames: usize,
        height: usize,
        width: usize,
        mut sample: impl FnMut(usize, usize, usize) -> u8,
    ) -> Result<Self, VolumeError> {
        let mut data = Vec::with_capacity(num_frames * height * width);
        for t in 0..num_frames {
            for row in 0..height {
                for col in 0..width {
                    data.push(sample(t, row, col));
                }
            }
        }
        Self::from_raw(data, num_frames, height, width)
    }

    /// Number of frames, the length of every pixel series.
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Rows per frame.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Columns per frame.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of pixels in one frame.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.height * self.width
    }

    /// Returns the intensity at `(t, row, col)`.
    #[inline]
    pub fn sample(&self, t: usize, row: usize, col: usize) -> u8 {
        self.data[t * self.frame_len() + row * self.width + col]
    }

    /// Iterates one pixel's samples in time order.
    pub fn pixel_series(&self, row: usize, col: usize) -> impl ExactSizeIterator<Item = u8> + '_ {
        (0..self.num_frames).map(move |t| self.sample(t, row, col))
    }

    /// Returns the full time-major sample buffer, in raw volume file order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl std::fmt::Debug for FrameVolume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameVolume")
            .field("num_frames", &self.num_frames)
            .field("height", &self.height)
            .field("width", &self.width)
            .finish()
    }
}

/// Growable frame storage used while a source is being drained.
#[derive(Debug, Default)]
pub struct VolumeBuilder {
    data: Vec<u8>,
    dimensions: Option<(usize, usize)>,
    num_frames: usize,
}

impl VolumeBuilder {
    /// Creates an empty builder; the first pushed frame fixes its dimensions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-reserves room for `frames` frames of `width * height` pixels.
    ///
    /// The hint only sizes the allocation; the volume still grows past it
    /// and is frozen at the count actually pushed.
    pub fn with_capacity(width: usize, height: usize, frames: usize) -> Self {
        Self {
            data: Vec::with_capacity(width * height * frames),
            dimensions: None,
            num_frames: 0,
        }
    }

    /// Appends a frame. The first frame fixes the volume's dimensions.
    pub fn push(&mut self, frame: &Frame) -> Result<(), VolumeError> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;

        if !frame.is_valid() {
            return Err(VolumeError::FrameSize {
                sequence: frame.sequence(),
                expected: frame.pixel_count(),
                found: frame.pixels().len(),
            });
        }

        match self.dimensions {
            None => {
                if width == 0 || height == 0 {
                    return Err(VolumeError::InvalidDimensions { width, height });
                }
                self.dimensions = Some((width, height));
            }
            Some((expected_width, expected_height)) => {
                if (width, height) != (expected_width, expected_height) {
                    return Err(VolumeError::DimensionMismatch {
                        sequence: frame.sequence(),
                        expected_width,
                        expected_height,
                        found_width: width,
                        found_height: height,
                    });
                }
            }
        }

        self.data.extend_from_slice(frame.pixels());
        self.num_frames += 1;
        Ok(())
    }

    /// Number of frames pushed so far.
    pub fn len(&self) -> usize {
        self.num_frames
    }

    /// True until the first frame is pushed.
    pub fn is_empty(&self) -> bool {
        self.num_frames == 0
    }

    /// Freezes the accumulated frames into an immutable volume.
    pub fn freeze(mut self) -> Result<FrameVolume, VolumeError> {
        let (width, height) = self.dimensions.ok_or(VolumeError::Empty)?;
        self.data.shrink_to_fit();
        FrameVolume::from_raw(self.data, self.num_frames, height, width)
    }
}
