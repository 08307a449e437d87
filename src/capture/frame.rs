//! One decoded grayscale video frame, the unit a [`super::FrameSource`]
//! hands to [`super::VolumeBuilder`].

/// A decoded 8-bit grayscale frame.
///
/// Pixels are row-major, one intensity byte each. Color footage must be
/// reduced to luminance before it reaches this type. A frame carries no
/// timestamp: its time is `sequence / sampling_rate`, and the spectral
/// engine assumes frames arrive evenly spaced.
#[derive(Clone)]
pub struct Frame {
    /// Intensities, row-major.
    pixels: Vec<u8>,
    /// Columns.
    width: u32,
    /// Rows.
    height: u32,
    /// Zero-based index in the source; becomes the time axis of the volume.
    sequence: u64,
}

impl Frame {
    /// Wraps decoded pixels. Size is checked later, by [`Frame::is_valid`]
    /// when the frame is pushed into a volume.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            sequence,
        }
    }

    /// Row-major intensities, in raw volume file order.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Columns per row.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Rows per frame.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Index of this frame in its source.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// `width * height`.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// True when the pixel buffer holds exactly one byte per pixel.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence)
            .field("dimensions", &format_args!("{}x{}", self.width, self.height))
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}
