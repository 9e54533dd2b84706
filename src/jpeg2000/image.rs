use crate::constants::{MAXIMUM_PRECISION, MINIMUM_PRECISION};
use crate::error::NormalizeError;

/// Color space tag attached to a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpace {
    #[default]
    Unknown,
    Srgb,
    Gray,
    /// Standard YCbCr.
    Sycc,
    /// Extended YCbCr (e-sYCC).
    Eycc,
    Cmyk,
}

/// One channel of a decoded image, stored on its own (possibly subsampled) grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Component {
    /// Width of the component grid in samples.
    pub width: u32,
    /// Height of the component grid in samples.
    pub height: u32,
    /// Horizontal subsampling factor relative to the reference grid.
    pub dx: u32,
    /// Vertical subsampling factor relative to the reference grid.
    pub dy: u32,
    /// Number of significant bits per sample (1-32).
    pub precision: u32,
    /// true if samples are two's complement, false if unsigned
    pub is_signed: bool,
    /// Horizontal origin of the component on its own grid.
    pub x0: u32,
    /// Vertical origin of the component on its own grid.
    pub y0: u32,
    /// Opacity channel.
    pub is_alpha: bool,
    /// Samples in row-major order, `width * height` long.
    pub data: Vec<i32>,
}

impl Component {
    /// Full-resolution unsigned component wrapping `data`.
    pub fn new(width: u32, height: u32, precision: u32, data: Vec<i32>) -> Self {
        Self {
            width,
            height,
            dx: 1,
            dy: 1,
            precision,
            is_signed: false,
            x0: 0,
            y0: 0,
            is_alpha: false,
            data,
        }
    }

    pub fn with_subsampling(mut self, dx: u32, dy: u32) -> Self {
        self.dx = dx;
        self.dy = dy;
        self
    }

    pub fn with_origin(mut self, x0: u32, y0: u32) -> Self {
        self.x0 = x0;
        self.y0 = y0;
        self
    }

    pub fn signed(mut self) -> Self {
        self.is_signed = true;
        self
    }

    pub fn alpha(mut self) -> Self {
        self.is_alpha = true;
        self
    }

    pub fn sample_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Checks precision range and that the buffer covers the grid exactly.
    pub fn validate(&self) -> Result<(), NormalizeError> {
        if !(MINIMUM_PRECISION..=MAXIMUM_PRECISION).contains(&self.precision) {
            return Err(NormalizeError::InvalidPrecision(self.precision));
        }
        if self.data.len() != self.sample_count() {
            return Err(NormalizeError::InvalidComponentData);
        }
        Ok(())
    }

    /// Copy of every field except the sample buffer.
    pub(crate) fn clone_metadata(&self) -> Component {
        Component {
            width: self.width,
            height: self.height,
            dx: self.dx,
            dy: self.dy,
            precision: self.precision,
            is_signed: self.is_signed,
            x0: self.x0,
            y0: self.y0,
            is_alpha: self.is_alpha,
            data: Vec::new(),
        }
    }

    /// Copies grid geometry (size, subsampling, origin) from `other`.
    pub(crate) fn match_geometry(&mut self, other: &Component) {
        self.width = other.width;
        self.height = other.height;
        self.dx = other.dx;
        self.dy = other.dy;
        self.x0 = other.x0;
        self.y0 = other.y0;
    }
}

/// A decoded multi-component image sharing one reference frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    /// Horizontal origin of the frame on the reference grid.
    pub x0: u32,
    /// Vertical origin of the frame on the reference grid.
    pub y0: u32,
    /// Right edge (exclusive) of the frame on the reference grid.
    pub x1: u32,
    /// Bottom edge (exclusive) of the frame on the reference grid.
    pub y1: u32,
    pub color_space: ColorSpace,
    /// Components in positional order (Y/R/Gray, Cb/G, Cr/B, K/alpha, ...).
    pub components: Vec<Component>,
    /// ICC profile declared by the container, carried through untouched.
    pub icc_profile: Option<Vec<u8>>,
}

impl Image {
    /// Builds an image whose frame starts at the origin and matches
    /// the size of the first component.
    pub fn new(components: Vec<Component>, color_space: ColorSpace) -> Self {
        let (x1, y1) = components
            .first()
            .map(|c| (c.width.saturating_mul(c.dx), c.height.saturating_mul(c.dy)))
            .unwrap_or_default();
        Self {
            x0: 0,
            y0: 0,
            x1,
            y1,
            color_space,
            components,
            icc_profile: None,
        }
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    /// Moves the frame origin, keeping its size, and re-derives every
    /// component origin as `ceil(origin / subsampling)`.
    pub fn with_origin(mut self, x0: u32, y0: u32) -> Self {
        let (width, height) = (self.width(), self.height());
        self.x0 = x0;
        self.y0 = y0;
        self.x1 = x0.saturating_add(width);
        self.y1 = y0.saturating_add(height);
        for component in &mut self.components {
            component.x0 = x0.div_ceil(component.dx.max(1));
            component.y0 = y0.div_ceil(component.dy.max(1));
        }
        self
    }

    /// True when the image satisfies the canonical 8-bit RGB layout.
    pub fn is_canonical_rgb8(&self) -> bool {
        let Some(first) = self.components.first() else {
            return false;
        };
        self.color_space == ColorSpace::Srgb
            && self.components.len() >= 3
            && self.components.iter().all(|c| {
                c.width == first.width
                    && c.height == first.height
                    && c.dx == 1
                    && c.dy == 1
                    && c.precision == 8
                    && !c.is_signed
                    && c.data.len() == c.sample_count()
            })
    }
}

/// Allocates a zeroed sample buffer, reporting allocation failure instead of aborting.
pub(crate) fn allocate_samples(len: usize) -> Result<Vec<i32>, NormalizeError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| NormalizeError::AllocationFailure)?;
    buffer.resize(len, 0);
    Ok(buffer)
}

/// Copies a sample buffer through the same fallible allocation path.
pub(crate) fn copy_samples(source: &[i32]) -> Result<Vec<i32>, NormalizeError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(source.len())
        .map_err(|_| NormalizeError::AllocationFailure)?;
    buffer.extend_from_slice(source);
    Ok(buffer)
}

/// Largest unsigned sample representable in `precision` bits.
pub(crate) fn max_sample_value(precision: u32) -> u64 {
    (1u64 << precision) - 1
}
