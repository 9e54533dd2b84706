//! Interleaving of normalized components into display pixel buffers.

use super::image::{ColorSpace, Image};
use crate::error::NormalizeError;

/// Byte offset of each channel inside a 4-byte pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    pub r: usize,
    pub g: usize,
    pub b: usize,
    pub a: usize,
}

impl PixelLayout {
    pub const RGBA: PixelLayout = PixelLayout { r: 0, g: 1, b: 2, a: 3 };
    pub const BGRA: PixelLayout = PixelLayout { r: 2, g: 1, b: 0, a: 3 };
    pub const ARGB: PixelLayout = PixelLayout { r: 1, g: 2, b: 3, a: 0 };

    fn is_valid(&self) -> bool {
        let offsets = [self.r, self.g, self.b, self.a];
        offsets.iter().all(|&o| o < 4)
            && (0..4).all(|i| offsets[i + 1..].iter().all(|&o| o != offsets[i]))
    }
}

impl Default for PixelLayout {
    fn default() -> Self {
        Self::RGBA
    }
}

fn check_normalized(image: &Image) -> Result<(), NormalizeError> {
    if image.color_space != ColorSpace::Srgb {
        return Err(NormalizeError::UnsupportedColorSpace(image.color_space));
    }
    if !image.is_canonical_rgb8() {
        return Err(NormalizeError::UnsupportedLayout);
    }
    Ok(())
}

/// Packs a normalized image into 4-byte pixels.
///
/// Alpha comes from the first component flagged `is_alpha` past the color
/// channels; without one every pixel is opaque.
pub fn pack_rgba32(image: &Image, layout: PixelLayout) -> Result<Vec<u8>, NormalizeError> {
    check_normalized(image)?;
    if !layout.is_valid() {
        return Err(NormalizeError::UnsupportedLayout);
    }

    let [r, g, b] = [0, 1, 2].map(|i| &image.components[i].data);
    let alpha = image.components[3..]
        .iter()
        .find(|c| c.is_alpha)
        .map(|c| &c.data);

    let pixel_count = r.len();
    let mut out = Vec::new();
    out.try_reserve_exact(pixel_count * 4)
        .map_err(|_| NormalizeError::AllocationFailure)?;
    out.resize(pixel_count * 4, 0);

    for (i, pixel) in out.chunks_exact_mut(4).enumerate() {
        pixel[layout.r] = r[i] as u8;
        pixel[layout.g] = g[i] as u8;
        pixel[layout.b] = b[i] as u8;
        pixel[layout.a] = alpha.map_or(0xFF, |a| a[i] as u8);
    }
    Ok(out)
}

/// Interleaves the three color channels of a normalized image as `RGBRGB...`.
pub fn interleave_rgb8(image: &Image) -> Result<Vec<u8>, NormalizeError> {
    check_normalized(image)?;
    let channels = &image.components[..3];
    let pixel_count = channels[0].data.len();

    let mut out = Vec::new();
    out.try_reserve_exact(pixel_count * 3)
        .map_err(|_| NormalizeError::AllocationFailure)?;
    for i in 0..pixel_count {
        out.extend(channels.iter().map(|c| c.data[i] as u8));
    }
    Ok(out)
}
