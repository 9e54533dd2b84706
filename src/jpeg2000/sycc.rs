//! YCbCr (sYCC) to RGB conversion.
//!
//! Chroma components may be subsampled relative to luma. Three layouts are
//! supported, identified by the subsampling factors of components 1 and 2:
//!
//! - 4:4:4: no subsampling.
//! - 4:2:2: chroma at half horizontal resolution.
//! - 4:2:0: chroma at half horizontal and vertical resolution.
//!
//! When the frame origin is odd on a subsampled axis, the first luma
//! column (or row) has no chroma sample of its own and is converted with
//! raw `cb = cr = 0`.

use tracing::debug;

use super::image::{Component, ColorSpace, Image, allocate_samples};
use crate::constants::MAXIMUM_CONVERSION_PRECISION;
use crate::error::NormalizeError;

/// One converted RGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbSample {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

/// Converts one YCbCr sample triple to RGB.
///
/// `offset` is the chroma bias (`2^(prec-1)`), `max_value` the clamp
/// ceiling (`2^prec - 1`). Products are truncated toward zero.
pub fn sycc_to_rgb_pixel(offset: i32, max_value: i32, y: i32, cb: i32, cr: i32) -> RgbSample {
    let y = y as i64;
    let cb = (cb as i64 - offset as i64) as f64;
    let cr = (cr as i64 - offset as i64) as f64;
    let max_value = max_value as i64;

    let r = y + (1.402 * cr) as i64;
    let g = y - (0.344 * cb + 0.714 * cr) as i64;
    let b = y + (1.772 * cb) as i64;

    RgbSample {
        r: r.clamp(0, max_value) as i32,
        g: g.clamp(0, max_value) as i32,
        b: b.clamp(0, max_value) as i32,
    }
}

/// Chroma subsampling layout of a three-component YCbCr image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaLayout {
    Yuv444,
    Yuv422,
    Yuv420,
}

impl ChromaLayout {
    /// Identifies the layout from the subsampling of components 0-2.
    /// Returns `None` for any other combination.
    pub fn detect(image: &Image) -> Option<Self> {
        let [y, cb, cr] = image.components.get(..3)? else {
            return None;
        };
        if (y.dx, y.dy) != (1, 1) {
            return None;
        }
        match ((cb.dx, cb.dy), (cr.dx, cr.dy)) {
            ((1, 1), (1, 1)) => Some(Self::Yuv444),
            ((2, 1), (2, 1)) => Some(Self::Yuv422),
            ((2, 2), (2, 2)) => Some(Self::Yuv420),
            _ => None,
        }
    }
}

/// Converts a YCbCr image to RGB, choosing the resampler from the chroma layout.
///
/// Images with fewer than three components are retagged as grayscale.
pub fn sycc_to_rgb(image: &mut Image) -> Result<(), NormalizeError> {
    if image.components.len() < 3 {
        image.color_space = ColorSpace::Gray;
        return Ok(());
    }
    match ChromaLayout::detect(image) {
        Some(ChromaLayout::Yuv444) => sycc444_to_rgb(image),
        Some(ChromaLayout::Yuv422) => sycc422_to_rgb(image),
        Some(ChromaLayout::Yuv420) => sycc420_to_rgb(image),
        None => Err(NormalizeError::UnsupportedLayout),
    }
}

/// Converts a 4:4:4 YCbCr image to RGB in place.
pub fn sycc444_to_rgb(image: &mut Image) -> Result<(), NormalizeError> {
    let params = PixelParams::from_image(image)?;
    let [luma, cb, cr] = ycc_components(image)?;
    if (cb.width, cb.height) != (luma.width, luma.height)
        || (cr.width, cr.height) != (luma.width, luma.height)
    {
        return Err(NormalizeError::UnsupportedLayout);
    }

    let mut planes = RgbPlanes::allocate(luma.sample_count())?;
    for (i, ((&y, &cb), &cr)) in luma.data.iter().zip(&cb.data).zip(&cr.data).enumerate() {
        planes.put(i, params.convert(y, cb, cr));
    }

    planes.install(image);
    debug!("converted 4:4:4 YCbCr to RGB");
    Ok(())
}

/// Converts a 4:2:2 YCbCr image (half horizontal chroma resolution) to RGB in place.
pub fn sycc422_to_rgb(image: &mut Image) -> Result<(), NormalizeError> {
    let params = PixelParams::from_image(image)?;
    let offx = (image.x0 & 1) as usize;
    let [luma, cb, cr] = ycc_components(image)?;
    let width = luma.width as usize;
    let height = luma.height as usize;
    let chroma_stride = check_chroma_extent(cb, cr, width.saturating_sub(offx).div_ceil(2), height)?;

    let mut planes = RgbPlanes::allocate(luma.sample_count())?;
    for row in 0..height {
        let luma_row = row * width;
        let chroma_row = row * chroma_stride;

        if offx > 0 && width > 0 {
            planes.put(luma_row, params.convert(luma.data[luma_row], 0, 0));
        }

        for (pair, first_col) in (offx..width).step_by(2).enumerate() {
            let chroma = chroma_row + pair;
            let (cb_sample, cr_sample) = (cb.data[chroma], cr.data[chroma]);
            for col in first_col..(first_col + 2).min(width) {
                let i = luma_row + col;
                planes.put(i, params.convert(luma.data[i], cb_sample, cr_sample));
            }
        }
    }

    planes.install(image);
    debug!(odd_x0 = offx > 0, "converted 4:2:2 YCbCr to RGB");
    Ok(())
}

/// Converts a 4:2:0 YCbCr image (half horizontal and vertical chroma resolution)
/// to RGB in place.
///
/// Each chroma sample produces the 2x2 luma block it covers, clipped at the
/// right and bottom frame edges.
pub fn sycc420_to_rgb(image: &mut Image) -> Result<(), NormalizeError> {
    let params = PixelParams::from_image(image)?;
    let offx = (image.x0 & 1) as usize;
    let offy = (image.y0 & 1) as usize;
    let [luma, cb, cr] = ycc_components(image)?;
    let width = luma.width as usize;
    let height = luma.height as usize;
    let block_cols = width.saturating_sub(offx).div_ceil(2);
    let block_rows = height.saturating_sub(offy).div_ceil(2);
    let chroma_stride = check_chroma_extent(cb, cr, block_cols, block_rows)?;

    let mut planes = RgbPlanes::allocate(luma.sample_count())?;

    if offy > 0 && height > 0 {
        for col in 0..width {
            planes.put(col, params.convert(luma.data[col], 0, 0));
        }
    }

    for block_row in 0..block_rows {
        let first_row = offy + 2 * block_row;
        let rows = first_row..(first_row + 2).min(height);

        if offx > 0 && width > 0 {
            for row in rows.clone() {
                let i = row * width;
                planes.put(i, params.convert(luma.data[i], 0, 0));
            }
        }

        for block_col in 0..block_cols {
            let chroma = block_row * chroma_stride + block_col;
            let (cb_sample, cr_sample) = (cb.data[chroma], cr.data[chroma]);
            let first_col = offx + 2 * block_col;
            for row in rows.clone() {
                for col in first_col..(first_col + 2).min(width) {
                    let i = row * width + col;
                    planes.put(i, params.convert(luma.data[i], cb_sample, cr_sample));
                }
            }
        }
    }

    planes.install(image);
    debug!(odd_x0 = offx > 0, odd_y0 = offy > 0, "converted 4:2:0 YCbCr to RGB");
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct PixelParams {
    offset: i32,
    max_value: i32,
}

impl PixelParams {
    fn from_image(image: &Image) -> Result<Self, NormalizeError> {
        let [luma, cb, cr] = ycc_components(image)?;
        for component in [luma, cb, cr] {
            component.validate()?;
        }
        let precision = luma.precision;
        if precision > MAXIMUM_CONVERSION_PRECISION {
            return Err(NormalizeError::InvalidPrecision(precision));
        }
        Ok(Self {
            offset: 1 << (precision - 1),
            max_value: ((1i64 << precision) - 1) as i32,
        })
    }

    #[inline]
    fn convert(&self, y: i32, cb: i32, cr: i32) -> RgbSample {
        sycc_to_rgb_pixel(self.offset, self.max_value, y, cb, cr)
    }
}

fn ycc_components(image: &Image) -> Result<[&Component; 3], NormalizeError> {
    match image.components.get(..3) {
        Some([y, cb, cr]) => Ok([y, cb, cr]),
        _ => Err(NormalizeError::UnsupportedLayout),
    }
}

/// Verifies both chroma grids cover `cols x rows` samples and returns their row stride.
fn check_chroma_extent(
    cb: &Component,
    cr: &Component,
    cols: usize,
    rows: usize,
) -> Result<usize, NormalizeError> {
    if cb.width != cr.width || cb.height != cr.height {
        return Err(NormalizeError::UnsupportedLayout);
    }
    if (cb.width as usize) < cols || (cb.height as usize) < rows {
        return Err(NormalizeError::UnsupportedLayout);
    }
    Ok(cb.width as usize)
}

/// Output planes of a conversion, installed into the image only once complete.
struct RgbPlanes {
    r: Vec<i32>,
    g: Vec<i32>,
    b: Vec<i32>,
}

impl RgbPlanes {
    fn allocate(len: usize) -> Result<Self, NormalizeError> {
        Ok(Self {
            r: allocate_samples(len)?,
            g: allocate_samples(len)?,
            b: allocate_samples(len)?,
        })
    }

    #[inline]
    fn put(&mut self, index: usize, sample: RgbSample) {
        self.r[index] = sample.r;
        self.g[index] = sample.g;
        self.b[index] = sample.b;
    }

    /// Replaces the first three component buffers and brings chroma metadata
    /// up to luma resolution.
    fn install(self, image: &mut Image) {
        let (luma, chroma) = image.components.split_at_mut(1);
        let luma = &mut luma[0];
        luma.data = self.r;
        luma.is_signed = false;
        for (component, data) in chroma[..2].iter_mut().zip([self.g, self.b]) {
            component.data = data;
            component.match_geometry(luma);
            component.precision = luma.precision;
            component.is_signed = false;
        }
        image.color_space = ColorSpace::Srgb;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn ycc_image(
        width: u32,
        height: u32,
        luma: Vec<i32>,
        chroma: (u32, u32, Vec<i32>, Vec<i32>),
        subsampling: (u32, u32),
    ) -> Image {
        let (cw, ch, cb, cr) = chroma;
        let (dx, dy) = subsampling;
        Image::new(
            vec![
                Component::new(width, height, 8, luma),
                Component::new(cw, ch, 8, cb).with_subsampling(dx, dy),
                Component::new(cw, ch, 8, cr).with_subsampling(dx, dy),
            ],
            ColorSpace::Sycc,
        )
    }

    fn rgb(image: &Image) -> [Vec<i32>; 3] {
        [
            image.components[0].data.clone(),
            image.components[1].data.clone(),
            image.components[2].data.clone(),
        ]
    }

    #[test]
    fn test_pixel_neutral_chroma_is_gray() {
        let px = sycc_to_rgb_pixel(128, 255, 128, 128, 128);
        assert_eq!(px, RgbSample { r: 128, g: 128, b: 128 });
    }

    #[test]
    fn test_pixel_zero_input() {
        // cb' = cr' = -128: r and b clamp to 0, g = -trunc(-135.424) = 135.
        let px = sycc_to_rgb_pixel(128, 255, 0, 0, 0);
        assert_eq!(px, RgbSample { r: 0, g: 135, b: 0 });
    }

    #[test]
    fn test_pixel_truncates_toward_zero() {
        // 1.402 * 10 = 14.02 -> 14; 1.402 * -10 = -14.02 -> -14
        assert_eq!(sycc_to_rgb_pixel(128, 255, 100, 128, 138).r, 114);
        assert_eq!(sycc_to_rgb_pixel(128, 255, 100, 128, 118).r, 86);
        // 1.772 * 1 = 1.772 -> 1, not 2
        assert_eq!(sycc_to_rgb_pixel(128, 255, 100, 129, 128).b, 101);
        // -(0.344 * 1) truncates to 0
        assert_eq!(sycc_to_rgb_pixel(128, 255, 100, 129, 128).g, 100);
    }

    #[test]
    fn test_pixel_stays_in_range_for_8bit_inputs() {
        let corners = [0, 1, 127, 128, 129, 254, 255];
        for &y in &corners {
            for &cb in &corners {
                for &cr in &corners {
                    let px = sycc_to_rgb_pixel(128, 255, y, cb, cr);
                    for v in [px.r, px.g, px.b] {
                        assert!((0..=255).contains(&v), "{y} {cb} {cr} -> {px:?}");
                    }
                }
            }
        }
        for y in (0..256).step_by(5) {
            for cb in (0..256).step_by(7) {
                for cr in (0..256).step_by(11) {
                    let px = sycc_to_rgb_pixel(128, 255, y, cb, cr);
                    assert!((0..=255).contains(&px.r));
                    assert!((0..=255).contains(&px.g));
                    assert!((0..=255).contains(&px.b));
                }
            }
        }
    }

    #[test]
    fn test_layout_detection() {
        let full = ycc_image(2, 2, vec![0; 4], (2, 2, vec![0; 4], vec![0; 4]), (1, 1));
        assert_eq!(ChromaLayout::detect(&full), Some(ChromaLayout::Yuv444));
        let half = ycc_image(2, 2, vec![0; 4], (1, 2, vec![0; 2], vec![0; 2]), (2, 1));
        assert_eq!(ChromaLayout::detect(&half), Some(ChromaLayout::Yuv422));
        let quarter = ycc_image(2, 2, vec![0; 4], (1, 1, vec![0], vec![0]), (2, 2));
        assert_eq!(ChromaLayout::detect(&quarter), Some(ChromaLayout::Yuv420));
        let odd = ycc_image(2, 2, vec![0; 4], (2, 1, vec![0; 2], vec![0; 2]), (1, 2));
        assert_eq!(ChromaLayout::detect(&odd), None);
    }

    #[test]
    fn test_sycc444_mid_gray() {
        let mut image = ycc_image(3, 2, vec![128; 6], (3, 2, vec![128; 6], vec![128; 6]), (1, 1));
        sycc444_to_rgb(&mut image).unwrap();
        assert_eq!(image.color_space, ColorSpace::Srgb);
        assert_eq!(rgb(&image), [vec![128; 6], vec![128; 6], vec![128; 6]]);
    }

    #[test]
    fn test_sycc444_mismatched_dimensions_leaves_image() {
        let mut image = ycc_image(2, 2, vec![128; 4], (1, 2, vec![128; 2], vec![128; 2]), (1, 1));
        let before = image.clone();
        assert_eq!(sycc444_to_rgb(&mut image), Err(NormalizeError::UnsupportedLayout));
        assert_eq!(image, before);
    }

    #[test]
    fn test_sycc422_even_origin() {
        // Row 0 pairs use chroma (cb, cr) = (128, 168) then (128, 128).
        let mut image = ycc_image(
            4,
            1,
            vec![100, 100, 100, 100],
            (2, 1, vec![128, 128], vec![168, 128]),
            (2, 1),
        );
        sycc422_to_rgb(&mut image).unwrap();
        let expected_left = sycc_to_rgb_pixel(128, 255, 100, 128, 168);
        let [r, g, b] = rgb(&image);
        assert_eq!(r, vec![expected_left.r, expected_left.r, 100, 100]);
        assert_eq!(g, vec![expected_left.g, expected_left.g, 100, 100]);
        assert_eq!(b, vec![expected_left.b, expected_left.b, 100, 100]);
        assert_eq!(image.components[1].width, 4);
        assert_eq!(image.components[2].dx, 1);
    }

    #[test]
    fn test_sycc422_odd_origin_uses_zero_chroma_first_column() {
        let mut image = ycc_image(
            3,
            2,
            vec![90, 100, 110, 90, 100, 110],
            (1, 2, vec![128, 128], vec![128, 128]),
            (2, 1),
        )
        .with_origin(1, 0);
        sycc422_to_rgb(&mut image).unwrap();
        let synthetic = sycc_to_rgb_pixel(128, 255, 90, 0, 0);
        let [r, g, b] = rgb(&image);
        assert_eq!(r, vec![synthetic.r, 100, 110, synthetic.r, 100, 110]);
        assert_eq!(g, vec![synthetic.g, 100, 110, synthetic.g, 100, 110]);
        assert_eq!(b, vec![synthetic.b, 100, 110, synthetic.b, 100, 110]);
    }

    #[test]
    fn test_sycc420_odd_origin_row_and_column() {
        // Frame origin (1, 1): luma 3x3, chroma covers rows/cols 1..3 with one sample.
        let mut image = ycc_image(3, 3, vec![100; 9], (1, 1, vec![128], vec![128]), (2, 2))
            .with_origin(1, 1);
        sycc420_to_rgb(&mut image).unwrap();
        let z = sycc_to_rgb_pixel(128, 255, 100, 0, 0);
        let [r, g, _] = rgb(&image);
        assert_eq!(r, vec![z.r, z.r, z.r, z.r, 100, 100, z.r, 100, 100]);
        assert_eq!(g, vec![z.g, z.g, z.g, z.g, 100, 100, z.g, 100, 100]);
    }

    #[test]
    fn test_sycc422_odd_origin_single_trailing_column() {
        let mut image = ycc_image(2, 1, vec![90, 50], (1, 1, vec![128], vec![128]), (2, 1))
            .with_origin(1, 0);
        sycc422_to_rgb(&mut image).unwrap();
        let synthetic = sycc_to_rgb_pixel(128, 255, 90, 0, 0);
        let [r, g, b] = rgb(&image);
        assert_eq!(r, vec![0, 50]);
        assert_eq!(g, vec![synthetic.g, 50]);
        assert_eq!(b, vec![synthetic.b, 50]);
    }

    #[test]
    fn test_sycc420_odd_origin_single_trailing_column() {
        let mut image = ycc_image(2, 2, vec![90, 50, 90, 60], (1, 1, vec![128], vec![128]), (2, 2))
            .with_origin(1, 0);
        sycc420_to_rgb(&mut image).unwrap();
        let [r, _, _] = rgb(&image);
        assert_eq!(r, vec![0, 50, 0, 60]);
    }

    #[test]
    fn test_sycc420_odd_y0_even_height() {
        // Row 0 is synthetic, rows 1-2 share chroma row 0, row 3 is the clipped block of chroma row 1.
        let mut image = ycc_image(
            2,
            4,
            vec![100; 8],
            (1, 2, vec![128, 128], vec![128, 168]),
            (2, 2),
        )
        .with_origin(0, 1);
        sycc420_to_rgb(&mut image).unwrap();
        let z = sycc_to_rgb_pixel(128, 255, 100, 0, 0);
        let last = sycc_to_rgb_pixel(128, 255, 100, 128, 168);
        let [r, g, b] = rgb(&image);
        assert_eq!(r, vec![z.r, z.r, 100, 100, 100, 100, last.r, last.r]);
        assert_eq!(g, vec![z.g, z.g, 100, 100, 100, 100, last.g, last.g]);
        assert_eq!(b, vec![z.b, z.b, 100, 100, 100, 100, last.b, last.b]);
        assert_eq!((image.components[2].width, image.components[2].height), (2, 4));
    }

    #[test]
    fn test_sycc420_too_small_chroma_is_rejected() {
        let mut image = ycc_image(4, 4, vec![100; 16], (1, 1, vec![128], vec![128]), (2, 2));
        assert_eq!(sycc420_to_rgb(&mut image), Err(NormalizeError::UnsupportedLayout));
        assert_eq!(image.color_space, ColorSpace::Sycc);
    }

    /// Replicates each chroma sample over the luma positions it covers.
    fn expand_chroma(plane: &[i32], cw: usize, width: usize, height: usize, dx: usize, dy: usize) -> Vec<i32> {
        let mut out = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                out.push(plane[(row / dy) * cw + col / dx]);
            }
        }
        out
    }

    #[rstest]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(3, 2)]
    #[case(2, 3)]
    #[case(3, 3)]
    #[case(4, 4)]
    #[case(5, 1)]
    #[case(1, 5)]
    fn test_sycc420_matches_expanded_444(#[case] width: usize, #[case] height: usize) {
        let cw = width.div_ceil(2);
        let ch = height.div_ceil(2);
        let luma: Vec<i32> = (0..width * height).map(|i| (i as i32 * 37) % 256).collect();
        let cb: Vec<i32> = (0..cw * ch).map(|i| 60 + i as i32 * 29).collect();
        let cr: Vec<i32> = (0..cw * ch).map(|i| 200 - i as i32 * 23).collect();

        let mut subsampled = ycc_image(
            width as u32,
            height as u32,
            luma.clone(),
            (cw as u32, ch as u32, cb.clone(), cr.clone()),
            (2, 2),
        );
        sycc420_to_rgb(&mut subsampled).unwrap();

        let mut full = ycc_image(
            width as u32,
            height as u32,
            luma,
            (
                width as u32,
                height as u32,
                expand_chroma(&cb, cw, width, height, 2, 2),
                expand_chroma(&cr, cw, width, height, 2, 2),
            ),
            (1, 1),
        );
        sycc444_to_rgb(&mut full).unwrap();

        assert_eq!(rgb(&subsampled), rgb(&full));
        assert_eq!(subsampled.components[1].width, width as u32);
        assert_eq!(subsampled.components[2].height, height as u32);
        assert_eq!(subsampled.components[1].dy, 1);
    }

    #[rstest]
    #[case(1, 1)]
    #[case(2, 1)]
    #[case(3, 2)]
    #[case(4, 3)]
    #[case(5, 5)]
    fn test_sycc422_matches_expanded_444(#[case] width: usize, #[case] height: usize) {
        let cw = width.div_ceil(2);
        let luma: Vec<i32> = (0..width * height).map(|i| (i as i32 * 53) % 256).collect();
        let cb: Vec<i32> = (0..cw * height).map(|i| (40 + i as i32 * 31) % 256).collect();
        let cr: Vec<i32> = (0..cw * height).map(|i| (250 - i as i32 * 17).rem_euclid(256)).collect();

        let mut subsampled = ycc_image(
            width as u32,
            height as u32,
            luma.clone(),
            (cw as u32, height as u32, cb.clone(), cr.clone()),
            (2, 1),
        );
        sycc422_to_rgb(&mut subsampled).unwrap();

        let mut full = ycc_image(
            width as u32,
            height as u32,
            luma,
            (
                width as u32,
                height as u32,
                expand_chroma(&cb, cw, width, height, 2, 1),
                expand_chroma(&cr, cw, width, height, 2, 1),
            ),
            (1, 1),
        );
        sycc444_to_rgb(&mut full).unwrap();

        assert_eq!(rgb(&subsampled), rgb(&full));
    }

    #[test]
    fn test_sycc_to_rgb_retags_two_components_as_gray() {
        let mut image = Image::new(
            vec![Component::new(1, 1, 8, vec![5]), Component::new(1, 1, 8, vec![6])],
            ColorSpace::Sycc,
        );
        sycc_to_rgb(&mut image).unwrap();
        assert_eq!(image.color_space, ColorSpace::Gray);
        assert_eq!(image.components[0].data, vec![5]);
    }

    #[test]
    fn test_sycc_to_rgb_rejects_unknown_layout() {
        let mut image = ycc_image(2, 2, vec![0; 4], (2, 1, vec![0; 2], vec![0; 2]), (1, 2));
        assert_eq!(sycc_to_rgb(&mut image), Err(NormalizeError::UnsupportedLayout));
    }
}
