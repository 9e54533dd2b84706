//! CMYK and extended YCbCr (e-sYCC) to RGB conversion.

use tracing::debug;

use super::image::{ColorSpace, Component, Image, max_sample_value};
use crate::constants::{CANONICAL_PRECISION, MAXIMUM_CONVERSION_PRECISION};
use crate::error::NormalizeError;

/// Converts a CMYK image to 8-bit RGB in place.
///
/// Channels are normalized to [0, 1] and inverted before the product, so a
/// sample of zero means full intensity. The K component is removed and any
/// later components move down one slot.
pub fn cmyk_to_rgb(image: &mut Image) -> Result<(), NormalizeError> {
    let Some(cmyk) = image.components.get(..4) else {
        return Err(NormalizeError::UnsupportedLayout);
    };
    if !same_subsampling(cmyk) {
        return Err(NormalizeError::UnsupportedLayout);
    }
    for component in cmyk {
        component.validate()?;
    }
    let len = cmyk[0].sample_count();
    if cmyk.iter().any(|c| c.sample_count() != len) {
        return Err(NormalizeError::UnsupportedLayout);
    }

    let scale: [f32; 4] =
        std::array::from_fn(|i| 1.0 / max_sample_value(cmyk[i].precision) as f32);

    let (cmy, rest) = image.components.split_at_mut(3);
    let key = &rest[0];
    let [c, m, y] = cmy else {
        return Err(NormalizeError::UnsupportedLayout);
    };
    for i in 0..len {
        let k = 1.0 - sample_value(key, i) * scale[3];
        let cyan = 1.0 - sample_value(c, i) * scale[0];
        let magenta = 1.0 - sample_value(m, i) * scale[1];
        let yellow = 1.0 - sample_value(y, i) * scale[2];

        c.data[i] = (255.0 * cyan * k) as i32;
        m.data[i] = (255.0 * magenta * k) as i32;
        y.data[i] = (255.0 * yellow * k) as i32;
    }
    for component in [c, m, y] {
        component.precision = CANONICAL_PRECISION;
        component.is_signed = false;
    }

    // Dropping the removed component releases the K buffer.
    image.components.remove(3);
    image.color_space = ColorSpace::Srgb;
    debug!(components = image.components.len(), "converted CMYK to RGB");
    Ok(())
}

/// Converts an extended YCbCr image to RGB in place.
///
/// Chroma samples of unsigned components are re-centered around zero first;
/// signed chroma is used as-is.
pub fn eycc_to_rgb(image: &mut Image) -> Result<(), NormalizeError> {
    let Some(ycc) = image.components.get(..3) else {
        return Err(NormalizeError::UnsupportedLayout);
    };
    if !same_subsampling(ycc) {
        return Err(NormalizeError::UnsupportedLayout);
    }
    for component in ycc {
        component.validate()?;
    }
    let len = ycc[0].sample_count();
    if ycc.iter().any(|c| c.sample_count() != len) {
        return Err(NormalizeError::UnsupportedLayout);
    }
    let precision = ycc[0].precision;
    if precision > MAXIMUM_CONVERSION_PRECISION {
        return Err(NormalizeError::InvalidPrecision(precision));
    }

    let flip_value = 1i32 << (precision - 1);
    let max_value = max_sample_value(precision) as i32;
    let unbias_cb = !ycc[1].is_signed;
    let unbias_cr = !ycc[2].is_signed;

    let [y_comp, cb_comp, cr_comp] = &mut image.components[..3] else {
        return Err(NormalizeError::UnsupportedLayout);
    };
    for i in 0..len {
        let y = y_comp.data[i] as f32;
        let mut cb = cb_comp.data[i];
        let mut cr = cr_comp.data[i];
        if unbias_cb {
            cb = cb.saturating_sub(flip_value);
        }
        if unbias_cr {
            cr = cr.saturating_sub(flip_value);
        }
        let (cb, cr) = (cb as f32, cr as f32);

        let r = (y - 0.0000368 * cb + 1.40199 * cr + 0.5) as i32;
        let g = (1.0003 * y - 0.344125 * cb - 0.7141128 * cr + 0.5) as i32;
        let b = (0.999823 * y + 1.77204 * cb - 0.000008 * cr + 0.5) as i32;

        y_comp.data[i] = r.clamp(0, max_value);
        cb_comp.data[i] = g.clamp(0, max_value);
        cr_comp.data[i] = b.clamp(0, max_value);
    }
    for component in [y_comp, cb_comp, cr_comp] {
        component.is_signed = false;
    }

    image.color_space = ColorSpace::Srgb;
    debug!("converted e-sYCC to RGB");
    Ok(())
}

/// Sample `index` of `component`; unsigned samples are read as `u32`.
#[inline]
fn sample_value(component: &Component, index: usize) -> f32 {
    let sample = component.data[index];
    if component.is_signed {
        sample as f32
    } else {
        sample as u32 as f32
    }
}

fn same_subsampling(components: &[Component]) -> bool {
    components
        .iter()
        .all(|c| c.dx == components[0].dx && c.dy == components[0].dy)
}
