//! Sample-replication upsampling of subsampled components to the frame grid.

use tracing::debug;

use super::image::{Image, allocate_samples};
use crate::error::NormalizeError;

/// Brings every component with `dx > 1` or `dy > 1` to full frame resolution.
///
/// Each sample is replicated over the `dx x dy` block it covers. When the
/// component grid starts after the frame origin (odd origin with 2:1
/// subsampling, for instance), the uncovered leading columns and rows are
/// filled with zero.
pub fn upsample_components(mut image: Image) -> Result<Image, NormalizeError> {
    if !image.components.iter().any(|c| c.dx > 1 || c.dy > 1) {
        return Ok(image);
    }

    let (frame_x0, frame_y0) = (image.x0, image.y0);
    let frame_width = image.width() as usize;
    let frame_height = image.height() as usize;

    for (index, component) in image.components.iter_mut().enumerate() {
        if component.dx <= 1 && component.dy <= 1 {
            continue;
        }
        component.validate()?;

        let (dx, dy) = (component.dx as usize, component.dy as usize);
        let xoff = phase_offset(component.dx, component.x0, frame_x0)?;
        let yoff = phase_offset(component.dy, component.y0, frame_y0)?;

        let src_width = component.width as usize;
        let src_height = component.height as usize;
        let width = if dx > 1 { frame_width } else { src_width };
        let height = if dy > 1 { frame_height } else { src_height };

        let mut data = allocate_samples(width * height)?;
        if src_width > 0 && src_height > 0 {
            for y in yoff..height {
                let src_row = ((y - yoff) / dy).min(src_height - 1) * src_width;
                let row = &mut data[y * width..(y + 1) * width];
                for (x, sample) in row.iter_mut().enumerate().skip(xoff) {
                    let src_col = ((x - xoff) / dx).min(src_width - 1);
                    *sample = component.data[src_row + src_col];
                }
            }
        }

        debug!(
            component = index,
            from = ?(src_width, src_height),
            to = ?(width, height),
            "upsampled component"
        );
        component.data = data;
        component.width = width as u32;
        component.height = height as u32;
        component.dx = 1;
        component.dy = 1;
        component.x0 = frame_x0;
        component.y0 = frame_y0;
    }

    Ok(image)
}

/// Distance in frame samples from the frame origin to the first component sample.
fn phase_offset(step: u32, component_origin: u32, frame_origin: u32) -> Result<usize, NormalizeError> {
    let offset = step
        .checked_mul(component_origin)
        .and_then(|start| start.checked_sub(frame_origin))
        .ok_or(NormalizeError::UnsupportedLayout)?;
    if offset >= step {
        return Err(NormalizeError::UnsupportedLayout);
    }
    Ok(offset as usize)
}
