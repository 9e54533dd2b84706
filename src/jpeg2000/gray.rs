use tracing::debug;

use super::image::{ColorSpace, Component, Image, copy_samples};
use crate::error::NormalizeError;

/// Expands a grayscale image to RGB by replicating component 0 three times.
///
/// Components after the gray channel keep their order and move up two slots.
/// The input is consumed; on allocation failure it is dropped.
pub fn expand_grayscale_to_rgb(image: Image) -> Result<Image, NormalizeError> {
    let Some(gray) = image.components.first() else {
        return Err(NormalizeError::UnsupportedLayout);
    };

    let mut components = Vec::new();
    components
        .try_reserve_exact(image.components.len() + 2)
        .map_err(|_| NormalizeError::AllocationFailure)?;
    for _ in 0..3 {
        components.push(Component {
            data: copy_samples(&gray.data)?,
            ..gray.clone_metadata()
        });
    }

    let Image {
        x0,
        y0,
        x1,
        y1,
        components: original,
        icc_profile,
        ..
    } = image;
    components.extend(original.into_iter().skip(1));

    debug!(components = components.len(), "expanded grayscale to RGB");
    Ok(Image {
        x0,
        y0,
        x1,
        y1,
        color_space: ColorSpace::Srgb,
        components,
        icc_profile,
    })
}
