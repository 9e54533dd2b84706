//! Normalization of decoded images to canonical 8-bit RGB.
//!
//! The pipeline runs in fixed order:
//!
//! 1. Classify the color space (grayscale by component count, YCbCr by layout).
//! 2. Convert to RGB with the handler attached to the color space.
//! 3. Bring every component to the target precision.
//! 4. Upsample any component that is still subsampled.
//! 5. Expand grayscale to RGB; anything else that is not sRGB is rejected.

use tracing::{debug, error, warn};

use super::convert::{cmyk_to_rgb, eycc_to_rgb};
use super::gray::expand_grayscale_to_rgb;
use super::image::{ColorSpace, Image};
use super::precision::{PrecisionMode, level_shift_to_unsigned};
use super::sycc::sycc_to_rgb;
use super::upsample::upsample_components;
use crate::constants::CANONICAL_PRECISION;
use crate::error::NormalizeError;

/// In-place conversion of an image to sRGB.
pub type ColorConversion = fn(&mut Image) -> Result<(), NormalizeError>;

impl ColorSpace {
    /// Conversion to sRGB for this color space, if one is needed.
    pub fn conversion(self) -> Option<ColorConversion> {
        match self {
            Self::Sycc => Some(sycc_to_rgb),
            Self::Cmyk => Some(cmyk_to_rgb),
            Self::Eycc => Some(eycc_to_rgb),
            Self::Srgb | Self::Gray | Self::Unknown => None,
        }
    }
}

/// Infers the color space from the component layout.
///
/// One or two components are grayscale. Three components whose first is at
/// full resolution while the second is horizontally subsampled are YCbCr,
/// whatever the tag says. Only `dx` of component 1 is inspected.
pub fn classify_color_space(image: &Image) -> ColorSpace {
    let components = &image.components;
    if components.len() <= 2 {
        return ColorSpace::Gray;
    }
    if image.color_space != ColorSpace::Sycc
        && components.len() == 3
        && components[0].dx == 1
        && components[0].dy == 1
        && components[1].dx != 1
    {
        return ColorSpace::Sycc;
    }
    image.color_space
}

/// Options controlling normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Output precision of every component.
    pub target_precision: u32,
    /// How samples are brought to `target_precision`.
    pub precision_mode: PrecisionMode,
    /// Replicate samples of components that remain subsampled after color conversion.
    pub upsample: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            target_precision: CANONICAL_PRECISION,
            precision_mode: PrecisionMode::Scale,
            upsample: true,
        }
    }
}

/// Runs the normalization pipeline with a fixed set of options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    /// Normalizes `image` to sRGB at the configured precision.
    ///
    /// The image is consumed. On failure nothing is returned and the
    /// partially converted image is dropped.
    pub fn normalize(&self, image: Image) -> Result<Image, NormalizeError> {
        self.run(image).inspect_err(|e| error!(error = %e, "normalization failed"))
    }

    fn run(&self, mut image: Image) -> Result<Image, NormalizeError> {
        let declared = image.color_space;
        image.color_space = classify_color_space(&image);
        if image.color_space != declared {
            debug!(from = ?declared, to = ?image.color_space, "reclassified color space");
        }

        if let Some(convert) = image.color_space.conversion() {
            match convert(&mut image) {
                Ok(()) => {}
                Err(e @ NormalizeError::UnsupportedLayout) => {
                    warn!(color_space = ?image.color_space, error = %e, "cannot convert, leaving samples as-is");
                }
                Err(e) => return Err(e),
            }
        }

        let target = self.options.target_precision;
        for component in &mut image.components {
            self.options.precision_mode.apply(component, target)?;
            level_shift_to_unsigned(component)?;
        }

        if self.options.upsample {
            image = upsample_components(image)?;
        }

        let image = match image.color_space {
            ColorSpace::Srgb => image,
            ColorSpace::Gray => expand_grayscale_to_rgb(image)?,
            other => return Err(NormalizeError::UnsupportedColorSpace(other)),
        };

        check_output(&image, target)?;
        Ok(image)
    }
}

/// Normalizes `image` to canonical 8-bit, full-resolution, unsigned RGB.
pub fn normalize_to_rgb8(image: Image) -> Result<Image, NormalizeError> {
    Normalizer::default().normalize(image)
}

fn check_output(image: &Image, precision: u32) -> Result<(), NormalizeError> {
    let Some(first) = image.components.first() else {
        return Err(NormalizeError::UnsupportedLayout);
    };
    let consistent = image.components.len() >= 3
        && image.components.iter().all(|c| {
            c.width == first.width
                && c.height == first.height
                && c.dx == 1
                && c.dy == 1
                && c.precision == precision
                && !c.is_signed
                && c.data.len() == c.sample_count()
        });
    if consistent {
        Ok(())
    } else {
        Err(NormalizeError::UnsupportedLayout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg2000::image::Component;
    use pretty_assertions::assert_eq;

    fn three(dx1: u32, color_space: ColorSpace) -> Image {
        Image::new(
            vec![
                Component::new(2, 2, 8, vec![0; 4]),
                Component::new(1, 2, 8, vec![0; 2]).with_subsampling(dx1, 1),
                Component::new(1, 2, 8, vec![0; 2]).with_subsampling(dx1, 1),
            ],
            color_space,
        )
    }

    #[test]
    fn test_classify_few_components_as_gray() {
        let one = Image::new(vec![Component::new(1, 1, 8, vec![0])], ColorSpace::Srgb);
        assert_eq!(classify_color_space(&one), ColorSpace::Gray);
        let two = Image::new(
            vec![Component::new(1, 1, 8, vec![0]), Component::new(1, 1, 8, vec![0])],
            ColorSpace::Sycc,
        );
        assert_eq!(classify_color_space(&two), ColorSpace::Gray);
    }

    #[test]
    fn test_classify_subsampled_layout_as_sycc() {
        assert_eq!(classify_color_space(&three(2, ColorSpace::Unknown)), ColorSpace::Sycc);
        assert_eq!(classify_color_space(&three(2, ColorSpace::Srgb)), ColorSpace::Sycc);
        assert_eq!(classify_color_space(&three(1, ColorSpace::Unknown)), ColorSpace::Unknown);
        assert_eq!(classify_color_space(&three(1, ColorSpace::Srgb)), ColorSpace::Srgb);
    }

    #[test]
    fn test_classify_ignores_vertical_and_third_component() {
        let mut image = three(2, ColorSpace::Unknown);
        image.components[1].dy = 7;
        image.components[2].dx = 1;
        assert_eq!(classify_color_space(&image), ColorSpace::Sycc);
    }

    #[test]
    fn test_classify_requires_exactly_three_components() {
        let mut image = three(2, ColorSpace::Cmyk);
        image.components.push(Component::new(2, 2, 8, vec![0; 4]));
        assert_eq!(classify_color_space(&image), ColorSpace::Cmyk);
    }

    #[test]
    fn test_dispatch_table() {
        assert!(ColorSpace::Sycc.conversion().is_some());
        assert!(ColorSpace::Cmyk.conversion().is_some());
        assert!(ColorSpace::Eycc.conversion().is_some());
        assert!(ColorSpace::Srgb.conversion().is_none());
        assert!(ColorSpace::Gray.conversion().is_none());
        assert!(ColorSpace::Unknown.conversion().is_none());
    }

    #[test]
    fn test_unknown_three_component_image_fails() {
        let image = three(1, ColorSpace::Unknown);
        assert_eq!(
            normalize_to_rgb8(image),
            Err(NormalizeError::UnsupportedColorSpace(ColorSpace::Unknown))
        );
    }

    #[test]
    fn test_unconvertible_cmyk_fails_as_unsupported_color_space() {
        let image = Image::new(
            vec![
                Component::new(1, 1, 8, vec![0]),
                Component::new(1, 1, 8, vec![0]),
                Component::new(1, 1, 8, vec![0]),
            ],
            ColorSpace::Cmyk,
        );
        assert_eq!(
            normalize_to_rgb8(image),
            Err(NormalizeError::UnsupportedColorSpace(ColorSpace::Cmyk))
        );
    }

    #[test]
    fn test_clip_mode_option() {
        let image = Image::new(
            vec![
                Component::new(1, 1, 12, vec![300]),
                Component::new(1, 1, 12, vec![100]),
                Component::new(1, 1, 12, vec![4095]),
            ],
            ColorSpace::Srgb,
        );
        let normalizer = Normalizer::new(NormalizeOptions {
            precision_mode: PrecisionMode::Clip,
            ..Default::default()
        });
        let out = normalizer.normalize(image).unwrap();
        assert_eq!(out.components[0].data, vec![255]);
        assert_eq!(out.components[1].data, vec![100]);
        assert_eq!(out.components[2].data, vec![255]);
    }

    #[test]
    fn test_subsampled_extra_component_without_upsampling_fails() {
        let image = Image::new(
            vec![
                Component::new(2, 2, 8, vec![0; 4]),
                Component::new(2, 2, 8, vec![0; 4]),
                Component::new(2, 2, 8, vec![0; 4]),
                Component::new(1, 1, 8, vec![255]).with_subsampling(2, 2).alpha(),
            ],
            ColorSpace::Srgb,
        );
        let normalizer = Normalizer::new(NormalizeOptions {
            upsample: false,
            ..Default::default()
        });
        assert_eq!(
            normalizer.normalize(image.clone()),
            Err(NormalizeError::UnsupportedLayout)
        );
        let out = normalize_to_rgb8(image).unwrap();
        assert_eq!(out.components[3].data, vec![255; 4]);
    }
}
