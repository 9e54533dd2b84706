pub mod constants;
pub mod error;
pub mod jpeg2000;

pub use error::NormalizeError;
pub use jpeg2000::gray::expand_grayscale_to_rgb;
pub use jpeg2000::image::{ColorSpace, Component, Image};
pub use jpeg2000::jp2::{ColourSpecification, ImageHeader, Jp2Header, Jp2Reader};
pub use jpeg2000::normalize::{
    NormalizeOptions, Normalizer, classify_color_space, normalize_to_rgb8,
};
pub use jpeg2000::pgx::read_pgx;
pub use jpeg2000::pixels::{PixelLayout, interleave_rgb8, pack_rgba32};
pub use jpeg2000::precision::{PrecisionMode, rescale_component_precision};
