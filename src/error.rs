use thiserror::Error;

use crate::jpeg2000::image::ColorSpace;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Not enough memory")]
    AllocationFailure,
    #[error("Unsupported component layout")]
    UnsupportedLayout,
    #[error("Color space {0:?} cannot be converted to sRGB")]
    UnsupportedColorSpace(ColorSpace),
    #[error("Invalid sample precision: {0} bits")]
    InvalidPrecision(u32),
    #[error("Component data does not match its dimensions")]
    InvalidComponentData,
    #[error("Invalid data")]
    InvalidData,
}
