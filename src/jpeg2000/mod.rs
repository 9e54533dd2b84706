//! JPEG 2000 decoded-image normalization (ISO/IEC 15444-1 Annex I color spaces)
//!
//! Turns the component planes a JPEG 2000 decoder produces into canonical
//! 8-bit, full-resolution RGB. The work is split across several sub-modules:
//!
//! - `image`: Data structures representing the Image and its Components.
//! - `normalize`: Color space classification and the normalization pipeline.
//! - `sycc` / `convert`: YCbCr (4:4:4, 4:2:2, 4:2:0), e-sYCC and CMYK to RGB.
//! - `precision`: Bit-depth rescaling, clipping and level shifting.
//! - `upsample` / `gray`: Grid and channel-count expansion.
//! - `jp2`: JP2 header boxes (`ihdr`, `colr`).
//! - `pgx` / `pixels`: Component input and interleaved pixel output.

pub mod convert;
pub mod gray;
pub mod image;
pub mod jp2;
pub mod normalize;
pub mod pgx;
pub mod pixels;
pub mod precision;
pub mod sycc;
pub mod upsample;
