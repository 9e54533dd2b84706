pub const MINIMUM_PRECISION: u32 = 1;
pub const MAXIMUM_PRECISION: u32 = 32;

// Color conversions bias samples by 2^(prec-1) in i32 arithmetic.
pub const MAXIMUM_CONVERSION_PRECISION: u32 = 31;

// Canonical output depth for normalized images.
pub const CANONICAL_PRECISION: u32 = 8;

// JP2 signature box (ISO/IEC 15444-1, I.5.1): 00 00 00 0C 6A 50 20 20 0D 0A 87 0A
pub const JP2_SIGNATURE: &[u8; 12] = b"\x00\x00\x00\x0CjP  \r\n\x87\n";

pub const JP2_HEADER_BOX: [u8; 4] = *b"jp2h";
pub const IMAGE_HEADER_BOX: [u8; 4] = *b"ihdr";
pub const COLOUR_SPECIFICATION_BOX: [u8; 4] = *b"colr";
pub const CONTIGUOUS_CODESTREAM_BOX: [u8; 4] = *b"jp2c";

// Colour specification methods (ISO/IEC 15444-1, table I.9).
pub const COLOUR_METHOD_ENUMERATED: u8 = 1;
pub const COLOUR_METHOD_RESTRICTED_ICC: u8 = 2;

// Size in bytes of the ihdr box payload.
pub const IMAGE_HEADER_SIZE_IN_BYTES: usize = 14;
