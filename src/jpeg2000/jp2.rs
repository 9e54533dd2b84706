//! JP2 Box structure reader (ISO/IEC 15444-1 Annex I).
//!
//! Only the header boxes needed to interpret decoded samples are read:
//! the image header (`ihdr`) and the colour specification (`colr`).

use num_enum::TryFromPrimitive;
use tracing::debug;

use super::image::ColorSpace;
use crate::constants::{
    COLOUR_METHOD_ENUMERATED, COLOUR_METHOD_RESTRICTED_ICC, COLOUR_SPECIFICATION_BOX,
    CONTIGUOUS_CODESTREAM_BOX, IMAGE_HEADER_BOX, IMAGE_HEADER_SIZE_IN_BYTES, JP2_HEADER_BOX,
    JP2_SIGNATURE,
};
use crate::error::NormalizeError;

pub struct Jp2Box {
    pub length: u64,
    pub box_type: [u8; 4],
    pub data_range: std::ops::Range<usize>,
}

/// Enumerated colour spaces of the `colr` box (EnumCS, table I.10 and Part 2 extensions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum EnumeratedColourSpace {
    Cmyk = 12,
    Srgb = 16,
    Greyscale = 17,
    Sycc = 18,
    Esycc = 24,
}

impl From<EnumeratedColourSpace> for ColorSpace {
    fn from(cs: EnumeratedColourSpace) -> Self {
        match cs {
            EnumeratedColourSpace::Cmyk => ColorSpace::Cmyk,
            EnumeratedColourSpace::Srgb => ColorSpace::Srgb,
            EnumeratedColourSpace::Greyscale => ColorSpace::Gray,
            EnumeratedColourSpace::Sycc => ColorSpace::Sycc,
            EnumeratedColourSpace::Esycc => ColorSpace::Eycc,
        }
    }
}

/// Contents of the `ihdr` box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub height: u32,
    pub width: u32,
    pub component_count: u16,
    /// Bit depth, or `None` when components differ (BPC value 255).
    pub bits_per_component: Option<u8>,
    pub is_signed: bool,
}

/// Contents of the first `colr` box.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColourSpecification {
    pub method: u8,
    /// Raw EnumCS value for method 1.
    pub enumerated: Option<u32>,
    /// Restricted ICC profile for method 2.
    pub icc_profile: Option<Vec<u8>>,
}

impl ColourSpecification {
    /// Color space declared by the box; unrecognized or ICC-only
    /// specifications map to `Unknown`.
    pub fn color_space(&self) -> ColorSpace {
        self.enumerated
            .and_then(|value| EnumeratedColourSpace::try_from(value).ok())
            .map(ColorSpace::from)
            .unwrap_or(ColorSpace::Unknown)
    }
}

/// Header information gathered from a JP2 file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Jp2Header {
    pub image_header: Option<ImageHeader>,
    pub colour: Option<ColourSpecification>,
    pub has_codestream: bool,
}

pub struct Jp2Reader<'a> {
    data: &'a [u8],
    position: usize,
    end: usize,
}

impl<'a> Jp2Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            end: data.len(),
        }
    }

    pub fn is_jp2(data: &[u8]) -> bool {
        data.len() >= JP2_SIGNATURE.len() && &data[..JP2_SIGNATURE.len()] == JP2_SIGNATURE
    }

    /// Reads the header boxes. Returns `None` when the data is not a JP2 container.
    pub fn read_header(&mut self) -> Result<Option<Jp2Header>, NormalizeError> {
        self.position = 0;
        self.end = self.data.len();
        if !Self::is_jp2(self.data) {
            return Ok(None);
        }

        let mut header = Jp2Header::default();
        while let Some(b) = self.read_box()? {
            match b.box_type {
                JP2_HEADER_BOX => {
                    let mut sub_reader = Jp2Reader {
                        data: self.data,
                        position: b.data_range.start,
                        end: b.data_range.end,
                    };
                    sub_reader.read_header_boxes(&mut header)?;
                }
                CONTIGUOUS_CODESTREAM_BOX => header.has_codestream = true,
                _ => {}
            }
        }
        debug!(?header, "read JP2 header");
        Ok(Some(header))
    }

    fn read_header_boxes(&mut self, header: &mut Jp2Header) -> Result<(), NormalizeError> {
        while let Some(b) = self.read_box()? {
            let box_data = &self.data[b.data_range.clone()];
            match b.box_type {
                IMAGE_HEADER_BOX => header.image_header = Some(parse_image_header(box_data)?),
                COLOUR_SPECIFICATION_BOX if header.colour.is_none() => {
                    header.colour = Some(parse_colour_specification(box_data)?);
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn read_box(&mut self) -> Result<Option<Jp2Box>, NormalizeError> {
        if self.position + 8 > self.end {
            return Ok(None);
        }

        let start_pos = self.position;
        let mut length = u32::from_be_bytes([
            self.data[self.position],
            self.data[self.position + 1],
            self.data[self.position + 2],
            self.data[self.position + 3],
        ]) as u64;

        let box_type = [
            self.data[self.position + 4],
            self.data[self.position + 5],
            self.data[self.position + 6],
            self.data[self.position + 7],
        ];

        self.position += 8;
        let mut header_size = 8;

        if length == 1 {
            if self.position + 8 > self.end {
                return Err(NormalizeError::InvalidData);
            }
            let mut extended = [0u8; 8];
            extended.copy_from_slice(&self.data[self.position..self.position + 8]);
            length = u64::from_be_bytes(extended);
            self.position += 8;
            header_size += 8;
        } else if length == 0 {
            length = (self.end - start_pos) as u64;
        }

        if length < header_size as u64 {
            return Err(NormalizeError::InvalidData);
        }
        let data_start = start_pos + header_size;
        let data_end = usize::try_from(length)
            .ok()
            .and_then(|len| start_pos.checked_add(len))
            .ok_or(NormalizeError::InvalidData)?;

        if data_end > self.end {
            return Err(NormalizeError::InvalidData);
        }

        self.position = data_end;

        Ok(Some(Jp2Box {
            length,
            box_type,
            data_range: data_start..data_end,
        }))
    }
}

fn parse_image_header(data: &[u8]) -> Result<ImageHeader, NormalizeError> {
    if data.len() < IMAGE_HEADER_SIZE_IN_BYTES {
        return Err(NormalizeError::InvalidData);
    }
    let bpc = data[10];
    Ok(ImageHeader {
        height: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
        width: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
        component_count: u16::from_be_bytes([data[8], data[9]]),
        bits_per_component: (bpc != 0xFF).then_some((bpc & 0x7F) + 1),
        is_signed: bpc != 0xFF && bpc & 0x80 != 0,
    })
}

fn parse_colour_specification(data: &[u8]) -> Result<ColourSpecification, NormalizeError> {
    // METH, PREC, APPROX
    if data.len() < 3 {
        return Err(NormalizeError::InvalidData);
    }
    let method = data[0];
    let payload = &data[3..];
    let mut spec = ColourSpecification {
        method,
        ..Default::default()
    };
    match method {
        COLOUR_METHOD_ENUMERATED => {
            if payload.len() < 4 {
                return Err(NormalizeError::InvalidData);
            }
            spec.enumerated = Some(u32::from_be_bytes([
                payload[0], payload[1], payload[2], payload[3],
            ]));
        }
        COLOUR_METHOD_RESTRICTED_ICC if !payload.is_empty() => {
            spec.icc_profile = Some(payload.to_vec());
        }
        _ => {}
    }
    Ok(spec)
}
