//! PGX single-component raster reader.
//!
//! A PGX file is a one-line ASCII header followed by raw samples:
//! `PG <ML|LM> [+|-]<depth> <width> <height>\n`. `ML` stores samples
//! big-endian, `LM` little-endian. Samples occupy 1, 2 or 4 bytes depending
//! on the depth.

use tracing::debug;

use super::image::{Component, allocate_samples};
use crate::constants::{MAXIMUM_PRECISION, MINIMUM_PRECISION};
use crate::error::NormalizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PgxHeader {
    big_endian: bool,
    is_signed: bool,
    depth: u32,
    width: u32,
    height: u32,
}

impl PgxHeader {
    fn bytes_per_sample(&self) -> usize {
        match self.depth {
            0..=8 => 1,
            9..=16 => 2,
            _ => 4,
        }
    }
}

/// Decodes a PGX file into a full-resolution component.
pub fn read_pgx(data: &[u8]) -> Result<Component, NormalizeError> {
    let newline = data
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(NormalizeError::InvalidData)?;
    let header = parse_header(&data[..newline])?;
    let payload = &data[newline + 1..];

    let count = (header.width as usize)
        .checked_mul(header.height as usize)
        .ok_or(NormalizeError::InvalidData)?;
    let bytes_per_sample = header.bytes_per_sample();
    let needed = count
        .checked_mul(bytes_per_sample)
        .ok_or(NormalizeError::InvalidData)?;
    if payload.len() < needed {
        return Err(NormalizeError::InvalidData);
    }

    let mut samples = allocate_samples(count)?;
    for (sample, raw) in samples
        .iter_mut()
        .zip(payload[..needed].chunks_exact(bytes_per_sample))
    {
        *sample = decode_sample(raw, &header);
    }

    debug!(
        width = header.width,
        height = header.height,
        depth = header.depth,
        signed = header.is_signed,
        "read PGX component"
    );
    let component = Component::new(header.width, header.height, header.depth, samples);
    Ok(if header.is_signed {
        component.signed()
    } else {
        component
    })
}

fn parse_header(line: &[u8]) -> Result<PgxHeader, NormalizeError> {
    let line = std::str::from_utf8(line).map_err(|_| NormalizeError::InvalidData)?;
    let mut tokens = line.split_ascii_whitespace();
    if tokens.next() != Some("PG") {
        return Err(NormalizeError::InvalidData);
    }
    let big_endian = match tokens.next() {
        Some("ML") => true,
        Some("LM") => false,
        _ => return Err(NormalizeError::InvalidData),
    };

    // The sign may stand alone or be glued to the depth.
    let mut token = tokens.next().ok_or(NormalizeError::InvalidData)?;
    let mut is_signed = false;
    if let Some(sign) = token.chars().next().filter(|c| *c == '+' || *c == '-') {
        is_signed = sign == '-';
        token = &token[1..];
        if token.is_empty() {
            token = tokens.next().ok_or(NormalizeError::InvalidData)?;
        }
    }

    let depth = parse_number(Some(token))?;
    let width = parse_number(tokens.next())?;
    let height = parse_number(tokens.next())?;
    if !(MINIMUM_PRECISION..=MAXIMUM_PRECISION).contains(&depth) {
        return Err(NormalizeError::InvalidPrecision(depth));
    }

    Ok(PgxHeader {
        big_endian,
        is_signed,
        depth,
        width,
        height,
    })
}

fn parse_number(token: Option<&str>) -> Result<u32, NormalizeError> {
    token
        .and_then(|t| t.parse().ok())
        .ok_or(NormalizeError::InvalidData)
}

fn decode_sample(raw: &[u8], header: &PgxHeader) -> i32 {
    let mut value: u32 = 0;
    if header.big_endian {
        for &byte in raw {
            value = (value << 8) | byte as u32;
        }
    } else {
        for &byte in raw.iter().rev() {
            value = (value << 8) | byte as u32;
        }
    }
    if header.is_signed && header.depth < 32 {
        // Sign-extend from `depth` bits.
        let shift = 32 - header.depth;
        ((value << shift) as i32) >> shift
    } else {
        value as i32
    }
}
