//! Feature probe: dimensions and capability flags without decoding pixels.
//!
//! Three layouts are possible for the first chunk after the RIFF header:
//! - `VP8 ` (lossy): frame tag, keyframe signature `9D 01 2A`, 14-bit dimensions
//! - `VP8L` (lossless): signature `0x2F`, dimensions bit-packed in the next 4 bytes
//! - `VP8X` (extended): flags byte, 24-bit `canvas - 1` dimensions; the
//!   image itself is a later chunk, or a sequence of `ANMF` frames

use super::riff::{
    CHUNK_HEADER_SIZE, FourCc, RIFF_HEADER_SIZE, le_u24, le_u32, parse_riff_header,
};
use crate::error::LoadError;
use crate::info::BitstreamFormat;

pub(crate) const VP8X_ALPHA_FLAG: u8 = 0x10;
pub(crate) const VP8X_ANIMATION_FLAG: u8 = 0x02;
const VP8X_PAYLOAD_SIZE: usize = 10;

const VP8_SIGNATURE: [u8; 3] = [0x9D, 0x01, 0x2A];
const VP8L_SIGNATURE: u8 = 0x2F;

/// Result of a successful probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Features {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub has_animation: bool,
    pub format: BitstreamFormat,
}

/// Dimensions and alpha hint read from a `VP8 ` or `VP8L` bitstream header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BitstreamHeader {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub format: BitstreamFormat,
}

/// Parse the header of a lossy `VP8 ` payload.
pub(crate) fn vp8_header(payload: &[u8]) -> Result<BitstreamHeader, String> {
    if payload.len() < 10 {
        return Err(format!("VP8 header needs 10 bytes, got {}", payload.len()));
    }
    let tag = le_u24(&payload[0..3]);
    if tag & 1 != 0 {
        return Err("VP8 frame is not a keyframe".into());
    }
    if (tag >> 1) & 7 > 3 {
        return Err(format!("unknown VP8 profile {}", (tag >> 1) & 7));
    }
    if (tag >> 4) & 1 == 0 {
        return Err("VP8 frame is not shown".into());
    }
    if payload[3..6] != VP8_SIGNATURE {
        return Err("bad VP8 keyframe signature".into());
    }
    let width = u32::from(u16::from_le_bytes([payload[6], payload[7]]) & 0x3FFF);
    let height = u32::from(u16::from_le_bytes([payload[8], payload[9]]) & 0x3FFF);
    if width == 0 || height == 0 {
        return Err(format!("VP8 dimensions {width}x{height} are empty"));
    }
    Ok(BitstreamHeader {
        width,
        height,
        has_alpha: false,
        format: BitstreamFormat::Lossy,
    })
}

/// Parse the header of a lossless `VP8L` payload.
pub(crate) fn vp8l_header(payload: &[u8]) -> Result<BitstreamHeader, String> {
    if payload.len() < 5 {
        return Err(format!("VP8L header needs 5 bytes, got {}", payload.len()));
    }
    if payload[0] != VP8L_SIGNATURE {
        return Err(format!("bad VP8L signature 0x{:02X}", payload[0]));
    }
    let bits = le_u32(&payload[1..5]);
    let width = (bits & 0x3FFF) + 1;
    let height = ((bits >> 14) & 0x3FFF) + 1;
    let has_alpha = (bits >> 28) & 1 != 0;
    let version = bits >> 29;
    if version != 0 {
        return Err(format!("unsupported VP8L version {version}"));
    }
    Ok(BitstreamHeader {
        width,
        height,
        has_alpha,
        format: BitstreamFormat::Lossless,
    })
}

/// Parse a `VP8 ` or `VP8L` header by fourcc.
pub(crate) fn bitstream_header(
    fourcc: &[u8; 4],
    payload: &[u8],
) -> Result<BitstreamHeader, String> {
    match fourcc {
        b"VP8 " => vp8_header(payload),
        b"VP8L" => vp8l_header(payload),
        other => Err(format!("'{}' is not an image chunk", FourCc(*other))),
    }
}

/// Chunk header at `offset`, with whatever part of its payload is present.
///
/// Unlike [`super::riff::Chunks`], a payload cut short by the end of the
/// buffer is returned truncated rather than rejected: the probe only needs
/// the first few bytes.
fn partial_chunk(data: &[u8], offset: usize, end: usize) -> Option<([u8; 4], usize, &[u8])> {
    if end.checked_sub(offset)? < CHUNK_HEADER_SIZE {
        return None;
    }
    let header = &data[offset..offset + CHUNK_HEADER_SIZE];
    let fourcc = [header[0], header[1], header[2], header[3]];
    let size = le_u32(&header[4..8]) as usize;
    let start = offset + CHUNK_HEADER_SIZE;
    let available = &data[start..start.saturating_add(size).min(end)];
    Some((fourcc, size, available))
}

/// Probe a RIFF/WEBP stream.
///
/// Fails with [`LoadError::InvalidHeader`] when width, height, or the
/// animation flag cannot be determined.
pub(crate) fn probe(data: &[u8]) -> Result<Features, LoadError> {
    let invalid = LoadError::InvalidHeader;
    let end = parse_riff_header(data).map_err(invalid)?;
    let (fourcc, size, payload) = partial_chunk(data, RIFF_HEADER_SIZE, end)
        .ok_or_else(|| invalid("missing first chunk".into()))?;

    match &fourcc {
        b"VP8 " | b"VP8L" => {
            let header = bitstream_header(&fourcc, payload).map_err(invalid)?;
            Ok(Features {
                width: header.width,
                height: header.height,
                has_alpha: header.has_alpha,
                has_animation: false,
                format: header.format,
            })
        }
        b"VP8X" => {
            if payload.len() < VP8X_PAYLOAD_SIZE {
                return Err(invalid(format!(
                    "VP8X chunk needs {VP8X_PAYLOAD_SIZE} bytes, got {}",
                    payload.len()
                )));
            }
            let flags = payload[0];
            let width = le_u24(&payload[4..7]) + 1;
            let height = le_u24(&payload[7..10]) + 1;
            if u64::from(width) * u64::from(height) >= 1 << 32 {
                return Err(invalid(format!("canvas {width}x{height} is too large")));
            }
            let has_alpha = flags & VP8X_ALPHA_FLAG != 0;
            if flags & VP8X_ANIMATION_FLAG != 0 {
                return Ok(Features {
                    width,
                    height,
                    has_alpha,
                    has_animation: true,
                    format: BitstreamFormat::Mixed,
                });
            }
            let first_end = (RIFF_HEADER_SIZE + CHUNK_HEADER_SIZE).saturating_add(size);
            let header = find_still_image(data, first_end, end)?;
            if header.width != width || header.height != height {
                return Err(invalid(format!(
                    "image {}x{} does not match canvas {width}x{height}",
                    header.width, header.height
                )));
            }
            Ok(Features {
                width,
                height,
                has_alpha: has_alpha || header.has_alpha,
                has_animation: false,
                format: header.format,
            })
        }
        other => Err(invalid(format!(
            "unexpected first chunk '{}'",
            FourCc(*other)
        ))),
    }
}

/// Walk the chunks after `VP8X` until the image chunk of a still image.
fn find_still_image(
    data: &[u8],
    mut offset: usize,
    end: usize,
) -> Result<BitstreamHeader, LoadError> {
    offset = offset.saturating_add(offset & 1);
    while let Some((fourcc, size, payload)) = partial_chunk(data, offset, end) {
        if matches!(&fourcc, b"VP8 " | b"VP8L") {
            return bitstream_header(&fourcc, payload).map_err(LoadError::InvalidHeader);
        }
        if payload.len() < size {
            break;
        }
        offset = offset.saturating_add(CHUNK_HEADER_SIZE + size + (size & 1));
    }
    Err(LoadError::InvalidHeader(
        "extended file has no image chunk".into(),
    ))
}
