//! RIFF chunk reader.
//!
//! A WebP file is `RIFF <u32 size> WEBP` followed by chunks of
//! `<fourcc> <u32 size> <payload> [pad byte if size is odd]`.

use core::fmt;

pub(crate) const RIFF_HEADER_SIZE: usize = 12;
pub(crate) const CHUNK_HEADER_SIZE: usize = 8;

/// Printable form of a fourcc for error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FourCc(pub [u8; 4]);

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '?'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ChunkError {
    #[error("truncated chunk header at offset {offset}")]
    TruncatedHeader { offset: usize },

    #[error("chunk '{fourcc}' declares {size} bytes but only {available} remain")]
    PayloadOverrun {
        fourcc: FourCc,
        size: u32,
        available: usize,
    },
}

/// Location of one chunk inside the buffer it was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Chunk {
    pub fourcc: [u8; 4],
    /// Offset of the chunk header.
    pub offset: usize,
    /// Offset of the first payload byte.
    pub start: usize,
    pub len: usize,
}

impl Chunk {
    pub fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.start..self.start + self.len]
    }
}

/// Iterator over consecutive chunks in `data[pos..end]`.
///
/// Stops after the first error.
pub(crate) struct Chunks<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
    done: bool,
}

impl<'a> Chunks<'a> {
    pub fn new(data: &'a [u8], start: usize, end: usize) -> Self {
        let end = end.min(data.len());
        Self {
            data,
            pos: start.min(end),
            end,
            done: false,
        }
    }
}

impl Iterator for Chunks<'_> {
    type Item = Result<Chunk, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.end {
            return None;
        }
        let offset = self.pos;
        if self.end - offset < CHUNK_HEADER_SIZE {
            self.done = true;
            return Some(Err(ChunkError::TruncatedHeader { offset }));
        }
        let header = &self.data[offset..offset + CHUNK_HEADER_SIZE];
        let fourcc = [header[0], header[1], header[2], header[3]];
        let size = le_u32(&header[4..8]);
        let start = offset + CHUNK_HEADER_SIZE;
        let available = self.end - start;
        if size as usize > available {
            self.done = true;
            return Some(Err(ChunkError::PayloadOverrun {
                fourcc: FourCc(fourcc),
                size,
                available,
            }));
        }
        let len = size as usize;
        // A missing pad byte at the very end is tolerated.
        self.pos = (start + len + (len & 1)).min(self.end);
        Some(Ok(Chunk {
            fourcc,
            offset,
            start,
            len,
        }))
    }
}

/// Validate the 12-byte RIFF/WEBP header.
///
/// Returns the end of the RIFF payload, clamped to `data.len()`. Bytes past
/// the declared RIFF size are ignored.
pub(crate) fn parse_riff_header(data: &[u8]) -> Result<usize, String> {
    if data.len() < RIFF_HEADER_SIZE {
        return Err(format!(
            "need at least {RIFF_HEADER_SIZE} bytes, got {}",
            data.len()
        ));
    }
    if &data[0..4] != b"RIFF" {
        return Err("missing RIFF signature".into());
    }
    if &data[8..12] != b"WEBP" {
        return Err("RIFF form type is not WEBP".into());
    }
    let riff_size = le_u32(&data[4..8]) as usize;
    if riff_size < 4 + CHUNK_HEADER_SIZE {
        return Err(format!("RIFF size {riff_size} is too small"));
    }
    if riff_size & 1 != 0 {
        return Err(format!("RIFF size {riff_size} is odd"));
    }
    Ok(riff_size.saturating_add(CHUNK_HEADER_SIZE).min(data.len()))
}

pub(crate) fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

pub(crate) fn le_u24(b: &[u8]) -> u32 {
    u32::from(b[0]) | (u32::from(b[1]) << 8) | (u32::from(b[2]) << 16)
}

/// Append a chunk (header, payload, pad byte) to `out`.
pub(crate) fn write_chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() & 1 != 0 {
        out.push(0);
    }
}

/// Prefix `body` (a sequence of chunks) with a RIFF/WEBP header.
pub(crate) fn wrap_riff(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(RIFF_HEADER_SIZE + body.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
    out.extend_from_slice(b"WEBP");
    out.extend_from_slice(body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_with_padding() {
        let mut body = Vec::new();
        write_chunk(&mut body, b"ABCD", &[1, 2, 3]);
        write_chunk(&mut body, b"EFGH", &[4, 5]);
        assert_eq!(body.len(), 8 + 4 + 8 + 2);

        let chunks: Vec<_> = Chunks::new(&body, 0, body.len())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(&chunks[0].fourcc, b"ABCD");
        assert_eq!(chunks[0].payload(&body), &[1, 2, 3]);
        assert_eq!(&chunks[1].fourcc, b"EFGH");
        assert_eq!(chunks[1].offset, 12);
        assert_eq!(chunks[1].payload(&body), &[4, 5]);
    }

    #[test]
    fn missing_final_pad_byte_is_tolerated() {
        let mut body = Vec::new();
        write_chunk(&mut body, b"ABCD", &[1, 2, 3]);
        body.pop();
        let chunks: Vec<_> = Chunks::new(&body, 0, body.len())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn overrun_is_reported_once() {
        let mut body = Vec::new();
        write_chunk(&mut body, b"ABCD", &[0; 10]);
        body.truncate(12);
        let results: Vec<_> = Chunks::new(&body, 0, body.len()).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(ChunkError::PayloadOverrun {
                size: 10,
                available: 4,
                ..
            })
        ));
    }

    #[test]
    fn truncated_header() {
        let body = b"ABCD\x01";
        let results: Vec<_> = Chunks::new(body, 0, body.len()).collect();
        assert!(matches!(
            results[..],
            [Err(ChunkError::TruncatedHeader { offset: 0 })]
        ));
    }

    #[test]
    fn riff_header_validation() {
        let mut body = Vec::new();
        write_chunk(&mut body, b"VP8L", &[0; 6]);
        let file = wrap_riff(&body);
        assert_eq!(parse_riff_header(&file).unwrap(), file.len());

        // Trailing junk past the RIFF size is outside the window.
        let mut padded = file.clone();
        padded.extend_from_slice(&[0xAA; 7]);
        assert_eq!(parse_riff_header(&padded).unwrap(), file.len());

        assert!(parse_riff_header(&file[..4]).is_err());
        let mut bad = file.clone();
        bad[8..12].copy_from_slice(b"AVI ");
        assert!(parse_riff_header(&bad).is_err());
        let mut odd = file;
        odd[4] |= 1;
        assert!(parse_riff_header(&odd).is_err());
    }

    #[test]
    fn fourcc_display() {
        assert_eq!(FourCc(*b"VP8 ").to_string(), "VP8 ");
        assert_eq!(FourCc([0, b'A', 0xFF, b'B']).to_string(), "?A?B");
    }
}
