//! Animation demultiplexer.
//!
//! Layout of an animated file:
//!
//! ```text
//! RIFF WEBP
//!   VP8X   flags (animation bit set), canvas size
//!   ANIM   background color (B, G, R, A), loop count
//!   ANMF   x/2, y/2, width-1, height-1, duration, flags, then [ALPH] VP8 |VP8L
//!   ANMF   ...
//! ```
//!
//! The frame table stores byte ranges into the parsed buffer, so the
//! demuxer can live next to the buffer it describes.

use core::ops::Range;

use super::probe::{BitstreamHeader, VP8X_ANIMATION_FLAG, bitstream_header};
use super::riff::{Chunk, Chunks, FourCc, RIFF_HEADER_SIZE, le_u24, parse_riff_header};
use crate::error::LoadError;
use crate::info::BitstreamFormat;
use crate::limits::Limits;

const ANMF_HEADER_SIZE: usize = 16;

#[derive(Clone, Debug)]
struct FrameEntry {
    x_offset: u32,
    y_offset: u32,
    width: u32,
    height: u32,
    has_alpha: bool,
    format: BitstreamFormat,
    /// `[ALPH] VP8 ` or `VP8L` chunks of this frame.
    fragment: Range<usize>,
}

/// One frame of an animation, borrowed from the encoded buffer.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Frame<'a> {
    /// 1-based frame number.
    pub number: u32,
    pub x_offset: u32,
    pub y_offset: u32,
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub format: BitstreamFormat,
    pub fragment: &'a [u8],
}

/// Frame table of an animated WebP file.
#[derive(Clone, Debug)]
pub(crate) struct Demuxer {
    canvas_width: u32,
    canvas_height: u32,
    background_color: [u8; 4],
    loop_count: u16,
    frames: Vec<FrameEntry>,
}

fn demux_err(msg: impl Into<String>) -> LoadError {
    LoadError::DemuxInit(msg.into())
}

impl Demuxer {
    /// Parse the frame table of an animated file.
    ///
    /// Fails with [`LoadError::DemuxInit`] if the container is not an
    /// animation or any frame is malformed.
    pub fn new(data: &[u8]) -> Result<Self, LoadError> {
        Self::with_limits(data, &Limits::default())
    }

    /// Like [`Self::new`], but fails with [`LoadError::LimitExceeded`] as
    /// soon as the frame count passes `limits.max_frames`, before the
    /// remaining frames are parsed.
    pub fn with_limits(data: &[u8], limits: &Limits) -> Result<Self, LoadError> {
        let end = parse_riff_header(data).map_err(demux_err)?;
        let mut chunks = Chunks::new(data, RIFF_HEADER_SIZE, end);

        let vp8x = match chunks.next() {
            Some(Ok(chunk)) if &chunk.fourcc == b"VP8X" => chunk,
            Some(Ok(chunk)) => {
                return Err(demux_err(format!(
                    "expected VP8X, found '{}'",
                    FourCc(chunk.fourcc)
                )));
            }
            Some(Err(e)) => return Err(demux_err(e.to_string())),
            None => return Err(demux_err("empty container")),
        };
        let vp8x = vp8x.payload(data);
        if vp8x.len() < 10 {
            return Err(demux_err("VP8X chunk too short"));
        }
        if vp8x[0] & VP8X_ANIMATION_FLAG == 0 {
            return Err(demux_err("VP8X does not flag an animation"));
        }
        let canvas_width = le_u24(&vp8x[4..7]) + 1;
        let canvas_height = le_u24(&vp8x[7..10]) + 1;

        let mut anim = None;
        let mut frames = Vec::new();
        for chunk in chunks {
            let chunk = chunk.map_err(|e| demux_err(e.to_string()))?;
            match &chunk.fourcc {
                b"ANIM" => {
                    let payload = chunk.payload(data);
                    if payload.len() < 6 {
                        return Err(demux_err("ANIM chunk too short"));
                    }
                    anim = Some((
                        [payload[0], payload[1], payload[2], payload[3]],
                        u16::from_le_bytes([payload[4], payload[5]]),
                    ));
                }
                b"ANMF" => {
                    if anim.is_none() {
                        return Err(demux_err("ANMF chunk before ANIM"));
                    }
                    let number = frames.len() + 1;
                    limits.check_frames(u32::try_from(number).unwrap_or(u32::MAX))?;
                    let entry = parse_frame(data, &chunk, canvas_width, canvas_height)
                        .map_err(|msg| demux_err(format!("frame {number}: {msg}")))?;
                    frames.push(entry);
                }
                b"VP8 " | b"VP8L" | b"ALPH" => {
                    return Err(demux_err(format!(
                        "'{}' chunk outside of a frame",
                        FourCc(chunk.fourcc)
                    )));
                }
                _ => {}
            }
        }

        let Some((background_color, loop_count)) = anim else {
            return Err(demux_err("missing ANIM chunk"));
        };
        if frames.is_empty() {
            return Err(demux_err("animation has no frames"));
        }
        if u32::try_from(frames.len()).is_err() {
            return Err(demux_err("too many frames"));
        }

        log::debug!(
            "demuxed {} frame(s) on a {canvas_width}x{canvas_height} canvas",
            frames.len()
        );
        Ok(Self {
            canvas_width,
            canvas_height,
            background_color,
            loop_count,
            frames,
        })
    }

    pub fn frame_count(&self) -> u32 {
        self.frames.len() as u32
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    /// Background color hint, in the stored B, G, R, A byte order.
    pub fn background_color(&self) -> [u8; 4] {
        self.background_color
    }

    /// Loop count; 0 means infinite.
    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }

    /// Look up frame `number` (1-based) in `data`, the buffer this demuxer
    /// was built from. Returns `None` when out of range.
    pub fn frame<'a>(&self, data: &'a [u8], number: u32) -> Option<Frame<'a>> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        let entry = self.frames.get(index)?;
        Some(Frame {
            number,
            x_offset: entry.x_offset,
            y_offset: entry.y_offset,
            width: entry.width,
            height: entry.height,
            has_alpha: entry.has_alpha,
            format: entry.format,
            fragment: data.get(entry.fragment.clone())?,
        })
    }
}

fn parse_frame(
    data: &[u8],
    anmf: &Chunk,
    canvas_width: u32,
    canvas_height: u32,
) -> Result<FrameEntry, String> {
    let payload = anmf.payload(data);
    if payload.len() < ANMF_HEADER_SIZE {
        return Err(format!("ANMF header needs {ANMF_HEADER_SIZE} bytes"));
    }
    let x_offset = le_u24(&payload[0..3]) * 2;
    let y_offset = le_u24(&payload[3..6]) * 2;
    let width = le_u24(&payload[6..9]) + 1;
    let height = le_u24(&payload[9..12]) + 1;

    if u64::from(x_offset) + u64::from(width) > u64::from(canvas_width)
        || u64::from(y_offset) + u64::from(height) > u64::from(canvas_height)
    {
        return Err(format!(
            "{width}x{height} at ({x_offset}, {y_offset}) exceeds the \
             {canvas_width}x{canvas_height} canvas"
        ));
    }

    let mut alpha: Option<Chunk> = None;
    let mut image: Option<(Chunk, BitstreamHeader)> = None;
    let sub_start = anmf.start + ANMF_HEADER_SIZE;
    for sub in Chunks::new(data, sub_start, anmf.start + anmf.len) {
        let sub = sub.map_err(|e| e.to_string())?;
        match &sub.fourcc {
            b"ALPH" if image.is_none() && alpha.is_none() => alpha = Some(sub),
            b"VP8 " | b"VP8L" => {
                if image.is_some() {
                    return Err("more than one image chunk".into());
                }
                let header = bitstream_header(&sub.fourcc, sub.payload(data))?;
                image = Some((sub, header));
            }
            _ => {}
        }
    }
    let Some((image, header)) = image else {
        return Err("no image data".into());
    };
    if header.width != width || header.height != height {
        return Err(format!(
            "bitstream is {}x{} but the frame header says {width}x{height}",
            header.width, header.height
        ));
    }

    // ALPH only applies to lossy frames.
    let alpha = alpha.filter(|_| header.format == BitstreamFormat::Lossy);
    let fragment_start = alpha.map_or(image.offset, |a| a.offset);
    Ok(FrameEntry {
        x_offset,
        y_offset,
        width,
        height,
        has_alpha: header.has_alpha || alpha.is_some(),
        format: header.format,
        fragment: fragment_start..image.start + image.len,
    })
}
